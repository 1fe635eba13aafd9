// gRIBI Failover: Backup Next-Hop-Group Validation
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Open Traffic Generator API
//!
//! This is a very simple crate to interact with a traffic generator controller implementing the
//! Open Traffic Generator (OTG) REST API: push a configuration of ports, emulated devices and
//! flows, start and stop protocols and traffic, and read metrics and states.
//!
//! ```
//! use otg::{Config, OtgApi};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // connect to the controller
//!     let api = match OtgApi::new("localhost", 8443) {
//!         Ok(api) => api,
//!         Err(e) => {
//!             eprintln!("Cannot connect to the controller: {}", e);
//! # return Ok(());
//!             return Err(e.into());
//!         }
//!     };
//!
//!     // push an empty configuration
//!     let mut config = Config::new();
//!     config.add_port("atePort1", None);
//!     api.set_config(&config)?;
//!
//!     // start all protocols
//!     api.start_protocols()?;
//!     Ok(())
//! }
//! ```
#![deny(missing_docs)]

mod api;
mod monitor;
mod types;
pub use api::OtgApi;
pub use monitor::*;
pub use types::*;

use thiserror::Error;

/// # OTG Error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error during handling of the HTTP request
    #[allow(clippy::upper_case_acronyms)]
    #[error("HTTP Error: {0}")]
    HTTPError(#[from] isahc::Error),
    /// The HTTP request cannot be built
    #[error("Cannot build the HTTP request: {0}")]
    RequestError(#[from] isahc::http::Error),
    /// Cannot deserialize the response
    #[error("Cannot parse JSON response: {0}")]
    JsonError(#[from] serde_json::error::Error),
    /// IO Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// Error reported by the controller
    #[error("OTG Error {code} ({kind}): {}", .errors.join("; "))]
    OtgError {
        /// Error code
        code: i32,
        /// Kind of the error (e.g., `validation`)
        kind: String,
        /// Error messages
        errors: Vec<String>,
    },
    /// HTTP Response Error
    #[error("HTTP Response Error: {0}. Message:\n{1}")]
    ResponseError(u16, String),
}

/// OTG Result type
type Result<T> = core::result::Result<T, Error>;
