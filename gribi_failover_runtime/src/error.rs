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

//! Module containing all error types

use gribi_failover::gribi::GribiError;
use gribi_failover::netsim::DeviceError;
use gribi_failover::types::ParseError;
use gribi_failover::verify::VerifyError;
use thiserror::Error;

/// Main error type of the runtime
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the library
    #[error("{0}")]
    Failover(#[from] gribi_failover::Error),
    /// Error of the traffic generator controller
    #[error("OTG Error: {0}")]
    OtgError(#[from] otg::Error),
    /// The gRIBI session cannot be established
    #[error("gRIBI Connection can not be established: {0}")]
    ConnectionFailed(GribiError),
    /// No neighbor was resolved in time
    #[error("No IPv4 neighbor resolved on {ethernet} within {timeout_secs} seconds")]
    ArpTimeout {
        /// ethernet interface of the traffic generator
        ethernet: String,
        /// timeout in seconds
        timeout_secs: u64,
    },
    /// The logical port does not exist on the testbed
    #[error("Port {0} does not exist on the testbed")]
    UnknownPort(String),
    /// The traffic generator configuration cannot be applied
    #[error("Invalid traffic generator configuration: {0}")]
    InvalidAteConfig(String),
    /// IO Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// JSON Error
    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<GribiError> for Error {
    fn from(cause: GribiError) -> Self {
        Self::Failover(cause.into())
    }
}

impl From<VerifyError> for Error {
    fn from(cause: VerifyError) -> Self {
        Self::Failover(cause.into())
    }
}

impl From<DeviceError> for Error {
    fn from(cause: DeviceError) -> Self {
        Self::Failover(cause.into())
    }
}

impl From<ParseError> for Error {
    fn from(cause: ParseError) -> Self {
        Self::Failover(cause.into())
    }
}

impl Error {
    /// Returns the verification error, if this error was caused by a failed check.
    pub fn verify_error(&self) -> Option<&VerifyError> {
        match self {
            Self::Failover(gribi_failover::Error::VerifyError(e)) => Some(e),
            _ => None,
        }
    }
}
