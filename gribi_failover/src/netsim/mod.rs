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

//! # NetSim
//!
//! Simulation of a device under test with a gRIBI server, AFT telemetry and interfaces, wired to
//! a simulated traffic generator inside a [`Lab`].
//!
//! ## Example usage
//!
//! ```rust
//! use gribi_failover::netsim::Device;
//! use gribi_failover::config::ConfigModifier;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dut = Device::new("dut", 4);
//!     let iface = dut.port("port2")?.to_string();
//!     dut.apply(&ConfigModifier::set_enabled(iface.as_str(), false))?;
//!     assert!(!dut.interface(&iface)?.oper_up());
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod forwarding_state;
pub mod interface;
pub mod lab;
pub mod printer;
pub mod rib;

pub use device::{BackupReporting, Device};
pub use forwarding_state::ForwardingState;
pub use lab::Lab;
pub use rib::Rib;

use thiserror::Error;

/// Errors of the simulated devices
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The logical port is not known
    #[error("Port {0} does not exist")]
    UnknownPort(String),
    /// The interface is not known
    #[error("Interface {0} does not exist")]
    UnknownInterface(String),
    /// The network instance is not known
    #[error("Network instance {0} does not exist")]
    UnknownNetworkInstance(String),
    /// The configuration cannot be applied
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The port of the traffic generator is not configured
    #[error("Traffic generator port {0} is not configured")]
    UnknownTesterPort(String),
    /// The port is already connected to something
    #[error("Port {0} is already wired")]
    AlreadyWired(String),
    /// The port is not connected
    #[error("Port {0} is not wired")]
    NotWired(String),
}
