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

#![deny(missing_docs)]

//! # gRIBI Failover: Backup Next-Hop-Group Validation
//!
//! This library contains the building blocks to validate that a device under test switches to a
//! backup next-hop-group once all next hops of the primary group become unreachable. A prefix is
//! injected via gRIBI, pointing to a group of two weighted next hops with a backup group of a
//! single next hop. Then, the links towards the primary next hops are disabled one after the
//! other, and after every step, the AFT telemetry and the traffic loss are checked.
//!
//! ## Structure
//!
//! - **[`Types`](types)**: Addressing types (prefixes, MAC addresses) and identifiers.
//!
//! - **[`Port Attributes`](attrs)**: Static addressing of the ports on both ends of a link.
//!
//! - **[`Configuration`](config)**: Declarative interface configuration, applied either as a full
//!   replacement or as a partial update.
//!
//! - **[`gRIBI`](gribi)**: Entries, operations, programming results and the
//!   [`GribiSession`](gribi::GribiSession) trait, which abstracts the transport to the gRIBI
//!   server of the device.
//!
//! - **[`AFT`](aft)**: Operational view of the forwarding table, as exported by telemetry.
//!
//! - **[`Verification`](verify)**: Decision rules applied on the AFT and the traffic counters.
//!
//! - **[`NetSim`](netsim)**: Simulated device under test (gRIBI RIB, forwarding state, AFT and
//!   interfaces) inside a [`Lab`](netsim::Lab), which forwards the frames of a simulated traffic
//!   generator through the device.

pub mod aft;
pub mod attrs;
pub mod config;
mod error;
pub mod gribi;
pub mod netsim;
pub mod types;
pub mod verify;
pub use error::Error;

#[cfg(test)]
mod test;
