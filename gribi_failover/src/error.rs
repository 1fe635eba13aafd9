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

use crate::gribi::GribiError;
use crate::netsim::DeviceError;
use crate::types::ParseError;
use crate::verify::VerifyError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A verification step failed
    #[error("Verification failed: {0}")]
    VerifyError(#[from] VerifyError),
    /// Error from the gRIBI session
    #[error("gRIBI Error: {0}")]
    GribiError(#[from] GribiError),
    /// Error from the simulated device
    #[error("Device Error: {0}")]
    DeviceError(#[from] DeviceError),
    /// Parse error
    #[error("Parse Error: {0}")]
    ParseError(#[from] ParseError),
}
