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

//! # Port Attributes
//!
//! Addressing of a single port, either on the device under test or on the traffic generator. The
//! attributes of both ends of a link are used to build the interface configuration of the DUT and
//! the emulated device on the traffic generator.

use crate::config::{InterfaceAddress, InterfaceConfig};
use crate::types::{Ipv4Prefix, MacAddr, ParseError};

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Attributes of a port. These are static for the entire duration of a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAttributes {
    /// Name used on the traffic generator (e.g., `atePort1`)
    pub name: String,
    /// Interface description used on the device under test
    pub desc: String,
    /// MAC address (only set on traffic generator ports)
    pub mac: Option<MacAddr>,
    /// IPv4 address
    pub ipv4: Ipv4Addr,
    /// IPv4 prefix length
    pub ipv4_len: u8,
    /// IPv6 address
    pub ipv6: Ipv6Addr,
    /// IPv6 prefix length
    pub ipv6_len: u8,
}

impl PortAttributes {
    /// Generate the interface configuration for the device under test, with the interface
    /// enabled.
    pub fn new_interface(&self, name: impl Into<String>) -> InterfaceConfig {
        InterfaceConfig {
            name: name.into(),
            description: self.desc.clone(),
            enabled: true,
            ipv4: Some(InterfaceAddress {
                ip: self.ipv4,
                prefix_length: self.ipv4_len,
            }),
            ipv6: Some(InterfaceAddress {
                ip: self.ipv6,
                prefix_length: self.ipv6_len,
            }),
        }
    }

    /// Connected IPv4 subnet of the port.
    pub fn ipv4_prefix(&self) -> Result<Ipv4Prefix, ParseError> {
        Ipv4Prefix::new(self.ipv4, self.ipv4_len)
    }

    /// Ethernet name on the traffic generator, as used in OTG telemetry
    pub fn eth_name(&self) -> String {
        format!("{}.Eth", self.name)
    }

    /// IPv4 name on the traffic generator
    pub fn ipv4_name(&self) -> String {
        format!("{}.IPv4", self.name)
    }

    /// IPv6 name on the traffic generator
    pub fn ipv6_name(&self) -> String {
        format!("{}.IPv6", self.name)
    }
}
