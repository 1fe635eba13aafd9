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

//! Interface of a simulated device

use crate::config::{InterfaceConfig, InterfacePatch};
use crate::types::{Ipv4Prefix, MacAddr};

use std::net::Ipv4Addr;

/// # Interface
///
/// A physical interface with its configuration and its operational state. The interface is
/// operationally up if it is administratively enabled and the link has a carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    config: InterfaceConfig,
    mac: MacAddr,
    carrier: bool,
}

impl Interface {
    /// Create a new interface with a carrier
    pub fn new(config: InterfaceConfig, mac: MacAddr) -> Self {
        Self {
            config,
            mac,
            carrier: true,
        }
    }

    /// Name of the interface
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current configuration
    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    /// Hardware address
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Administrative state
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Operational state
    pub fn oper_up(&self) -> bool {
        self.config.enabled && self.carrier
    }

    /// Set the carrier of the link attached to this interface
    pub fn set_carrier(&mut self, carrier: bool) {
        self.carrier = carrier;
    }

    /// Replace the configuration. The name is kept.
    pub fn replace(&mut self, config: InterfaceConfig) {
        let name = std::mem::take(&mut self.config.name);
        self.config = InterfaceConfig { name, ..config };
    }

    /// Apply a partial update
    pub fn update(&mut self, patch: &InterfacePatch) {
        if let Some(enabled) = patch.enabled {
            self.config.enabled = enabled;
        }
        if let Some(desc) = patch.description.as_ref() {
            self.config.description = desc.clone();
        }
    }

    /// IPv4 address of the interface
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.config.ipv4.map(|a| a.ip)
    }

    /// Connected IPv4 subnet
    pub fn ipv4_prefix(&self) -> Option<Ipv4Prefix> {
        self.config
            .ipv4
            .and_then(|a| Ipv4Prefix::new(a.ip, a.prefix_length).ok())
    }

    /// Returns `true` if `addr` is a neighbor reachable over this interface right now.
    pub fn reaches(&self, addr: Ipv4Addr) -> bool {
        self.oper_up()
            && self.ipv4() != Some(addr)
            && self.ipv4_prefix().map_or(false, |p| p.contains(addr))
    }
}
