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

//! # Interface configuration
//!
//! Declarative configuration of device interfaces. A [`ConfigModifier::Replace`] sets the entire
//! configuration of one interface, while a [`ConfigModifier::Update`] only touches the leaves that
//! are set in the [`InterfacePatch`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Address configured on an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceAddress<A> {
    /// Address of the interface
    pub ip: A,
    /// Prefix length of the connected subnet
    pub prefix_length: u8,
}

impl<A: fmt::Display> fmt::Display for InterfaceAddress<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_length)
    }
}

/// Full configuration of a single interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Name of the interface on the device (e.g., `Ethernet1`)
    pub name: String,
    /// Description
    pub description: String,
    /// Administrative state
    pub enabled: bool,
    /// IPv4 address of subinterface 0
    pub ipv4: Option<InterfaceAddress<Ipv4Addr>>,
    /// IPv6 address of subinterface 0
    pub ipv6: Option<InterfaceAddress<Ipv6Addr>>,
}

impl InterfaceConfig {
    /// Empty, enabled interface without any address
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            ipv4: None,
            ipv6: None,
        }
    }
}

/// Partial update of an interface. Fields set to `None` are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfacePatch {
    /// Name of the interface to update
    pub name: String,
    /// New administrative state
    pub enabled: Option<bool>,
    /// New description
    pub description: Option<String>,
}

/// Modification of the device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigModifier {
    /// Replace the whole interface configuration
    Replace(InterfaceConfig),
    /// Update selected leaves of an existing interface
    Update(InterfacePatch),
}

impl ConfigModifier {
    /// Interface which is affected by the modifier
    pub fn interface(&self) -> &str {
        match self {
            Self::Replace(c) => c.name.as_str(),
            Self::Update(p) => p.name.as_str(),
        }
    }

    /// Modifier setting the administrative state of an interface
    pub fn set_enabled(name: impl Into<String>, enabled: bool) -> Self {
        Self::Update(InterfacePatch {
            name: name.into(),
            enabled: Some(enabled),
            description: None,
        })
    }
}

impl fmt::Display for ConfigModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(c) => {
                write!(f, "Replace interface {} (enabled: {}", c.name, c.enabled)?;
                if let Some(a) = c.ipv4 {
                    write!(f, ", ipv4: {}", a)?;
                }
                if let Some(a) = c.ipv6 {
                    write!(f, ", ipv6: {}", a)?;
                }
                write!(f, ")")
            }
            Self::Update(p) => {
                write!(f, "Update interface {}", p.name)?;
                if let Some(e) = p.enabled {
                    write!(f, " enabled: {}", e)?;
                }
                if let Some(d) = p.description.as_ref() {
                    write!(f, " description: {}", d)?;
                }
                Ok(())
            }
        }
    }
}
