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

//! Module containing the addressing types shared by all parts of the library

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Index of a next hop, as used by gRIBI and the AFT.
pub type NextHopId = u64;
/// Identifier of a next-hop-group, as used by gRIBI and the AFT.
pub type NhgId = u64;

/// Parse errors of the addressing types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The string is not of the form `a.b.c.d/len`
    #[error("Invalid IPv4 prefix: {0}")]
    InvalidPrefix(String),
    /// The prefix length is larger than 32
    #[error("Invalid IPv4 prefix length: {0}")]
    InvalidPrefixLength(u8),
    /// The string is not a MAC address in the form `aa:bb:cc:dd:ee:ff`
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),
}

/// # IPv4 Prefix
///
/// The address is stored as given (host bits are not cleared). Use [`Ipv4Prefix::network`] to get
/// the first address of the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Prefix {
    addr: Ipv4Addr,
    len: u8,
}

impl Ipv4Prefix {
    /// Create a new prefix. Fails if `len > 32`.
    pub fn new(addr: Ipv4Addr, len: u8) -> Result<Self, ParseError> {
        if len > 32 {
            return Err(ParseError::InvalidPrefixLength(len));
        }
        Ok(Self { addr, len })
    }

    /// Create a new prefix, clamping `len` to 32. Usable in constants.
    pub const fn new_saturating(addr: Ipv4Addr, len: u8) -> Self {
        Self {
            addr,
            len: if len > 32 { 32 } else { len },
        }
    }

    /// The address as it was given
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Prefix length
    pub fn len(&self) -> u8 {
        self.len
    }

    /// Returns true if the prefix is the default route `0.0.0.0/0`.
    pub fn is_default(&self) -> bool {
        self.len == 0
    }

    /// Netmask as integer
    pub fn mask(&self) -> u32 {
        if self.len == 0 {
            0
        } else {
            u32::MAX << (32 - self.len)
        }
    }

    /// The first address of the prefix (all host bits cleared).
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.mask())
    }

    /// Returns true if the address lies inside the prefix.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network())
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| ParseError::InvalidPrefix(s.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| ParseError::InvalidPrefix(s.to_string()))?;
        let len: u8 = len
            .parse()
            .map_err(|_| ParseError::InvalidPrefix(s.to_string()))?;
        Self::new(addr, len)
    }
}

impl std::convert::TryFrom<String> for Ipv4Prefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ipv4Prefix> for String {
    fn from(p: Ipv4Prefix) -> Self {
        p.to_string()
    }
}

/// Ethernet MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Locally administered unicast address derived from a device and interface number. Used by
    /// the simulator to give every DUT interface a stable hardware address.
    pub fn local(device: u8, iface: u8) -> Self {
        Self([0x02, 0x1a, 0x00, device, 0x00, iface])
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl FromStr for MacAddr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');
        for b in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ParseError::InvalidMac(s.to_string()))?;
            if part.len() != 2 {
                return Err(ParseError::InvalidMac(s.to_string()));
            }
            *b = u8::from_str_radix(part, 16).map_err(|_| ParseError::InvalidMac(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseError::InvalidMac(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl std::convert::TryFrom<String> for MacAddr {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(m: MacAddr) -> Self {
        m.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefix_parse() {
        let p: Ipv4Prefix = "203.0.113.0/24".parse().unwrap();
        assert_eq!(p.addr(), Ipv4Addr::new(203, 0, 113, 0));
        assert_eq!(p.len(), 24);
        assert_eq!(p.to_string(), "203.0.113.0/24");
        assert_eq!(
            "203.0.113.0".parse::<Ipv4Prefix>(),
            Err(ParseError::InvalidPrefix("203.0.113.0".into()))
        );
        assert_eq!("10.0.0.0/33".parse::<Ipv4Prefix>(), Err(ParseError::InvalidPrefixLength(33)));
    }

    #[test]
    fn prefix_saturating() {
        const P: Ipv4Prefix = Ipv4Prefix::new_saturating(Ipv4Addr::new(203, 0, 113, 0), 24);
        assert_eq!(P, "203.0.113.0/24".parse().unwrap());
        let host = Ipv4Prefix::new_saturating(Ipv4Addr::new(192, 0, 2, 1), 40);
        assert_eq!(host.len(), 32);
        assert_eq!(host.to_string(), "192.0.2.1/32");
    }

    #[test]
    fn prefix_contains() {
        let p = Ipv4Prefix::new(Ipv4Addr::new(192, 0, 2, 5), 30).unwrap();
        assert_eq!(p.network(), Ipv4Addr::new(192, 0, 2, 4));
        assert!(p.contains(Ipv4Addr::new(192, 0, 2, 6)));
        assert!(p.contains(Ipv4Addr::new(192, 0, 2, 7)));
        assert!(!p.contains(Ipv4Addr::new(192, 0, 2, 8)));
        let default = Ipv4Prefix::new(Ipv4Addr::UNSPECIFIED, 0).unwrap();
        assert!(default.is_default());
        assert!(default.contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn mac_parse() {
        let m: MacAddr = "02:00:01:01:01:0A".parse().unwrap();
        assert_eq!(m, MacAddr([2, 0, 1, 1, 1, 10]));
        assert_eq!(m.to_string(), "02:00:01:01:01:0a");
        assert!("02:00:01:01:01".parse::<MacAddr>().is_err());
        assert!("02:00:01:01:01:01:01".parse::<MacAddr>().is_err());
        assert!("02:00:01:01:01:zz".parse::<MacAddr>().is_err());
    }
}
