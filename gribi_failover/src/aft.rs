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

//! # Abstract Forwarding Table
//!
//! Operational view of the forwarding table of a device, as it is exported via telemetry. The
//! entries are keyed the same way as the injected gRIBI entries, but they only contain what the
//! device actually uses for forwarding.

use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// IPv4 entry of the AFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AftIpv4Entry {
    /// Destination prefix
    pub prefix: Ipv4Prefix,
    /// Next-hop-group used for this prefix, if already known
    pub next_hop_group: Option<NhgId>,
    /// Network instance of the next-hop-group
    pub next_hop_group_network_instance: Option<String>,
}

/// Next-hop-group of the AFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AftNextHopGroup {
    /// ID of the group
    pub id: NhgId,
    /// Next hops currently in use, and their weight
    pub next_hops: BTreeMap<NextHopId, u64>,
    /// Backup group of this group
    pub backup_next_hop_group: Option<NhgId>,
}

impl AftNextHopGroup {
    /// Returns `true` if the group has no usable next hop, but refers to a backup group.
    pub fn relies_on_backup(&self) -> bool {
        self.next_hops.is_empty() && self.backup_next_hop_group.is_some()
    }
}

/// Next hop of the AFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AftNextHop {
    /// Index of the next hop
    pub index: NextHopId,
    /// Address of the next hop
    pub ip_address: Option<Ipv4Addr>,
    /// Egress interface, if the next hop is resolved
    pub interface: Option<String>,
}

/// AFT of a single network instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aft {
    /// IPv4 entries
    pub ipv4_entries: BTreeMap<Ipv4Prefix, AftIpv4Entry>,
    /// Next-hop-groups
    pub next_hop_groups: BTreeMap<NhgId, AftNextHopGroup>,
    /// Next hops
    pub next_hops: BTreeMap<NextHopId, AftNextHop>,
}

impl Aft {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup an IPv4 entry
    pub fn ipv4_entry(&self, prefix: &Ipv4Prefix) -> Option<&AftIpv4Entry> {
        self.ipv4_entries.get(prefix)
    }

    /// Lookup a next-hop-group
    pub fn next_hop_group(&self, id: NhgId) -> Option<&AftNextHopGroup> {
        self.next_hop_groups.get(&id)
    }

    /// Lookup a next hop
    pub fn next_hop(&self, index: NextHopId) -> Option<&AftNextHop> {
        self.next_hops.get(&index)
    }
}
