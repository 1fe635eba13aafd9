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

//! # Forwarding State
//!
//! The forwarding state is derived from the RIB and the operational state of the interfaces. It
//! is recomputed whenever one of them changes.

use crate::netsim::interface::Interface;
use crate::netsim::rib::NetworkInstanceRib;
use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Next hop that can be used for forwarding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNextHop {
    /// Index of the next hop
    pub index: NextHopId,
    /// Address of the next hop
    pub address: Ipv4Addr,
    /// Egress interface
    pub interface: String,
    /// Weight inside the active group
    pub weight: u64,
}

/// Forwarding entry of a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingEntry {
    /// Destination prefix
    pub prefix: Ipv4Prefix,
    /// Group the prefix points to
    pub next_hop_group: NhgId,
    /// Group that is actually used. This is either `next_hop_group` or its backup.
    pub active_next_hop_group: NhgId,
    /// Backup group of `next_hop_group`, if it is used by the device
    pub backup_next_hop_group: Option<NhgId>,
    /// Next hops of the active group that are resolved. If empty, traffic is dropped.
    pub next_hops: Vec<ResolvedNextHop>,
}

impl ForwardingEntry {
    /// Returns `true` if the backup group is used
    pub fn via_backup(&self) -> bool {
        self.active_next_hop_group != self.next_hop_group
    }
}

/// Result of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The destination is on a directly connected subnet
    Connected(&'a str),
    /// The destination is forwarded using a gRIBI entry
    Forward(&'a ForwardingEntry),
    /// No usable route
    Drop,
}

/// # Forwarding State
///
/// Contains the connected subnets of all operationally up interfaces and the resolved gRIBI
/// entries of a single network instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardingState {
    connected: Vec<(Ipv4Prefix, String)>,
    entries: BTreeMap<Ipv4Prefix, ForwardingEntry>,
}

impl ForwardingState {
    /// Compute the forwarding state. If `use_backup` is false, backup groups are ignored.
    pub fn new(
        interfaces: &BTreeMap<String, Interface>,
        rib: Option<&NetworkInstanceRib>,
        use_backup: bool,
    ) -> Self {
        let connected: Vec<(Ipv4Prefix, String)> = interfaces
            .values()
            .filter(|i| i.oper_up())
            .filter_map(|i| i.ipv4_prefix().map(|p| (p, i.name().to_string())))
            .collect();

        let resolve = |rib: &NetworkInstanceRib, nhg: NhgId| -> Vec<ResolvedNextHop> {
            rib.next_hop_groups()
                .get(&nhg)
                .map(|g| {
                    g.next_hops
                        .iter()
                        .filter_map(|(idx, weight)| {
                            let nh = rib.next_hops().get(idx)?;
                            let iface = interfaces.values().find(|i| i.reaches(nh.ip_address))?;
                            Some(ResolvedNextHop {
                                index: *idx,
                                address: nh.ip_address,
                                interface: iface.name().to_string(),
                                weight: *weight,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut entries = BTreeMap::new();
        if let Some(rib) = rib {
            for (prefix, e) in rib.ipv4_entries() {
                let backup = if use_backup {
                    rib.next_hop_groups()
                        .get(&e.next_hop_group)
                        .and_then(|g| g.backup_next_hop_group)
                } else {
                    None
                };
                let mut active = e.next_hop_group;
                let mut next_hops = resolve(rib, e.next_hop_group);
                if next_hops.is_empty() {
                    if let Some(b) = backup {
                        active = b;
                        next_hops = resolve(rib, b);
                    }
                }
                entries.insert(
                    *prefix,
                    ForwardingEntry {
                        prefix: *prefix,
                        next_hop_group: e.next_hop_group,
                        active_next_hop_group: active,
                        backup_next_hop_group: backup,
                        next_hops,
                    },
                );
            }
        }

        Self { connected, entries }
    }

    /// Forwarding entry of an exact prefix
    pub fn entry(&self, prefix: &Ipv4Prefix) -> Option<&ForwardingEntry> {
        self.entries.get(prefix)
    }

    /// Iterate over all forwarding entries
    pub fn entries(&self) -> impl Iterator<Item = &ForwardingEntry> {
        self.entries.values()
    }

    /// Longest prefix match for the destination. Connected subnets win over gRIBI entries of the
    /// same length.
    pub fn lookup(&self, dst: Ipv4Addr) -> Lookup<'_> {
        let connected = self
            .connected
            .iter()
            .filter(|(p, _)| p.contains(dst))
            .max_by_key(|(p, _)| p.len());
        let entry = self
            .entries
            .values()
            .filter(|e| e.prefix.contains(dst))
            .max_by_key(|e| e.prefix.len());
        match (connected, entry) {
            (Some((p, iface)), Some(e)) if p.len() >= e.prefix.len() => Lookup::Connected(iface),
            (Some((_, iface)), None) => Lookup::Connected(iface),
            (_, Some(e)) if !e.next_hops.is_empty() => Lookup::Forward(e),
            _ => Lookup::Drop,
        }
    }
}
