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

//! Module containing helper functions to get formatted strings of the AFT and the forwarding
//! state.

use crate::aft::{Aft, AftNextHopGroup};
use crate::netsim::forwarding_state::{ForwardingEntry, ForwardingState};

use itertools::Itertools;

/// Get a vector of strings, which represent the AFT. Each `String` in the vector represents one
/// IPv4 entry, with the next hops of its group resolved.
pub fn aft_table(aft: &Aft) -> Vec<String> {
    aft.ipv4_entries
        .values()
        .map(|e| match e.next_hop_group {
            Some(id) => match aft.next_hop_group(id) {
                Some(nhg) => format!("{} -> {}", e.prefix, aft_nhg(aft, nhg)),
                None => format!("{} -> NHG {} (missing)", e.prefix, id),
            },
            None => format!("{} -> ?", e.prefix),
        })
        .collect()
}

/// Returns the formatted string of a next-hop-group, with the addresses of all next hops.
pub fn aft_nhg(aft: &Aft, nhg: &AftNextHopGroup) -> String {
    let members = nhg
        .next_hops
        .iter()
        .map(|(idx, weight)| match aft.next_hop(*idx).and_then(|nh| nh.ip_address) {
            Some(addr) => format!("{} ({}) w{}", idx, addr, weight),
            None => format!("{} (?) w{}", idx, weight),
        })
        .join(", ");
    match nhg.backup_next_hop_group {
        Some(b) => format!("NHG {} [{}] backup NHG {}", nhg.id, members, b),
        None => format!("NHG {} [{}]", nhg.id, members),
    }
}

/// Get a vector of strings, one for every forwarding entry. Entries using the backup group are
/// marked with a `B`, and entries without any usable next hop with a `X`.
pub fn forwarding_table(state: &ForwardingState) -> Vec<String> {
    state.entries().map(forwarding_entry).collect()
}

/// Returns the formatted string of a single forwarding entry
pub fn forwarding_entry(e: &ForwardingEntry) -> String {
    let flag = if e.next_hops.is_empty() {
        "X"
    } else if e.via_backup() {
        "B"
    } else {
        " "
    };
    format!(
        "{} {} -> NHG {}: {}",
        flag,
        e.prefix,
        e.active_next_hop_group,
        e.next_hops
            .iter()
            .map(|nh| format!("{} via {} w{}", nh.address, nh.interface, nh.weight))
            .join(", ")
    )
}
