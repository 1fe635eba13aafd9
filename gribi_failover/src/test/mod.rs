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

#[cfg(test)]
mod test_device;
#[cfg(test)]
mod test_lab;

use crate::attrs::PortAttributes;
use crate::config::ConfigModifier;
use crate::gribi::*;
use crate::netsim::Device;
use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

lazy_static! {
    static ref DUT_PORTS: Vec<PortAttributes> = (1..=4u8)
        .map(|i| PortAttributes {
            name: format!("dutPort{}", i),
            desc: format!("dutPort{}", i),
            mac: None,
            ipv4: Ipv4Addr::new(192, 0, 2, 4 * i - 3),
            ipv4_len: 30,
            ipv6: format!("2001:db8::192:0:2:{:x}", 4 * i - 3)
                .parse()
                .unwrap(),
            ipv6_len: 126,
        })
        .collect();
    static ref PREFIX: Ipv4Prefix = "203.0.113.0/24".parse().unwrap();
}

const PARAMS: SessionParameters = SessionParameters {
    redundancy: Redundancy::SinglePrimary,
    persistence: Persistence::Preserve,
    ack_mode: AckMode::Rib,
};

/// Address of the traffic generator on port `i`
fn ate_ip(i: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 0, 2, 4 * i - 2)
}

/// Device with all four ports configured
fn configured_dut() -> Device {
    let mut dut = Device::new("dut", 4);
    for (i, attrs) in DUT_PORTS.iter().enumerate() {
        let iface = dut.port(&format!("port{}", i + 1)).unwrap().to_string();
        dut.apply(&ConfigModifier::Replace(attrs.new_interface(iface)))
            .unwrap();
    }
    dut
}

fn op(id: u64, entry: Entry) -> Operation {
    Operation {
        id,
        network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
        kind: OperationKind::Add,
        entry,
    }
}

fn nh(index: NextHopId, ip_address: Ipv4Addr) -> Entry {
    Entry::NextHop(NextHop { index, ip_address })
}

fn nhg(id: NhgId, next_hops: BTreeMap<NextHopId, u64>, backup: Option<NhgId>) -> Entry {
    Entry::NextHopGroup(NextHopGroup {
        id,
        next_hops,
        backup_next_hop_group: backup,
    })
}

fn ipv4(prefix: Ipv4Prefix, nhg: NhgId) -> Entry {
    Entry::Ipv4(Ipv4Entry {
        prefix,
        next_hop_group: nhg,
        next_hop_group_network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
    })
}

/// The operations of the backup scenario: backup group first, then the primary group and the
/// prefix.
fn scenario_operations() -> Vec<Operation> {
    use maplit::btreemap;
    vec![
        op(1, nh(1003, ate_ip(4))),
        op(2, nhg(200, btreemap! {1003 => 10}, None)),
        op(3, nh(1001, ate_ip(2))),
        op(4, nh(1002, ate_ip(3))),
        op(5, nhg(100, btreemap! {1001 => 80, 1002 => 20}, Some(200))),
        op(6, ipv4(*PREFIX, 100)),
    ]
}

/// Connect, elect and program the scenario. Returns the election ID.
fn program(dut: &mut Device, params: SessionParameters) -> ElectionId {
    dut.gribi_connect(params).unwrap();
    let id = dut.gribi_elect(ElectionId::new(1)).unwrap();
    let results = dut.gribi_modify(id, scenario_operations()).unwrap();
    for r in &results {
        assert_ne!(r.result, ProgrammingResult::Failed, "{:?}", r);
    }
    id
}
