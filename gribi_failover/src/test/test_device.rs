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

use super::*;
use crate::aft::Aft;
use crate::netsim::forwarding_state::Lookup;
use crate::netsim::{BackupReporting, DeviceError};
use crate::verify::{check_next_hop_group, NhgResolution};
use maplit::btreemap;
use std::thread::sleep;
use std::time::Duration;

fn disable(dut: &mut Device, port: &str) {
    let iface = dut.port(port).unwrap().to_string();
    dut.apply(&ConfigModifier::set_enabled(iface, false))
        .unwrap();
}

fn default_aft(dut: &Device) -> &Aft {
    dut.aft(DEFAULT_NETWORK_INSTANCE).unwrap()
}

fn aft_members(dut: &Device, id: NhgId) -> BTreeMap<NextHopId, u64> {
    let nhg = default_aft(dut).next_hop_group(id).unwrap();
    nhg.next_hops.clone()
}

#[test]
fn test_ports() {
    let mut dut = configured_dut();
    assert_eq!(dut.port("port3"), Ok("Ethernet3"));
    assert_eq!(dut.port("port5"), Err(DeviceError::UnknownPort("port5".to_string())));
    let iface = dut.interface("Ethernet3").unwrap();
    assert_eq!(iface.ipv4(), Some(Ipv4Addr::new(192, 0, 2, 9)));
    assert_eq!(iface.config().description, "dutPort3");
    let unknown = ConfigModifier::set_enabled("Ethernet9", false);
    assert!(dut.apply(&unknown).is_err());
}

#[test]
fn test_aft_primaries() {
    let mut dut = configured_dut();
    program(&mut dut, PARAMS);
    let aft = dut.aft(DEFAULT_NETWORK_INSTANCE).unwrap();
    assert_eq!(aft.ipv4_entry(&PREFIX).unwrap().next_hop_group, Some(100));
    assert_eq!(aft_members(&dut, 100), btreemap! {1001 => 80, 1002 => 20});
    assert_eq!(aft.next_hop(1001).unwrap().ip_address, Some(ate_ip(2)));
    assert_eq!(aft.next_hop(1001).unwrap().interface, Some("Ethernet2".to_string()));
    assert!(dut.aft("VRF-A").is_err());
}

#[test]
fn test_aft_failover_inline() {
    let mut dut = configured_dut();
    program(&mut dut, PARAMS);

    disable(&mut dut, "port2");
    assert_eq!(aft_members(&dut, 100), btreemap! {1002 => 20});
    let entry = dut.forwarding_state().entry(&PREFIX).unwrap();
    assert!(!entry.via_backup());

    disable(&mut dut, "port3");
    // the group shows the next hop of the backup group
    assert_eq!(aft_members(&dut, 100), btreemap! {1003 => 10});
    let entry = dut.forwarding_state().entry(&PREFIX).unwrap();
    assert!(entry.via_backup());
    assert_eq!(entry.active_next_hop_group, 200);
    assert_eq!(entry.next_hops.len(), 1);
    assert_eq!(entry.next_hops[0].interface, "Ethernet4");
}

#[test]
fn test_aft_failover_reference() {
    let mut dut = configured_dut();
    dut.set_backup_reporting(BackupReporting::Reference);
    program(&mut dut, PARAMS);
    disable(&mut dut, "port2");
    disable(&mut dut, "port3");

    let aft = dut.aft(DEFAULT_NETWORK_INSTANCE).unwrap();
    let group = aft.next_hop_group(100).unwrap();
    assert!(group.relies_on_backup());
    assert_eq!(check_next_hop_group(*PREFIX, group), Ok(NhgResolution::Backup(200)));
    // forwarding still uses the backup
    assert!(dut.forwarding_state().entry(&PREFIX).unwrap().via_backup());
}

#[test]
fn test_no_backup_support() {
    let mut dut = configured_dut();
    dut.disable_backup();
    program(&mut dut, PARAMS);
    disable(&mut dut, "port2");
    disable(&mut dut, "port3");

    let aft = dut.aft(DEFAULT_NETWORK_INSTANCE).unwrap();
    let group = aft.next_hop_group(100).unwrap();
    assert!(group.next_hops.is_empty());
    assert_eq!(group.backup_next_hop_group, None);
    assert!(check_next_hop_group(*PREFIX, group).is_err());
    assert_eq!(dut.forwarding_state().lookup(Ipv4Addr::new(203, 0, 113, 0)), Lookup::Drop);
}

#[test]
fn test_carrier_loss() {
    let mut dut = configured_dut();
    program(&mut dut, PARAMS);
    dut.set_carrier("Ethernet2", false).unwrap();
    assert!(dut.interface("Ethernet2").unwrap().is_enabled());
    assert_eq!(aft_members(&dut, 100), btreemap! {1002 => 20});
    dut.set_carrier("Ethernet2", true).unwrap();
    assert_eq!(aft_members(&dut, 100), btreemap! {1001 => 80, 1002 => 20});
}

#[test]
fn test_aft_delay() {
    let mut dut = configured_dut();
    dut.set_aft_delay(Duration::from_millis(200));
    program(&mut dut, PARAMS);
    // the entry is not yet visible
    assert!(default_aft(&dut).ipv4_entry(&PREFIX).is_none());
    // but it is already used for forwarding
    assert!(dut.forwarding_state().entry(&PREFIX).is_some());
    sleep(Duration::from_millis(250));
    assert!(default_aft(&dut).ipv4_entry(&PREFIX).is_some());
}

#[test]
fn test_lookup() {
    let mut dut = configured_dut();
    program(&mut dut, PARAMS);
    let fw = dut.forwarding_state();
    assert_eq!(fw.lookup(ate_ip(1)), Lookup::Connected("Ethernet1"));
    match fw.lookup(Ipv4Addr::new(203, 0, 113, 77)) {
        Lookup::Forward(e) => assert_eq!(e.next_hops.len(), 2),
        l => panic!("unexpected lookup result: {:?}", l),
    }
    assert_eq!(fw.lookup(Ipv4Addr::new(198, 51, 100, 1)), Lookup::Drop);
}

#[test]
fn test_flush_and_disconnect() {
    let mut dut = configured_dut();
    let id = program(
        &mut dut,
        SessionParameters {
            persistence: Persistence::Delete,
            ..PARAMS
        },
    );
    dut.gribi_flush(id, Some(DEFAULT_NETWORK_INSTANCE)).unwrap();
    assert!(default_aft(&dut).ipv4_entries.is_empty());
    assert!(dut.forwarding_state().entry(&PREFIX).is_none());

    let results = dut.gribi_modify(id, scenario_operations()).unwrap();
    for r in &results {
        assert_eq!(r.result, ProgrammingResult::InstalledInRib);
    }
    dut.gribi_disconnect().unwrap();
    assert!(default_aft(&dut).next_hops.is_empty());
}

#[test]
fn test_printer() {
    use crate::netsim::printer;

    let mut dut = configured_dut();
    program(&mut dut, PARAMS);
    let table = printer::aft_table(default_aft(&dut));
    assert_eq!(
        table,
        vec![
            "203.0.113.0/24 -> NHG 100 [1001 (192.0.2.6) w80, 1002 (192.0.2.10) w20] backup NHG 200"
                .to_string()
        ]
    );

    disable(&mut dut, "port2");
    disable(&mut dut, "port3");
    let fw = printer::forwarding_table(dut.forwarding_state());
    assert!(
        fw.iter()
            .any(|l| l == "B 203.0.113.0/24 -> NHG 200: 192.0.2.14 via Ethernet4 w10"),
        "{:?}",
        fw
    );
}
