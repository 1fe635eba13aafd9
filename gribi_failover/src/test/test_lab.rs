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
use crate::netsim::lab::{FlowSpec, Lab, TesterPort, DEFAULT_RATE_PPS, MIN_FRAMES};
use crate::types::MacAddr;
use assert_approx_eq::assert_approx_eq;

fn tester_ports() -> Vec<TesterPort> {
    (1..=4u8)
        .map(|i| TesterPort {
            name: format!("atePort{}", i),
            mac: MacAddr([0x02, 0x00, i, 0x01, 0x01, 0x01]),
            ipv4: ate_ip(i),
            prefix_length: 30,
            gateway: Ipv4Addr::new(192, 0, 2, 4 * i - 3),
        })
        .collect()
}

fn lab() -> Lab {
    let mut lab = Lab::new(configured_dut(), 42);
    for i in 1..=4 {
        lab.connect(&format!("port{}", i), &format!("atePort{}", i))
            .unwrap();
    }
    lab.set_tester_config(tester_ports(), vec![]);
    lab.start_protocols();
    program(lab.dut_mut(), PARAMS);
    let dst_mac = lab.ipv4_neighbors("atePort1").unwrap()[0].1;
    let flow = FlowSpec {
        name: "BaseFlow".to_string(),
        tx_port: "atePort1".to_string(),
        src_mac: MacAddr([0x02, 0x00, 0x01, 0x01, 0x01, 0x01]),
        dst_mac,
        src_ip: ate_ip(1),
        dst_ip: PREFIX.network(),
        rate_pps: DEFAULT_RATE_PPS,
    };
    lab.set_tester_config(tester_ports(), vec![flow]);
    lab.start_protocols();
    lab
}

fn run_traffic(lab: &mut Lab) {
    lab.start_traffic();
    lab.stop_traffic();
}

fn rx(lab: &Lab, port: &str) -> u64 {
    lab.port_counters(port).map(|c| c.frames_rx).unwrap_or(0)
}

#[test]
fn test_wiring() {
    let mut lab = Lab::new(configured_dut(), 0);
    lab.connect("port1", "atePort1").unwrap();
    assert!(lab.connect("port1", "atePort2").is_err());
    assert!(lab.connect("port9", "atePort9").is_err());
    assert!(lab.set_link_carrier("port2", false).is_err());
}

#[test]
fn test_arp() {
    let mut lab = lab();
    let neighbors = lab.ipv4_neighbors("atePort1").unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].0, Ipv4Addr::new(192, 0, 2, 1));
    assert_eq!(neighbors[0].1, lab.dut().interface("Ethernet1").unwrap().mac());
    assert!(lab.ipv4_neighbors("atePort7").is_err());

    // without carrier, nothing is resolved
    lab.set_link_carrier("port1", false).unwrap();
    assert!(lab.ipv4_neighbors("atePort1").unwrap().is_empty());
    lab.stop_protocols();
    lab.set_link_carrier("port1", true).unwrap();
    assert!(lab.ipv4_neighbors("atePort1").unwrap().is_empty());
}

#[test]
fn test_weighted_distribution() {
    let mut lab = lab();
    run_traffic(&mut lab);
    let flow = lab.flow_counters("BaseFlow").unwrap();
    assert!(flow.frames_tx >= MIN_FRAMES);
    assert_eq!(flow.frames_tx, flow.frames_rx);
    assert_eq!(flow.loss_pct(), Some(0.0));

    let tx = flow.frames_tx as f64;
    assert_approx_eq!(rx(&lab, "atePort2") as f64 / tx, 0.8, 0.05);
    assert_approx_eq!(rx(&lab, "atePort3") as f64 / tx, 0.2, 0.05);
    assert_eq!(rx(&lab, "atePort4"), 0);
    assert_eq!(lab.port_counters("atePort1").unwrap().frames_tx, flow.frames_tx);
}

#[test]
fn test_failover() {
    let mut lab = lab();
    let disable = |lab: &mut Lab, port: &str| {
        let iface = lab.dut().port(port).unwrap().to_string();
        lab.dut_mut()
            .apply(&ConfigModifier::set_enabled(iface, false))
            .unwrap();
    };

    disable(&mut lab, "port2");
    run_traffic(&mut lab);
    assert_eq!(lab.flow_counters("BaseFlow").unwrap().loss_pct(), Some(0.0));
    assert_eq!(rx(&lab, "atePort2"), 0);
    assert_eq!(rx(&lab, "atePort4"), 0);

    disable(&mut lab, "port3");
    run_traffic(&mut lab);
    assert_eq!(lab.flow_counters("BaseFlow").unwrap().loss_pct(), Some(0.0));
    assert_eq!(rx(&lab, "atePort3"), 0);
    assert_eq!(rx(&lab, "atePort4"), lab.flow_counters("BaseFlow").unwrap().frames_tx);
}

#[test]
fn test_backup_down() {
    let mut lab = lab();
    lab.set_link_carrier("port2", false).unwrap();
    lab.set_link_carrier("port3", false).unwrap();
    lab.set_link_carrier("port4", false).unwrap();
    run_traffic(&mut lab);
    assert_eq!(lab.flow_counters("BaseFlow").unwrap().loss_pct(), Some(100.0));
}

#[test]
fn test_wrong_destination_mac() {
    let mut lab = lab();
    let mut flows = lab.flows().to_vec();
    flows[0].dst_mac = MacAddr([0x02, 0, 0, 0, 0, 0x99]);
    lab.set_tester_config(tester_ports(), flows);
    run_traffic(&mut lab);
    assert_eq!(lab.flow_counters("BaseFlow").unwrap().frames_rx, 0);
}

#[test]
fn test_no_traffic_without_start() {
    let mut lab = lab();
    lab.stop_traffic();
    assert_eq!(lab.flow_counters("BaseFlow"), None);
    assert_eq!(crate::netsim::lab::Counters::default().loss_pct(), None);
}
