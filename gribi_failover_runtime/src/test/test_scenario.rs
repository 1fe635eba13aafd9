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
use crate::run_simulated;
use crate::scenario;
use crate::sim::Fault;
use crate::Error;

use assert_approx_eq::assert_approx_eq;
use gribi_failover::netsim::BackupReporting;
use gribi_failover::verify::VerifyError;
use std::net::Ipv4Addr;

fn options(fault: Fault, backup_reporting: BackupReporting) -> SimOptions {
    SimOptions {
        fault,
        backup_reporting,
        ..SimOptions::default()
    }
}

/// All entries are removed and all ports are enabled after the scenario.
fn assert_clean(tb: &SimTestbed) {
    let lab = tb.lab();
    let dut = lab.dut();
    let ni = dut.network_instance();
    assert!(dut.rib().instance(ni).unwrap().is_empty());
    assert!(dut.rib().session().is_none());
    for iface in dut.interfaces() {
        assert!(iface.is_enabled(), "{} is still disabled", iface.name());
    }
}

#[test]
fn test_scenario_inline() {
    let cfg = fast_config();
    let report = run_simulated(&cfg, &SimOptions::default()).unwrap();
    assert_eq!(report.prefix, cfg.prefix);
    assert_eq!(report.phases.len(), 3);

    let p1 = &report.phases[0];
    assert_eq!(p1.next_hop_group, 100);
    assert_eq!(p1.next_hops, vec![Ipv4Addr::new(192, 0, 2, 6), Ipv4Addr::new(192, 0, 2, 10)]);
    assert_eq!(p1.loss, 0.0);

    let p2 = &report.phases[1];
    assert_eq!(p2.next_hops, vec![Ipv4Addr::new(192, 0, 2, 10)]);
    assert_eq!(p2.port_rx["atePort2"], 0);
    assert_eq!(p2.port_rx["atePort3"], p2.frames_rx);

    let p3 = &report.phases[2];
    assert!(!p3.relies_on_backup);
    assert_eq!(p3.next_hops, vec![Ipv4Addr::new(192, 0, 2, 14)]);
    assert_eq!(p3.port_rx["atePort4"], p3.frames_tx);
    assert_eq!(p3.loss, 0.0);
}

#[test]
fn test_scenario_reference() {
    let opts = options(Fault::None, BackupReporting::Reference);
    let report = run_simulated(&fast_config(), &opts).unwrap();
    let p3 = &report.phases[2];
    assert!(p3.relies_on_backup);
    assert!(p3.next_hops.is_empty());
    assert_eq!(p3.loss, 0.0);
    assert_eq!(p3.port_rx["atePort4"], p3.frames_rx);
}

#[test]
fn test_weighted_distribution() {
    let report = run_simulated(&fast_config(), &SimOptions::default()).unwrap();
    let p1 = &report.phases[0];
    let share = p1.port_rx["atePort2"] as f64 / p1.frames_rx as f64;
    assert_approx_eq!(share, 0.8, 0.05);
    assert_eq!(p1.port_rx["atePort2"] + p1.port_rx["atePort3"], p1.frames_rx);
    assert_eq!(p1.port_rx["atePort4"], 0);
}

#[test]
fn test_scenario_cleanup() {
    let cfg = fast_config();
    let tb = testbed();
    scenario::run(&tb.dut(), &tb.ate(), tb.gribi(), &cfg).unwrap();
    assert_clean(&tb);
}

#[test]
fn test_backup_down() {
    let cfg = fast_config();
    let tb = SimTestbed::new(&options(Fault::BackupDown, BackupReporting::Inline)).unwrap();
    let err = scenario::run(&tb.dut(), &tb.ate(), tb.gribi(), &cfg).unwrap_err();
    match err.verify_error() {
        Some(VerifyError::TrafficLoss { flow, loss }) => {
            assert_eq!(flow, "BaseFlow");
            assert_eq!(*loss, 100.0);
        }
        e => panic!("unexpected error: {:?}", e),
    }
    assert_clean(&tb);
}

#[test]
fn test_no_backup() {
    let cfg = fast_config();
    let tb = SimTestbed::new(&options(Fault::NoBackup, BackupReporting::Inline)).unwrap();
    let err = scenario::run(&tb.dut(), &tb.ate(), tb.gribi(), &cfg).unwrap_err();
    assert_eq!(err.verify_error(), Some(&VerifyError::NoBackupSwitch(cfg.prefix)));
    assert_eq!(
        err.to_string(),
        "Verification failed: Prefix 203.0.113.0/24 reachability didn't switch to backup path"
    );
    assert_clean(&tb);
}

#[test]
fn test_prefix_not_in_aft() {
    // the AFT lags behind for much longer than the watch waits
    let cfg = fast_config();
    let opts = SimOptions {
        aft_delay: std::time::Duration::from_secs(60),
        ..SimOptions::default()
    };
    let tb = SimTestbed::new(&opts).unwrap();
    let err = scenario::run(&tb.dut(), &tb.ate(), tb.gribi(), &cfg).unwrap_err();
    assert_eq!(err.verify_error(), Some(&VerifyError::PrefixNotInAft(cfg.prefix)));
    assert_clean(&tb);
}

#[test]
fn test_unknown_network_instance() {
    let cfg = ScenarioConfig {
        network_instance: "VRF-A".to_string(),
        ..fast_config()
    };
    let tb = testbed();
    let err = scenario::run(&tb.dut(), &tb.ate(), tb.gribi(), &cfg).unwrap_err();
    assert!(matches!(err, Error::Failover(_)), "unexpected error: {}", err);
    assert_clean(&tb);
}

#[test]
fn test_custom_network_instance() {
    let cfg = ScenarioConfig {
        network_instance: "default".to_string(),
        ..fast_config()
    };
    let opts = SimOptions {
        network_instance: "default".to_string(),
        ..SimOptions::default()
    };
    let report = run_simulated(&cfg, &opts).unwrap();
    assert_eq!(report.phases.len(), 3);
}

#[test]
fn test_fib_ack_scenario() {
    let cfg = ScenarioConfig {
        fib_ack: true,
        ..fast_config()
    };
    run_simulated(&cfg, &SimOptions::default()).unwrap();
}
