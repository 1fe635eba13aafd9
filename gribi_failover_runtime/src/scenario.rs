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

//! # Backup next-hop-group scenario
//!
//! Configures the testbed, injects the entries via gRIBI and runs all phases in order. Every
//! phase builds on the link state left by the previous one. On every exit path, the gRIBI entries
//! are flushed, the session is closed, and the disabled ports are enabled again (in this order).

use crate::checks::{aft_check, flap_interface, validate_traffic_flows, wait_otg_arp_entry};
use crate::client::{Client, NhgOptions};
use crate::configure::{configure_ate, configure_dut, create_flow, learned_mac};
use crate::guard::{LinkRestorer, SessionGuard};
use crate::params::*;
use crate::report::{PhaseReport, ScenarioReport};
use crate::testbed::{Ate, Dut};
use crate::Error;

use gribi_failover::gribi::GribiSession;
use log::*;
use maplit::btreemap;

/// Run the scenario. Returns the report if all checks of all phases pass, and the first failure
/// otherwise.
pub fn run<S: GribiSession>(
    dut: &dyn Dut,
    ate: &dyn Ate,
    session: S,
    cfg: &ScenarioConfig,
) -> Result<ScenarioReport, Error> {
    let first = cfg
        .topology
        .link("port1")
        .ok_or_else(|| Error::UnknownPort("port1".to_string()))?;

    configure_dut(dut, cfg)?;
    let mut top = configure_ate(ate, cfg)?;
    let neighbors = wait_otg_arp_entry(
        ate,
        &first.ate.eth_name(),
        cfg.timing.arp_timeout,
        cfg.timing.poll_interval,
    )?;
    let dst_mac = learned_mac(&neighbors, first.dut.ipv4)?;

    let restorer = LinkRestorer::new(dut);
    let client = Client::new(session, cfg.fib_ack, cfg.persistence);
    client.start()?;
    let _session = SessionGuard::new(&client);

    client.become_leader()?;
    client.flush_all()?;
    program_entries(&client, cfg)?;

    create_flow(ate, &mut top, cfg, dst_mac)?;

    let mut phases = Vec::new();
    for phase in cfg.phases() {
        info!("Phase: {}", phase.name);
        if let Some(port) = phase.shutdown.as_deref() {
            restorer.record(port);
            flap_interface(dut, port, false)?;
        }
        let aft = aft_check(dut, cfg, &phase.expected_next_hops)?;
        let traffic = validate_traffic_flows(ate, cfg, FLOW_NAME, phase.drop)?;
        info!("Phase {} passed (loss: {}%)", phase.name, traffic.loss);
        phases.push(PhaseReport::new(phase.name, aft, traffic));
    }

    Ok(ScenarioReport {
        prefix: cfg.prefix,
        phases,
    })
}

/// Program the backup group, then the primary group referencing it, and finally the prefix.
fn program_entries<S: GribiSession>(client: &Client<S>, cfg: &ScenarioConfig) -> Result<(), Error> {
    let ni = cfg.network_instance.as_str();
    let expected = client.expected_result();
    let ate_ip = |port: &str| {
        cfg.ate_ipv4(port)
            .ok_or_else(|| Error::UnknownPort(port.to_string()))
    };

    client.add_nh(NH3_ID, ate_ip("port4")?, ni, expected)?;
    client.add_nhg(BACKUP_NHG_ID, btreemap! {NH3_ID => NH3_WEIGHT}, ni, expected, None)?;

    client.add_nh(NH1_ID, ate_ip("port2")?, ni, expected)?;
    client.add_nh(NH2_ID, ate_ip("port3")?, ni, expected)?;
    client.add_nhg(
        NHG_ID,
        btreemap! {NH1_ID => NH1_WEIGHT, NH2_ID => NH2_WEIGHT},
        ni,
        expected,
        Some(NhgOptions {
            backup_nhg: Some(BACKUP_NHG_ID),
        }),
    )?;

    client.add_ipv4(cfg.prefix, NHG_ID, ni, ni, expected)?;
    info!("Injected {} via NHG {} (backup NHG {})", cfg.prefix, NHG_ID, BACKUP_NHG_ID);
    Ok(())
}
