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

//! # Checks
//!
//! Verification steps executed in every phase: the AFT check on the DUT telemetry and the traffic
//! check on the traffic generator. Both fetch the data through the testbed seams and apply the
//! rules of [`gribi_failover::verify`].

use crate::metrics;
use crate::params::ScenarioConfig;
use crate::testbed::{Ate, Dut};
use crate::watch::await_value;
use crate::Error;

use gribi_failover::config::ConfigModifier;
use gribi_failover::types::NhgId;
use gribi_failover::verify::{
    check_loss, check_next_hop_address, check_next_hop_group, NhgResolution, VerifyError,
};
use log::*;
use otg::Ipv4Neighbor;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

/// What the AFT check has observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AftObservation {
    /// Next-hop-group the prefix points to
    pub next_hop_group: NhgId,
    /// The group lists no next hop, only the reference to its backup group
    pub relies_on_backup: bool,
    /// Addresses of all next hops of the group
    pub next_hops: Vec<Ipv4Addr>,
}

/// What the traffic check has observed
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficObservation {
    /// Transmitted frames of the flow
    pub frames_tx: u64,
    /// Received frames of the flow
    pub frames_rx: u64,
    /// Loss of the flow in percent
    pub loss: f32,
    /// Received frames per port of the traffic generator
    pub port_rx: BTreeMap<String, u64>,
}

/// Check that the prefix is installed in the AFT of the DUT, and that all of its next hops have
/// an address of the `expected` set. A group without next hops passes only if it references a
/// backup group.
pub fn aft_check(
    dut: &dyn Dut,
    cfg: &ScenarioConfig,
    expected: &BTreeSet<Ipv4Addr>,
) -> Result<AftObservation, Error> {
    let ni = cfg.network_instance.as_str();
    let prefix = cfg.prefix;

    let nhg_id = await_value(cfg.timing.aft_timeout, cfg.timing.poll_interval, || {
        let entry = dut.aft_ipv4_entry(ni, &prefix)?;
        Ok(entry.and_then(|e| e.next_hop_group))
    })?
    .ok_or(VerifyError::PrefixNotInAft(prefix))?;
    debug!("{} points to NHG {}", prefix, nhg_id);

    let nhg = dut
        .aft_next_hop_group(ni, nhg_id)?
        .ok_or(VerifyError::NextHopGroupMissing(nhg_id))?;
    let members = match check_next_hop_group(prefix, &nhg)? {
        NhgResolution::Members(members) => members,
        NhgResolution::Backup(backup) => {
            info!("NHG {} has no next hop, but references backup NHG {}", nhg_id, backup);
            return Ok(AftObservation {
                next_hop_group: nhg_id,
                relies_on_backup: true,
                next_hops: Vec::new(),
            });
        }
    };

    let mut next_hops = Vec::with_capacity(members.len());
    for index in members {
        let nh = dut
            .aft_next_hop(ni, index)?
            .ok_or(VerifyError::NextHopMissing(index))?;
        let address = check_next_hop_address(prefix, &nh, expected)?;
        debug!("NH {} of NHG {} has address {}", index, nhg_id, address);
        next_hops.push(address);
    }
    info!("{} uses next hops {:?} via NHG {}", prefix, next_hops, nhg_id);
    Ok(AftObservation {
        next_hop_group: nhg_id,
        relies_on_backup: false,
        next_hops,
    })
}

/// Send traffic for the dwell time, and check the loss of `flow`. With `drop` set, all frames
/// must be lost. Otherwise, no frame may be lost.
pub fn validate_traffic_flows(
    ate: &dyn Ate,
    cfg: &ScenarioConfig,
    flow: &str,
    drop: bool,
) -> Result<TrafficObservation, Error> {
    info!("Sending traffic for {} seconds", cfg.timing.dwell.as_secs_f64());
    ate.start_traffic()?;
    thread::sleep(cfg.timing.dwell);
    ate.stop_traffic()?;

    let flow_metrics = ate.flow_metrics(&[flow.to_string()])?;
    metrics::log_flow_metrics(&flow_metrics);
    let port_names: Vec<String> = cfg
        .topology
        .links
        .iter()
        .map(|l| l.ate.name.clone())
        .collect();
    let port_metrics = ate.port_metrics(&port_names)?;
    metrics::log_port_metrics(&port_metrics);

    let metric = flow_metrics
        .iter()
        .find(|m| m.name == flow)
        .ok_or_else(|| VerifyError::FlowMetricsMissing(flow.to_string()))?;
    let loss = metric
        .loss_pct()
        .ok_or_else(|| VerifyError::FlowMetricsMissing(flow.to_string()))?;
    check_loss(flow, loss, drop)?;

    Ok(TrafficObservation {
        frames_tx: metric.frames_tx,
        frames_rx: metric.frames_rx,
        loss,
        port_rx: port_metrics
            .into_iter()
            .map(|m| (m.name, m.frames_rx))
            .collect(),
    })
}

/// Set the administrative state of the DUT interface of a logical port. Does not wait for any
/// convergence.
pub fn flap_interface(dut: &dyn Dut, port: &str, enabled: bool) -> Result<(), Error> {
    let iface = dut.port(port)?;
    let action = if enabled { "Enabling" } else { "Disabling" };
    info!("{} {} ({}) on {}", action, port, iface, dut.name());
    dut.apply(&ConfigModifier::set_enabled(iface, enabled))
}

/// Wait until the ethernet interface of the traffic generator has resolved at least one IPv4
/// neighbor. Returns all resolved neighbors.
pub fn wait_otg_arp_entry(
    ate: &dyn Ate,
    ethernet: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Vec<Ipv4Neighbor>, Error> {
    let names = vec![ethernet.to_string()];
    let neighbors = await_value(timeout, interval, || {
        let resolved: Vec<Ipv4Neighbor> = ate
            .ipv4_neighbors(&names)?
            .into_iter()
            .filter(|n| n.ethernet_name == ethernet && n.link_layer_address.is_some())
            .collect();
        Ok(if resolved.is_empty() { None } else { Some(resolved) })
    })?;
    match neighbors {
        Some(n) => {
            info!("{} resolved {} IPv4 neighbor(s)", ethernet, n.len());
            Ok(n)
        }
        None => Err(Error::ArpTimeout {
            ethernet: ethernet.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
    }
}
