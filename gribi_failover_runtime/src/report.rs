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

//! # Scenario report

use crate::checks::{AftObservation, TrafficObservation};
use crate::Error;

use gribi_failover::types::{Ipv4Prefix, NhgId};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;

/// Outcome of a single phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Name of the phase
    pub name: String,
    /// Next-hop-group the prefix points to
    pub next_hop_group: NhgId,
    /// The group only referenced its backup group
    pub relies_on_backup: bool,
    /// Addresses of the observed next hops
    pub next_hops: Vec<Ipv4Addr>,
    /// Transmitted frames of the flow
    pub frames_tx: u64,
    /// Received frames of the flow
    pub frames_rx: u64,
    /// Loss of the flow in percent
    pub loss: f32,
    /// Received frames per port of the traffic generator
    pub port_rx: BTreeMap<String, u64>,
}

impl PhaseReport {
    /// Combine the observations of a phase
    pub fn new(name: impl Into<String>, aft: AftObservation, traffic: TrafficObservation) -> Self {
        Self {
            name: name.into(),
            next_hop_group: aft.next_hop_group,
            relies_on_backup: aft.relies_on_backup,
            next_hops: aft.next_hops,
            frames_tx: traffic.frames_tx,
            frames_rx: traffic.frames_rx,
            loss: traffic.loss,
            port_rx: traffic.port_rx,
        }
    }
}

/// Outcome of a complete scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Injected prefix
    pub prefix: Ipv4Prefix,
    /// All phases, in the order they were executed
    pub phases: Vec<PhaseReport>,
}

impl ScenarioReport {
    /// Write the report as JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn json_report() {
        let aft = AftObservation {
            next_hop_group: 100,
            relies_on_backup: false,
            next_hops: vec![Ipv4Addr::new(192, 0, 2, 10)],
        };
        let traffic = TrafficObservation {
            frames_tx: 1000,
            frames_rx: 1000,
            loss: 0.0,
            port_rx: btreemap! {"atePort3".to_string() => 1000},
        };
        let report = ScenarioReport {
            prefix: "203.0.113.0/24".parse().unwrap(),
            phases: vec![PhaseReport::new("port2 down", aft, traffic)],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["prefix"], "203.0.113.0/24");
        assert_eq!(value["phases"][0]["next_hops"][0], "192.0.2.10");
        assert_eq!(value["phases"][0]["port_rx"]["atePort3"], 1000);
        let back: ScenarioReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }
}
