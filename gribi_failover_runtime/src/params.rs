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

//! # Scenario parameters
//!
//! Immutable description of the testbed addressing, the injected entries and the timing. The
//! [`Default`] implementation reproduces the backup next-hop-group scenario.

use gribi_failover::attrs::PortAttributes;
use gribi_failover::gribi::{Persistence, DEFAULT_NETWORK_INSTANCE};
use gribi_failover::types::{Ipv4Prefix, MacAddr, NextHopId, NhgId};

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// ID of the primary next-hop-group
pub const NHG_ID: NhgId = 100;
/// ID of the backup next-hop-group
pub const BACKUP_NHG_ID: NhgId = 200;
/// Next hop towards ATE port 2
pub const NH1_ID: NextHopId = 1001;
/// Next hop towards ATE port 3
pub const NH2_ID: NextHopId = 1002;
/// Next hop towards ATE port 4 (backup)
pub const NH3_ID: NextHopId = 1003;
/// Weight of the next hop towards ATE port 2
pub const NH1_WEIGHT: u64 = 80;
/// Weight of the next hop towards ATE port 3
pub const NH2_WEIGHT: u64 = 20;
/// Weight of the backup next hop
pub const NH3_WEIGHT: u64 = 10;
/// Injected prefix
pub const PREFIX: Ipv4Prefix = Ipv4Prefix::new_saturating(Ipv4Addr::new(203, 0, 113, 0), 24);
/// Name of the flow
pub const FLOW_NAME: &str = "BaseFlow";
/// Number of ports on both the DUT and the traffic generator
pub const NUM_PORTS: usize = 4;

/// Both ends of one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttributes {
    /// Logical port name (e.g., `port1`), identical on both sides
    pub port: String,
    /// Attributes of the DUT side
    pub dut: PortAttributes,
    /// Attributes of the traffic generator side
    pub ate: PortAttributes,
}

/// Addressing of the testbed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// All links, ordered by port number
    pub links: Vec<LinkAttributes>,
}

impl Topology {
    /// Get the link of a logical port
    pub fn link(&self, port: &str) -> Option<&LinkAttributes> {
        self.links.iter().find(|l| l.port == port)
    }
}

impl Default for Topology {
    fn default() -> Self {
        let links = (1..=NUM_PORTS as u8)
            .map(|i| {
                let base = 4 * (i - 1);
                let dut_v6 = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0x192, 0, 2, (base + 1) as u16);
                let ate_v6 = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0x192, 0, 2, (base + 2) as u16);
                LinkAttributes {
                    port: format!("port{}", i),
                    dut: PortAttributes {
                        name: format!("dutPort{}", i),
                        desc: format!("dutPort{}", i),
                        mac: None,
                        ipv4: Ipv4Addr::new(192, 0, 2, base + 1),
                        ipv4_len: 30,
                        ipv6: dut_v6,
                        ipv6_len: 126,
                    },
                    ate: PortAttributes {
                        name: format!("atePort{}", i),
                        desc: format!("atePort{}", i),
                        mac: Some(MacAddr([0x02, 0x00, i, 0x01, 0x01, 0x01])),
                        ipv4: Ipv4Addr::new(192, 0, 2, base + 2),
                        ipv4_len: 30,
                        ipv6: ate_v6,
                        ipv6_len: 126,
                    },
                }
            })
            .collect();
        Self { links }
    }
}

/// Timing of the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Upper bound for the prefix to show up in the AFT
    pub aft_timeout: Duration,
    /// Time traffic is sent in every phase
    pub dwell: Duration,
    /// Upper bound for the traffic generator to resolve its gateway
    pub arp_timeout: Duration,
    /// Interval between two polls of a watch
    pub poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            aft_timeout: Duration::from_secs(10),
            dwell: Duration::from_secs(60),
            arp_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// One phase of the scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    /// Name of the phase
    pub name: String,
    /// Port to shut down before the checks
    pub shutdown: Option<String>,
    /// Addresses of the next hops the prefix may use
    pub expected_next_hops: BTreeSet<Ipv4Addr>,
    /// Whether the traffic is expected to be dropped entirely
    pub drop: bool,
}

/// # Scenario configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Addressing of the testbed
    pub topology: Topology,
    /// Destination prefix injected via gRIBI
    pub prefix: Ipv4Prefix,
    /// Name of the default network instance on the DUT
    pub network_instance: String,
    /// Request RIB and FIB acknowledgements
    pub fib_ack: bool,
    /// Persistence of the gRIBI entries
    pub persistence: Persistence,
    /// Timing
    pub timing: Timing,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            topology: Topology::default(),
            prefix: PREFIX,
            network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
            fib_ack: false,
            persistence: Persistence::Preserve,
            timing: Timing::default(),
        }
    }
}

impl ScenarioConfig {
    /// Address of the traffic generator on a logical port
    pub fn ate_ipv4(&self, port: &str) -> Option<Ipv4Addr> {
        self.topology.link(port).map(|l| l.ate.ipv4)
    }

    /// The three phases: both primaries up, port 2 down, and port 3 down.
    pub fn phases(&self) -> Vec<Phase> {
        let addrs = |ports: &[&str]| ports.iter().filter_map(|p| self.ate_ipv4(p)).collect();
        vec![
            Phase {
                name: "primaries up".to_string(),
                shutdown: None,
                expected_next_hops: addrs(&["port2", "port3"]),
                drop: false,
            },
            Phase {
                name: "port2 down".to_string(),
                shutdown: Some("port2".to_string()),
                expected_next_hops: addrs(&["port3"]),
                drop: false,
            },
            Phase {
                name: "port3 down".to_string(),
                shutdown: Some("port3".to_string()),
                expected_next_hops: addrs(&["port4"]),
                drop: false,
            },
        ]
    }
}
