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

//! # Lab
//!
//! The lab wires the ports of the simulated device to the ports of a simulated traffic
//! generator, and forwards the frames of the configured flows through the device.

use crate::netsim::forwarding_state::Lookup;
use crate::netsim::{Device, DeviceError};
use crate::types::MacAddr;

use log::*;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Instant;

/// Minimum number of frames sent per flow and traffic run, independent of the run time.
pub const MIN_FRAMES: u64 = 1000;

/// Default rate of a flow in packets per second
pub const DEFAULT_RATE_PPS: u64 = 1000;

/// Endpoint in the lab
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Endpoint {
    /// Interface of the device under test
    Dut(String),
    /// Port of the traffic generator
    Tester(String),
}

/// Physical link between two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    carrier: bool,
}

/// Emulated device on a port of the traffic generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesterPort {
    /// Name of the port
    pub name: String,
    /// Hardware address
    pub mac: MacAddr,
    /// IPv4 address
    pub ipv4: Ipv4Addr,
    /// IPv4 prefix length
    pub prefix_length: u8,
    /// Default gateway
    pub gateway: Ipv4Addr,
}

/// Flow transmitted by the traffic generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    /// Name of the flow
    pub name: String,
    /// Port on which the flow is transmitted
    pub tx_port: String,
    /// Source MAC address
    pub src_mac: MacAddr,
    /// Destination MAC address
    pub dst_mac: MacAddr,
    /// Source IPv4 address
    pub src_ip: Ipv4Addr,
    /// Destination IPv4 address
    pub dst_ip: Ipv4Addr,
    /// Rate in packets per second
    pub rate_pps: u64,
}

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Transmitted frames
    pub frames_tx: u64,
    /// Received frames
    pub frames_rx: u64,
}

impl Counters {
    /// Loss in percent, or `None` if nothing was transmitted
    pub fn loss_pct(&self) -> Option<f32> {
        if self.frames_tx == 0 {
            None
        } else {
            let lost = self.frames_tx.saturating_sub(self.frames_rx);
            Some(lost as f32 * 100.0 / self.frames_tx as f32)
        }
    }
}

/// # Lab
///
/// The device under test, a traffic generator and the links between them. The links form an
/// undirected graph, where every node is either an interface of the device or a port of the
/// traffic generator.
#[derive(Debug)]
pub struct Lab {
    dut: Device,
    graph: UnGraph<Endpoint, Link>,
    nodes: BTreeMap<Endpoint, NodeIndex>,
    tester_ports: BTreeMap<String, TesterPort>,
    neighbors: BTreeMap<String, BTreeMap<Ipv4Addr, MacAddr>>,
    protocols_running: bool,
    flows: Vec<FlowSpec>,
    flow_counters: BTreeMap<String, Counters>,
    port_counters: BTreeMap<String, Counters>,
    traffic_started: Option<Instant>,
    rng: StdRng,
}

impl Lab {
    /// Create a new lab with the given device. The seed drives the choice of the next hop for
    /// every frame.
    pub fn new(dut: Device, seed: u64) -> Self {
        Self {
            dut,
            graph: UnGraph::new_undirected(),
            nodes: BTreeMap::new(),
            tester_ports: BTreeMap::new(),
            neighbors: BTreeMap::new(),
            protocols_running: false,
            flows: Vec::new(),
            flow_counters: BTreeMap::new(),
            port_counters: BTreeMap::new(),
            traffic_started: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The device under test
    pub fn dut(&self) -> &Device {
        &self.dut
    }

    /// Mutable reference to the device under test
    pub fn dut_mut(&mut self) -> &mut Device {
        &mut self.dut
    }

    fn node(&mut self, endpoint: Endpoint) -> NodeIndex {
        if let Some(idx) = self.nodes.get(&endpoint) {
            return *idx;
        }
        let idx = self.graph.add_node(endpoint.clone());
        self.nodes.insert(endpoint, idx);
        idx
    }

    /// Connect a port of the device (e.g., `port1`) with a port of the traffic generator.
    pub fn connect(&mut self, dut_port: &str, tester_port: &str) -> Result<(), DeviceError> {
        let iface = self.dut.port(dut_port)?.to_string();
        let a = self.node(Endpoint::Dut(iface));
        let b = self.node(Endpoint::Tester(tester_port.to_string()));
        if self.graph.neighbors(a).next().is_some() || self.graph.neighbors(b).next().is_some() {
            return Err(DeviceError::AlreadyWired(dut_port.to_string()));
        }
        self.graph.add_edge(a, b, Link { carrier: true });
        debug!("Connected {} ({}) with {}", dut_port, self.dut.port(dut_port)?, tester_port);
        Ok(())
    }

    /// Set the carrier of the link attached to a port of the device.
    pub fn set_link_carrier(&mut self, dut_port: &str, carrier: bool) -> Result<(), DeviceError> {
        let iface = self.dut.port(dut_port)?.to_string();
        let a = *self
            .nodes
            .get(&Endpoint::Dut(iface.clone()))
            .ok_or_else(|| DeviceError::NotWired(dut_port.to_string()))?;
        let edge = self
            .graph
            .edges(a)
            .next()
            .map(|e| e.id())
            .ok_or_else(|| DeviceError::NotWired(dut_port.to_string()))?;
        if let Some(link) = self.graph.edge_weight_mut(edge) {
            link.carrier = carrier;
        }
        info!("Link on {} is {}", dut_port, if carrier { "up" } else { "down" });
        self.dut.set_carrier(&iface, carrier)
    }

    /// Peer of an endpoint, if the link has a carrier.
    fn peer(&self, endpoint: &Endpoint) -> Option<&Endpoint> {
        let idx = *self.nodes.get(endpoint)?;
        let edge = self.graph.edges(idx).next()?;
        if !edge.weight().carrier {
            return None;
        }
        let (a, b) = self.graph.edge_endpoints(edge.id())?;
        let other = if a == idx { b } else { a };
        self.graph.node_weight(other)
    }

    /// Replace the configuration of the traffic generator. This stops the protocols and removes
    /// all learned neighbors and counters.
    pub fn set_tester_config(&mut self, ports: Vec<TesterPort>, flows: Vec<FlowSpec>) {
        self.tester_ports = ports.into_iter().map(|p| (p.name.clone(), p)).collect();
        self.flows = flows;
        self.neighbors.clear();
        self.protocols_running = false;
        self.flow_counters.clear();
        self.port_counters.clear();
        self.traffic_started = None;
    }

    /// Configured ports of the traffic generator
    pub fn tester_ports(&self) -> impl Iterator<Item = &TesterPort> {
        self.tester_ports.values()
    }

    /// Configured flows
    pub fn flows(&self) -> &[FlowSpec] {
        &self.flows
    }

    /// Start the protocols: every port resolves the hardware address of its gateway.
    pub fn start_protocols(&mut self) {
        self.protocols_running = true;
        self.resolve_neighbors();
    }

    /// Stop all protocols
    pub fn stop_protocols(&mut self) {
        self.protocols_running = false;
        self.neighbors.clear();
    }

    fn resolve_neighbors(&mut self) {
        let mut learned = BTreeMap::new();
        for port in self.tester_ports.values() {
            let mut table = BTreeMap::new();
            if let Some(Endpoint::Dut(iface)) = self.peer(&Endpoint::Tester(port.name.clone())) {
                if let Ok(i) = self.dut.interface(iface) {
                    if i.oper_up() && i.ipv4() == Some(port.gateway) {
                        trace!("{} resolved {} to {}", port.name, port.gateway, i.mac());
                        table.insert(port.gateway, i.mac());
                    }
                }
            }
            learned.insert(port.name.clone(), table);
        }
        self.neighbors = learned;
    }

    /// IPv4 neighbors learned by a port of the traffic generator
    pub fn ipv4_neighbors(&mut self, port: &str) -> Result<Vec<(Ipv4Addr, MacAddr)>, DeviceError> {
        if !self.tester_ports.contains_key(port) {
            return Err(DeviceError::UnknownTesterPort(port.to_string()));
        }
        if self.protocols_running {
            self.resolve_neighbors();
        }
        Ok(self
            .neighbors
            .get(port)
            .map(|t| t.iter().map(|(ip, mac)| (*ip, *mac)).collect())
            .unwrap_or_default())
    }

    /// Start transmitting all flows. All counters are reset.
    pub fn start_traffic(&mut self) {
        self.flow_counters = self
            .flows
            .iter()
            .map(|f| (f.name.clone(), Counters::default()))
            .collect();
        self.port_counters = self
            .tester_ports
            .keys()
            .map(|p| (p.clone(), Counters::default()))
            .collect();
        self.traffic_started = Some(Instant::now());
        info!("Traffic started with {} flows", self.flows.len());
    }

    /// Stop transmitting. Every flow sends `rate * elapsed` frames (at least [`MIN_FRAMES`]),
    /// which are forwarded through the device under test based on its current forwarding state.
    pub fn stop_traffic(&mut self) {
        let started = match self.traffic_started.take() {
            Some(s) => s,
            None => return,
        };
        let elapsed = started.elapsed().as_secs_f64();
        for flow in self.flows.clone() {
            let frames = ((flow.rate_pps as f64 * elapsed) as u64).max(MIN_FRAMES);
            for _ in 0..frames {
                self.transmit(&flow);
            }
            debug!("Flow {} sent {} frames", flow.name, frames);
        }
        info!("Traffic stopped");
    }

    /// Send a single frame of the flow. Returns the port on which it was received.
    fn transmit(&mut self, flow: &FlowSpec) -> Option<String> {
        self.port_counters
            .entry(flow.tx_port.clone())
            .or_default()
            .frames_tx += 1;
        self.flow_counters
            .entry(flow.name.clone())
            .or_default()
            .frames_tx += 1;

        let rx_port = self.forward(flow)?;
        self.port_counters
            .entry(rx_port.clone())
            .or_default()
            .frames_rx += 1;
        self.flow_counters
            .entry(flow.name.clone())
            .or_default()
            .frames_rx += 1;
        Some(rx_port)
    }

    fn forward(&mut self, flow: &FlowSpec) -> Option<String> {
        let ingress = match self.peer(&Endpoint::Tester(flow.tx_port.clone()))? {
            Endpoint::Dut(iface) => iface.clone(),
            Endpoint::Tester(_) => return None,
        };
        let ingress_iface = self.dut.interface(&ingress).ok()?;
        if !ingress_iface.oper_up() || ingress_iface.mac() != flow.dst_mac {
            return None;
        }

        let (egress, next_hop) = match self.dut.forwarding_state().lookup(flow.dst_ip) {
            Lookup::Drop => return None,
            Lookup::Connected(iface) => (iface.to_string(), flow.dst_ip),
            Lookup::Forward(entry) => {
                let dist = WeightedIndex::new(entry.next_hops.iter().map(|nh| nh.weight)).ok()?;
                let nh = &entry.next_hops[dist.sample(&mut self.rng)];
                (nh.interface.clone(), nh.address)
            }
        };

        match self.peer(&Endpoint::Dut(egress))? {
            Endpoint::Tester(port) => {
                let p = self.tester_ports.get(port)?;
                if p.ipv4 == next_hop {
                    Some(port.clone())
                } else {
                    None
                }
            }
            Endpoint::Dut(_) => None,
        }
    }

    /// Counters of a flow from the last traffic run
    pub fn flow_counters(&self, flow: &str) -> Option<Counters> {
        self.flow_counters.get(flow).copied()
    }

    /// Counters of a port of the traffic generator from the last traffic run
    pub fn port_counters(&self, port: &str) -> Option<Counters> {
        self.port_counters.get(port).copied()
    }
}
