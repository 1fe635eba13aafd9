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

//! # Simulated testbed
//!
//! Implements the testbed seams on top of a simulated [`Lab`]. The DUT, the traffic generator and
//! the gRIBI session share the same lab, such that configuration changes of the DUT immediately
//! affect the forwarded traffic.

use crate::params::NUM_PORTS;
use crate::testbed::{Ate, Dut};
use crate::Error;

use gribi_failover::aft::{AftIpv4Entry, AftNextHop, AftNextHopGroup};
use gribi_failover::config::ConfigModifier;
use gribi_failover::gribi::*;
use gribi_failover::netsim::lab::{FlowSpec, TesterPort, DEFAULT_RATE_PPS};
use gribi_failover::netsim::{BackupReporting, Device, Lab};
use gribi_failover::types::{Ipv4Prefix, MacAddr, NextHopId, NhgId};
use log::*;
use otg::{FlowMetric, Ipv4Neighbor, PortMetric};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Fault injected into the simulated testbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Everything works as expected
    None,
    /// The link towards the backup next hop has no carrier
    BackupDown,
    /// The DUT ignores backup next-hop-groups
    NoBackup,
}

/// Options of the simulated testbed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOptions {
    /// Seed for the choice of the next hop of every frame
    pub seed: u64,
    /// How the DUT reports groups that rely on their backup
    pub backup_reporting: BackupReporting,
    /// Delay until the AFT of the DUT reflects a change
    pub aft_delay: Duration,
    /// Injected fault
    pub fault: Fault,
    /// Name of the default network instance of the DUT
    pub network_instance: String,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            backup_reporting: BackupReporting::Inline,
            aft_delay: Duration::from_secs(0),
            fault: Fault::None,
            network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
        }
    }
}

/// # Simulated testbed
///
/// A DUT with four ports, wired to the ports `eth1` to `eth4` of a simulated traffic generator.
#[derive(Debug, Clone)]
pub struct SimTestbed {
    lab: Arc<Mutex<Lab>>,
    locations: BTreeMap<String, String>,
}

impl SimTestbed {
    /// Build and wire the testbed
    pub fn new(options: &SimOptions) -> Result<Self, Error> {
        let mut device = Device::with_network_instance(
            "dut",
            NUM_PORTS as u8,
            options.network_instance.as_str(),
        );
        device.set_backup_reporting(options.backup_reporting);
        device.set_aft_delay(options.aft_delay);
        if options.fault == Fault::NoBackup {
            warn!("Backup next-hop-groups are disabled on the DUT");
            device.disable_backup();
        }

        let mut lab = Lab::new(device, options.seed);
        let mut locations = BTreeMap::new();
        for i in 1..=NUM_PORTS {
            let port = format!("port{}", i);
            let location = format!("eth{}", i);
            lab.connect(&port, &location)?;
            locations.insert(port, location);
        }
        if options.fault == Fault::BackupDown {
            warn!("The link on port4 has no carrier");
            lab.set_link_carrier("port4", false)?;
        }

        Ok(Self {
            lab: Arc::new(Mutex::new(lab)),
            locations,
        })
    }

    /// Access the lab
    pub fn lab(&self) -> MutexGuard<'_, Lab> {
        lock(&self.lab)
    }

    /// Handle of the DUT
    pub fn dut(&self) -> SimDut {
        SimDut {
            lab: self.lab.clone(),
        }
    }

    /// Handle of the traffic generator
    pub fn ate(&self) -> SimAte {
        SimAte {
            lab: self.lab.clone(),
            locations: self.locations.clone(),
            config: RefCell::new(otg::Config::new()),
        }
    }

    /// gRIBI session towards the DUT
    pub fn gribi(&self) -> SimGribi {
        SimGribi {
            lab: self.lab.clone(),
        }
    }
}

fn lock(lab: &Mutex<Lab>) -> MutexGuard<'_, Lab> {
    lab.lock().unwrap_or_else(|e| e.into_inner())
}

/// DUT of the simulated testbed
#[derive(Debug, Clone)]
pub struct SimDut {
    lab: Arc<Mutex<Lab>>,
}

impl Dut for SimDut {
    fn name(&self) -> String {
        lock(&self.lab).dut().name().to_string()
    }

    fn port(&self, port: &str) -> Result<String, Error> {
        Ok(lock(&self.lab).dut().port(port)?.to_string())
    }

    fn apply(&self, modifier: &ConfigModifier) -> Result<(), Error> {
        Ok(lock(&self.lab).dut_mut().apply(modifier)?)
    }

    fn aft_ipv4_entry(
        &self,
        network_instance: &str,
        prefix: &Ipv4Prefix,
    ) -> Result<Option<AftIpv4Entry>, Error> {
        let lab = lock(&self.lab);
        Ok(lab.dut().aft(network_instance)?.ipv4_entry(prefix).cloned())
    }

    fn aft_next_hop_group(
        &self,
        network_instance: &str,
        id: NhgId,
    ) -> Result<Option<AftNextHopGroup>, Error> {
        let lab = lock(&self.lab);
        Ok(lab.dut().aft(network_instance)?.next_hop_group(id).cloned())
    }

    fn aft_next_hop(
        &self,
        network_instance: &str,
        index: NextHopId,
    ) -> Result<Option<AftNextHop>, Error> {
        let lab = lock(&self.lab);
        Ok(lab.dut().aft(network_instance)?.next_hop(index).cloned())
    }
}

/// gRIBI session towards the DUT of the simulated testbed
#[derive(Debug, Clone)]
pub struct SimGribi {
    lab: Arc<Mutex<Lab>>,
}

impl GribiSession for SimGribi {
    fn connect(&self, params: &SessionParameters) -> Result<(), GribiError> {
        lock(&self.lab).dut_mut().gribi_connect(*params)
    }

    fn elect(&self, election_id: ElectionId) -> Result<ElectionId, GribiError> {
        lock(&self.lab).dut_mut().gribi_elect(election_id)
    }

    fn modify(
        &self,
        election_id: ElectionId,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, GribiError> {
        lock(&self.lab)
            .dut_mut()
            .gribi_modify(election_id, operations)
    }

    fn flush(
        &self,
        election_id: ElectionId,
        network_instance: Option<&str>,
    ) -> Result<(), GribiError> {
        lock(&self.lab)
            .dut_mut()
            .gribi_flush(election_id, network_instance)
    }

    fn disconnect(&self) -> Result<(), GribiError> {
        lock(&self.lab).dut_mut().gribi_disconnect()
    }
}

/// Traffic generator of the simulated testbed. The pushed OTG configuration is translated into
/// ports and flows of the lab, where the location of an OTG port names the port in the lab.
#[derive(Debug)]
pub struct SimAte {
    lab: Arc<Mutex<Lab>>,
    locations: BTreeMap<String, String>,
    config: RefCell<otg::Config>,
}

impl SimAte {
    /// Location of an OTG port
    fn location(&self, config: &otg::Config, port_name: &str) -> Result<String, Error> {
        config
            .ports
            .iter()
            .find(|p| p.name == port_name)
            .and_then(|p| p.location.clone())
            .ok_or_else(|| Error::InvalidAteConfig(format!("Port {} has no location", port_name)))
    }

    fn translate(&self, config: &otg::Config) -> Result<(Vec<TesterPort>, Vec<FlowSpec>), Error> {
        let mut ports = Vec::new();
        for eth in config.devices.iter().flat_map(|d| d.ethernets.iter()) {
            let location = self.location(config, &eth.connection.port_name)?;
            let ip = eth
                .ipv4_addresses
                .first()
                .ok_or_else(|| {
                    Error::InvalidAteConfig(format!("{} has no IPv4 address", eth.name))
                })?;
            ports.push(TesterPort {
                name: location,
                mac: eth.mac.parse()?,
                ipv4: parse_ip(&ip.address)?,
                prefix_length: ip.prefix,
                gateway: parse_ip(&ip.gateway)?,
            });
        }

        let mut flows = Vec::new();
        for flow in config.flows.iter() {
            let eth = flow
                .ethernet_header()
                .ok_or_else(|| {
                    Error::InvalidAteConfig(format!("Flow {} has no ethernet header", flow.name))
                })?;
            let ip = flow
                .ipv4_header()
                .ok_or_else(|| {
                    Error::InvalidAteConfig(format!("Flow {} has no IPv4 header", flow.name))
                })?;
            flows.push(FlowSpec {
                name: flow.name.clone(),
                tx_port: self.location(config, &flow.tx_rx.port.tx_name)?,
                src_mac: eth.src.value.parse()?,
                dst_mac: eth.dst.value.parse()?,
                src_ip: parse_ip(&ip.src.value)?,
                dst_ip: parse_ip(&ip.dst.value)?,
                rate_pps: flow
                    .rate
                    .as_ref()
                    .and_then(|r| r.pps)
                    .unwrap_or(DEFAULT_RATE_PPS),
            });
        }
        Ok((ports, flows))
    }
}

fn parse_ip(s: &str) -> Result<Ipv4Addr, Error> {
    s.parse()
        .map_err(|_| Error::InvalidAteConfig(format!("Invalid IPv4 address: {}", s)))
}

impl Ate for SimAte {
    fn port(&self, port: &str) -> Result<String, Error> {
        self.locations
            .get(port)
            .cloned()
            .ok_or_else(|| Error::UnknownPort(port.to_string()))
    }

    fn push_config(&self, config: &otg::Config) -> Result<(), Error> {
        let (ports, flows) = self.translate(config)?;
        debug!("Traffic generator config: {} ports, {} flows", ports.len(), flows.len());
        lock(&self.lab).set_tester_config(ports, flows);
        *self.config.borrow_mut() = config.clone();
        Ok(())
    }

    fn start_protocols(&self) -> Result<(), Error> {
        lock(&self.lab).start_protocols();
        Ok(())
    }

    fn start_traffic(&self) -> Result<(), Error> {
        lock(&self.lab).start_traffic();
        Ok(())
    }

    fn stop_traffic(&self) -> Result<(), Error> {
        lock(&self.lab).stop_traffic();
        Ok(())
    }

    fn flow_metrics(&self, flow_names: &[String]) -> Result<Vec<FlowMetric>, Error> {
        let config = self.config.borrow();
        let lab = lock(&self.lab);
        let names: Vec<String> = if flow_names.is_empty() {
            config.flows.iter().map(|f| f.name.clone()).collect()
        } else {
            flow_names
                .iter()
                .filter(|n| config.flow(n).is_some())
                .cloned()
                .collect()
        };
        Ok(names
            .into_iter()
            .map(|name| {
                let c = lab.flow_counters(&name).unwrap_or_default();
                FlowMetric {
                    name,
                    transmit: Some("stopped".to_string()),
                    frames_tx: c.frames_tx,
                    frames_rx: c.frames_rx,
                    loss: c.loss_pct(),
                }
            })
            .collect())
    }

    fn port_metrics(&self, port_names: &[String]) -> Result<Vec<PortMetric>, Error> {
        let config = self.config.borrow();
        let lab = lock(&self.lab);
        config
            .ports
            .iter()
            .filter(|p| port_names.is_empty() || port_names.contains(&p.name))
            .map(|p| -> Result<PortMetric, Error> {
                let location = self.location(&config, &p.name)?;
                let c = lab.port_counters(&location).unwrap_or_default();
                Ok(PortMetric {
                    name: p.name.clone(),
                    frames_tx: c.frames_tx,
                    frames_rx: c.frames_rx,
                })
            })
            .collect()
    }

    fn ipv4_neighbors(&self, ethernet_names: &[String]) -> Result<Vec<Ipv4Neighbor>, Error> {
        let config = self.config.borrow();
        let mut lab = lock(&self.lab);
        let mut result = Vec::new();
        for eth in config.devices.iter().flat_map(|d| d.ethernets.iter()) {
            if !ethernet_names.is_empty() && !ethernet_names.contains(&eth.name) {
                continue;
            }
            let location = self.location(&config, &eth.connection.port_name)?;
            for (ip, mac) in lab.ipv4_neighbors(&location)? {
                result.push(Ipv4Neighbor {
                    ethernet_name: eth.name.clone(),
                    ipv4_address: ip.to_string(),
                    link_layer_address: Some(mac.to_string()),
                });
            }
        }
        Ok(result)
    }
}

/// Hardware address of a DUT port in the simulated testbed
pub fn dut_mac(testbed: &SimTestbed, port: &str) -> Result<MacAddr, Error> {
    let lab = testbed.lab();
    let iface = lab.dut().port(port)?;
    Ok(lab.dut().interface(iface)?.mac())
}
