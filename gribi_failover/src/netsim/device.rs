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

//! # Simulated Device
//!
//! A device under test with a number of physical ports, a gRIBI server and AFT telemetry. Every
//! change to the configuration, the RIB or the link state recomputes the forwarding state and
//! the AFT. The AFT can be configured to lag behind the forwarding state, to model the delay
//! until telemetry reflects a change.

use crate::aft::{Aft, AftIpv4Entry, AftNextHop, AftNextHopGroup};
use crate::config::{ConfigModifier, InterfaceConfig};
use crate::gribi::{
    ElectionId, GribiError, Operation, OperationResult, SessionParameters,
    DEFAULT_NETWORK_INSTANCE,
};
use crate::netsim::forwarding_state::ForwardingState;
use crate::netsim::interface::Interface;
use crate::netsim::printer;
use crate::netsim::rib::Rib;
use crate::netsim::DeviceError;
use crate::types::{MacAddr, NextHopId};

use log::*;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// How a next-hop-group whose members are all unresolved shows up in the AFT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupReporting {
    /// The group lists the next hops of its backup group, which are used for forwarding.
    Inline,
    /// The group lists no next hop, only the reference to its backup group.
    Reference,
}

/// # Device
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    network_instance: String,
    ports: BTreeMap<String, String>,
    interfaces: BTreeMap<String, Interface>,
    rib: Rib,
    reporting: BackupReporting,
    use_backup: bool,
    aft_delay: Duration,
    forwarding_state: ForwardingState,
    aft: Aft,
    previous_aft: Aft,
    changed_at: Instant,
}

impl Device {
    /// Create a device with `num_ports` ports, named `port1` to `portN`, which are mapped to the
    /// interfaces `Ethernet1` to `EthernetN`. The interfaces are enabled, but have no address.
    pub fn new(name: impl Into<String>, num_ports: u8) -> Self {
        Self::with_network_instance(name, num_ports, DEFAULT_NETWORK_INSTANCE)
    }

    /// Create a device whose default network instance has a different name.
    pub fn with_network_instance(
        name: impl Into<String>,
        num_ports: u8,
        network_instance: impl Into<String>,
    ) -> Self {
        let network_instance = network_instance.into();
        let mut ports = BTreeMap::new();
        let mut interfaces = BTreeMap::new();
        for i in 1..=num_ports {
            let iface = format!("Ethernet{}", i);
            ports.insert(format!("port{}", i), iface.clone());
            interfaces.insert(
                iface.clone(),
                Interface::new(InterfaceConfig::new(iface), MacAddr::local(1, i)),
            );
        }
        let mut device = Self {
            name: name.into(),
            rib: Rib::new(vec![network_instance.clone()]),
            network_instance,
            ports,
            interfaces,
            reporting: BackupReporting::Inline,
            use_backup: true,
            aft_delay: Duration::from_secs(0),
            forwarding_state: ForwardingState::default(),
            aft: Aft::new(),
            previous_aft: Aft::new(),
            changed_at: Instant::now(),
        };
        device.refresh();
        device
    }

    /// Set how groups relying on their backup are reported in the AFT
    pub fn set_backup_reporting(&mut self, reporting: BackupReporting) {
        self.reporting = reporting;
        self.refresh();
    }

    /// Set the delay until the AFT reflects a change
    pub fn set_aft_delay(&mut self, delay: Duration) {
        self.aft_delay = delay;
    }

    /// Disable support for backup next-hop-groups. The device accepts backup references, but
    /// neither uses nor reports them.
    pub fn disable_backup(&mut self) {
        self.use_backup = false;
        self.refresh();
    }

    /// Name of the device
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the default network instance
    pub fn network_instance(&self) -> &str {
        &self.network_instance
    }

    /// Interface name of a logical port (e.g., `port1`)
    pub fn port(&self, port: &str) -> Result<&str, DeviceError> {
        self.ports
            .get(port)
            .map(|s| s.as_str())
            .ok_or_else(|| DeviceError::UnknownPort(port.to_string()))
    }

    /// Get an interface by its name
    pub fn interface(&self, name: &str) -> Result<&Interface, DeviceError> {
        self.interfaces
            .get(name)
            .ok_or_else(|| DeviceError::UnknownInterface(name.to_string()))
    }

    /// Iterate over all interfaces
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    /// Apply a configuration modifier
    pub fn apply(&mut self, modifier: &ConfigModifier) -> Result<(), DeviceError> {
        let iface = self
            .interfaces
            .get_mut(modifier.interface())
            .ok_or_else(|| DeviceError::UnknownInterface(modifier.interface().to_string()))?;
        match modifier {
            ConfigModifier::Replace(c) => {
                if let Some(a) = c.ipv4 {
                    if a.prefix_length > 32 {
                        return Err(DeviceError::InvalidConfig(modifier.to_string()));
                    }
                }
                if let Some(a) = c.ipv6 {
                    if a.prefix_length > 128 {
                        return Err(DeviceError::InvalidConfig(modifier.to_string()));
                    }
                }
                iface.replace(c.clone())
            }
            ConfigModifier::Update(p) => iface.update(p),
        }
        info!("{}: {}", self.name, modifier);
        self.refresh();
        Ok(())
    }

    /// Set the carrier of an interface (link up or down).
    pub fn set_carrier(&mut self, interface: &str, carrier: bool) -> Result<(), DeviceError> {
        self.interfaces
            .get_mut(interface)
            .ok_or_else(|| DeviceError::UnknownInterface(interface.to_string()))?
            .set_carrier(carrier);
        self.refresh();
        Ok(())
    }

    /// The gRIBI RIB
    pub fn rib(&self) -> &Rib {
        &self.rib
    }

    /// Establish a gRIBI session
    pub fn gribi_connect(&mut self, params: SessionParameters) -> Result<(), GribiError> {
        self.rib.connect(params)
    }

    /// Take part in the gRIBI election
    pub fn gribi_elect(&mut self, election_id: ElectionId) -> Result<ElectionId, GribiError> {
        self.rib.elect(election_id)
    }

    /// Modify the gRIBI entries
    pub fn gribi_modify(
        &mut self,
        election_id: ElectionId,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, GribiError> {
        let interfaces = &self.interfaces;
        let reachable = |addr: Ipv4Addr| interfaces.values().any(|i| i.reaches(addr));
        let result = self.rib.modify(election_id, operations, reachable);
        self.refresh();
        result
    }

    /// Flush gRIBI entries
    pub fn gribi_flush(
        &mut self,
        election_id: ElectionId,
        network_instance: Option<&str>,
    ) -> Result<(), GribiError> {
        let result = self.rib.flush(election_id, network_instance);
        self.refresh();
        result
    }

    /// Tear down the gRIBI session
    pub fn gribi_disconnect(&mut self) -> Result<(), GribiError> {
        let result = self.rib.disconnect();
        self.refresh();
        result
    }

    /// Current forwarding state of the default network instance
    pub fn forwarding_state(&self) -> &ForwardingState {
        &self.forwarding_state
    }

    /// The AFT of a network instance, as currently visible via telemetry.
    pub fn aft(&self, network_instance: &str) -> Result<&Aft, DeviceError> {
        if network_instance != self.network_instance {
            return Err(DeviceError::UnknownNetworkInstance(network_instance.to_string()));
        }
        if self.changed_at.elapsed() >= self.aft_delay {
            Ok(&self.aft)
        } else {
            Ok(&self.previous_aft)
        }
    }

    /// Recompute the forwarding state and the AFT.
    fn refresh(&mut self) {
        let rib = self.rib.instance(&self.network_instance);
        self.forwarding_state = ForwardingState::new(&self.interfaces, rib, self.use_backup);
        let aft = self.build_aft();
        if aft != self.aft {
            let visible = if self.changed_at.elapsed() >= self.aft_delay {
                &self.aft
            } else {
                &self.previous_aft
            };
            self.previous_aft = visible.clone();
            self.aft = aft;
            self.changed_at = Instant::now();
            debug!(
                "{}: AFT changed:\n    {}",
                self.name,
                printer::aft_table(&self.aft).join("\n    ")
            );
            trace!(
                "{}: forwarding state:\n    {}",
                self.name,
                printer::forwarding_table(&self.forwarding_state).join("\n    ")
            );
        }
    }

    fn build_aft(&self) -> Aft {
        let mut aft = Aft::new();
        let rib = match self.rib.instance(&self.network_instance) {
            Some(rib) => rib,
            None => return aft,
        };
        let resolve = |idx: &NextHopId| {
            rib.next_hops()
                .get(idx)
                .map(|nh| self.interfaces.values().any(|i| i.reaches(nh.ip_address)))
                .unwrap_or(false)
        };

        for (idx, nh) in rib.next_hops() {
            let interface = self
                .interfaces
                .values()
                .find(|i| i.reaches(nh.ip_address))
                .map(|i| i.name().to_string());
            aft.next_hops.insert(
                *idx,
                AftNextHop {
                    index: *idx,
                    ip_address: Some(nh.ip_address),
                    interface,
                },
            );
        }

        for (id, nhg) in rib.next_hop_groups() {
            let backup = if self.use_backup { nhg.backup_next_hop_group } else { None };
            let mut next_hops: BTreeMap<NextHopId, u64> = nhg
                .next_hops
                .iter()
                .filter(|(idx, _)| resolve(*idx))
                .map(|(i, w)| (*i, *w))
                .collect();
            if next_hops.is_empty() && self.reporting == BackupReporting::Inline {
                if let Some(b) = backup.and_then(|b| rib.next_hop_groups().get(&b)) {
                    next_hops = b
                        .next_hops
                        .iter()
                        .filter(|(idx, _)| resolve(*idx))
                        .map(|(i, w)| (*i, *w))
                        .collect();
                }
            }
            aft.next_hop_groups.insert(
                *id,
                AftNextHopGroup {
                    id: *id,
                    next_hops,
                    backup_next_hop_group: backup,
                },
            );
        }

        for (prefix, e) in rib.ipv4_entries() {
            aft.ipv4_entries.insert(
                *prefix,
                AftIpv4Entry {
                    prefix: *prefix,
                    next_hop_group: Some(e.next_hop_group),
                    next_hop_group_network_instance: Some(
                        e.next_hop_group_network_instance.clone(),
                    ),
                },
            );
        }

        aft
    }
}
