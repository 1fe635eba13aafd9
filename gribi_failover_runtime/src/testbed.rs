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

//! # Testbed
//!
//! Seams towards the device under test and the traffic generator. All functions take `&self`,
//! since the cleanup guards hold references to the same handles as the test phases.
//! Implementations with mutable state use interior mutability.

use crate::Error;

use gribi_failover::aft::{AftIpv4Entry, AftNextHop, AftNextHopGroup};
use gribi_failover::config::ConfigModifier;
use gribi_failover::types::{Ipv4Prefix, NextHopId, NhgId};
use otg::{FlowMetric, Ipv4Neighbor, PortMetric};

/// # Device under test
pub trait Dut {
    /// Name of the device
    fn name(&self) -> String;

    /// Interface name of a logical port (e.g., `port1`)
    fn port(&self, port: &str) -> Result<String, Error>;

    /// Apply a configuration modifier (replace or update an interface)
    fn apply(&self, modifier: &ConfigModifier) -> Result<(), Error>;

    /// AFT IPv4 entry of a prefix, if present
    fn aft_ipv4_entry(
        &self,
        network_instance: &str,
        prefix: &Ipv4Prefix,
    ) -> Result<Option<AftIpv4Entry>, Error>;

    /// AFT next-hop-group, if present
    fn aft_next_hop_group(
        &self,
        network_instance: &str,
        id: NhgId,
    ) -> Result<Option<AftNextHopGroup>, Error>;

    /// AFT next hop, if present
    fn aft_next_hop(
        &self,
        network_instance: &str,
        index: NextHopId,
    ) -> Result<Option<AftNextHop>, Error>;
}

/// # Traffic generator
pub trait Ate {
    /// Location of a logical port (e.g., `port1`) on the traffic generator
    fn port(&self, port: &str) -> Result<String, Error>;

    /// Push a configuration, replacing the current one
    fn push_config(&self, config: &otg::Config) -> Result<(), Error>;

    /// Start all protocols
    fn start_protocols(&self) -> Result<(), Error>;

    /// Start transmitting all flows
    fn start_traffic(&self) -> Result<(), Error>;

    /// Stop transmitting all flows
    fn stop_traffic(&self) -> Result<(), Error>;

    /// Metrics of the given flows
    fn flow_metrics(&self, flow_names: &[String]) -> Result<Vec<FlowMetric>, Error>;

    /// Metrics of the given ports
    fn port_metrics(&self, port_names: &[String]) -> Result<Vec<PortMetric>, Error>;

    /// IPv4 neighbors learned on the given ethernet interfaces
    fn ipv4_neighbors(&self, ethernet_names: &[String]) -> Result<Vec<Ipv4Neighbor>, Error>;
}
