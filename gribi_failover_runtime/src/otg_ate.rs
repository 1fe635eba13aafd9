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

//! Traffic generator behind an OTG controller

use crate::testbed::Ate;
use crate::Error;

use otg::{FlowMetric, Ipv4Neighbor, OtgApi, PortMetric};

/// # OTG traffic generator
///
/// The logical port `portN` is mapped to the N-th location.
#[derive(Debug, Clone)]
pub struct OtgAte {
    api: OtgApi,
    locations: Vec<String>,
}

impl OtgAte {
    /// Connect to the controller at `host:port`.
    pub fn new(host: impl AsRef<str>, port: u32, locations: Vec<String>) -> Result<Self, Error> {
        Ok(Self {
            api: OtgApi::new(host, port)?,
            locations,
        })
    }

    /// The controller handle
    pub fn api(&self) -> &OtgApi {
        &self.api
    }
}

/// Index of a logical port, starting at 0 (`port1` -> 0).
fn port_index(port: &str) -> Option<usize> {
    port.strip_prefix("port")?
        .parse::<usize>()
        .ok()?
        .checked_sub(1)
}

impl Ate for OtgAte {
    fn port(&self, port: &str) -> Result<String, Error> {
        port_index(port)
            .and_then(|i| self.locations.get(i))
            .cloned()
            .ok_or_else(|| Error::UnknownPort(port.to_string()))
    }

    fn push_config(&self, config: &otg::Config) -> Result<(), Error> {
        Ok(self.api.set_config(config)?)
    }

    fn start_protocols(&self) -> Result<(), Error> {
        Ok(self.api.start_protocols()?)
    }

    fn start_traffic(&self) -> Result<(), Error> {
        Ok(self.api.start_traffic()?)
    }

    fn stop_traffic(&self) -> Result<(), Error> {
        Ok(self.api.stop_traffic()?)
    }

    fn flow_metrics(&self, flow_names: &[String]) -> Result<Vec<FlowMetric>, Error> {
        Ok(self.api.flow_metrics(flow_names)?)
    }

    fn port_metrics(&self, port_names: &[String]) -> Result<Vec<PortMetric>, Error> {
        Ok(self.api.port_metrics(port_names)?)
    }

    fn ipv4_neighbors(&self, ethernet_names: &[String]) -> Result<Vec<Ipv4Neighbor>, Error> {
        Ok(self.api.ipv4_neighbors(ethernet_names)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logical_ports() {
        assert_eq!(port_index("port1"), Some(0));
        assert_eq!(port_index("port4"), Some(3));
        assert_eq!(port_index("port0"), None);
        assert_eq!(port_index("eth1"), None);
    }

    #[test]
    fn connect() {
        let ate = match OtgAte::new("localhost", 8443, vec!["eth1".to_string()]) {
            Ok(a) => a,
            Err(_) => return, // skip the test
        };
        assert_eq!(ate.port("port1").unwrap(), "eth1");
        assert!(matches!(ate.port("port2"), Err(Error::UnknownPort(_))));
    }
}
