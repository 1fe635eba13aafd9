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

//! # OTG Configuration Types

use serde::{Deserialize, Serialize};

/// Complete configuration of the traffic generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Test ports
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Emulated devices
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Traffic flows
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl Config {
    /// Empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port and return a mutable reference to it
    pub fn add_port(&mut self, name: impl Into<String>, location: Option<String>) -> &mut Port {
        self.ports.push(Port {
            name: name.into(),
            location,
        });
        let idx = self.ports.len() - 1;
        &mut self.ports[idx]
    }

    /// Add an emulated device and return a mutable reference to it
    pub fn add_device(&mut self, name: impl Into<String>) -> &mut Device {
        self.devices.push(Device {
            name: name.into(),
            ethernets: Vec::new(),
        });
        let idx = self.devices.len() - 1;
        &mut self.devices[idx]
    }

    /// Add a flow and return a mutable reference to it
    pub fn add_flow(&mut self, flow: Flow) -> &mut Flow {
        self.flows.push(flow);
        let idx = self.flows.len() - 1;
        &mut self.flows[idx]
    }

    /// Get a flow by its name
    pub fn flow(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }

    /// Get an ethernet interface by its name, across all devices
    pub fn ethernet(&self, name: &str) -> Option<&DeviceEthernet> {
        self.devices
            .iter()
            .flat_map(|d| d.ethernets.iter())
            .find(|e| e.name == name)
    }
}

/// Test port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Name of the port
    pub name: String,
    /// Location of the port on the chassis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Emulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Name of the device
    pub name: String,
    /// Ethernet interfaces
    #[serde(default)]
    pub ethernets: Vec<DeviceEthernet>,
}

impl Device {
    /// Add an ethernet interface connected to the given port
    pub fn add_ethernet(
        &mut self,
        name: impl Into<String>,
        port_name: impl Into<String>,
        mac: impl Into<String>,
    ) -> &mut DeviceEthernet {
        self.ethernets.push(DeviceEthernet {
            name: name.into(),
            connection: EthernetConnection::port(port_name),
            mac: mac.into(),
            mtu: None,
            ipv4_addresses: Vec::new(),
            ipv6_addresses: Vec::new(),
        });
        let idx = self.ethernets.len() - 1;
        &mut self.ethernets[idx]
    }
}

/// Ethernet interface of an emulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEthernet {
    /// Name of the interface
    pub name: String,
    /// Port the interface is connected to
    pub connection: EthernetConnection,
    /// MAC address
    pub mac: String,
    /// MTU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// IPv4 addresses
    #[serde(default)]
    pub ipv4_addresses: Vec<DeviceIpv4>,
    /// IPv6 addresses
    #[serde(default)]
    pub ipv6_addresses: Vec<DeviceIpv6>,
}

impl DeviceEthernet {
    /// Add an IPv4 address
    pub fn add_ipv4(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
        gateway: impl Into<String>,
        prefix: u8,
    ) -> &mut Self {
        self.ipv4_addresses.push(DeviceIpv4 {
            name: name.into(),
            address: address.into(),
            gateway: gateway.into(),
            prefix,
        });
        self
    }

    /// Add an IPv6 address
    pub fn add_ipv6(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
        gateway: impl Into<String>,
        prefix: u8,
    ) -> &mut Self {
        self.ipv6_addresses.push(DeviceIpv6 {
            name: name.into(),
            address: address.into(),
            gateway: gateway.into(),
            prefix,
        });
        self
    }
}

/// Connection of an ethernet interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetConnection {
    /// Kind of connection, always `port_name`
    pub choice: String,
    /// Name of the port
    pub port_name: String,
}

impl EthernetConnection {
    /// Connection to a test port
    pub fn port(port_name: impl Into<String>) -> Self {
        Self {
            choice: "port_name".to_string(),
            port_name: port_name.into(),
        }
    }
}

/// IPv4 address of an emulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIpv4 {
    /// Name of the address
    pub name: String,
    /// Address
    pub address: String,
    /// Default gateway
    pub gateway: String,
    /// Prefix length
    pub prefix: u8,
}

/// IPv6 address of an emulated device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIpv6 {
    /// Name of the address
    pub name: String,
    /// Address
    pub address: String,
    /// Default gateway
    pub gateway: String,
    /// Prefix length
    pub prefix: u8,
}

/// Traffic flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Name of the flow
    pub name: String,
    /// Transmit and receive endpoints
    pub tx_rx: FlowTxRx,
    /// Headers of the packets, outermost first
    #[serde(default)]
    pub packet: Vec<FlowHeader>,
    /// Metrics collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FlowMetricsConfig>,
    /// Transmit rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<FlowRate>,
    /// Transmit duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<FlowDuration>,
}

impl Flow {
    /// New flow transmitted on the given port, with metrics enabled. The flow is sent
    /// continuously at the default rate, and has no headers yet.
    pub fn new(name: impl Into<String>, tx_port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tx_rx: FlowTxRx {
                choice: "port".to_string(),
                port: FlowPort {
                    tx_name: tx_port.into(),
                    rx_names: Vec::new(),
                },
            },
            packet: Vec::new(),
            metrics: Some(FlowMetricsConfig { enable: true }),
            rate: None,
            duration: Some(FlowDuration {
                choice: "continuous".to_string(),
            }),
        }
    }

    /// Add an ethernet header
    pub fn ethernet(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.packet.push(FlowHeader {
            choice: "ethernet".to_string(),
            ethernet: Some(FlowEthernet {
                src: PatternValue::value(src),
                dst: PatternValue::value(dst),
            }),
            ipv4: None,
        });
        self
    }

    /// Add an IPv4 header
    pub fn ipv4(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.packet.push(FlowHeader {
            choice: "ipv4".to_string(),
            ethernet: None,
            ipv4: Some(FlowIpv4 {
                src: PatternValue::value(src),
                dst: PatternValue::value(dst),
            }),
        });
        self
    }

    /// Set the rate in packets per second
    pub fn pps(mut self, pps: u64) -> Self {
        self.rate = Some(FlowRate {
            choice: "pps".to_string(),
            pps: Some(pps),
        });
        self
    }

    /// Ethernet header of the flow
    pub fn ethernet_header(&self) -> Option<&FlowEthernet> {
        self.packet.iter().find_map(|h| h.ethernet.as_ref())
    }

    /// IPv4 header of the flow
    pub fn ipv4_header(&self) -> Option<&FlowIpv4> {
        self.packet.iter().find_map(|h| h.ipv4.as_ref())
    }
}

/// Transmit and receive endpoints of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTxRx {
    /// Kind of endpoints, always `port`
    pub choice: String,
    /// Port endpoints
    pub port: FlowPort,
}

/// Port endpoints of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPort {
    /// Transmit port
    pub tx_name: String,
    /// Receive ports. If empty, all ports receive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rx_names: Vec<String>,
}

/// Packet header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowHeader {
    /// Kind of header
    pub choice: String,
    /// Ethernet header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<FlowEthernet>,
    /// IPv4 header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<FlowIpv4>,
}

/// Ethernet header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEthernet {
    /// Source MAC address
    pub src: PatternValue,
    /// Destination MAC address
    pub dst: PatternValue,
}

/// IPv4 header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowIpv4 {
    /// Source address
    pub src: PatternValue,
    /// Destination address
    pub dst: PatternValue,
}

/// Fixed value of a header field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternValue {
    /// Kind of pattern, always `value`
    pub choice: String,
    /// The value
    pub value: String,
}

impl PatternValue {
    /// Fixed value
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            choice: "value".to_string(),
            value: value.into(),
        }
    }
}

/// Metrics collection of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetricsConfig {
    /// Enable metrics
    pub enable: bool,
}

/// Transmit rate of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRate {
    /// Kind of rate (e.g., `pps`)
    pub choice: String,
    /// Packets per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pps: Option<u64>,
}

/// Transmit duration of a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDuration {
    /// Kind of duration (e.g., `continuous`)
    pub choice: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_device() {
        let mut config = Config::new();
        config.add_port("atePort1", None);
        config
            .add_device("atePort1")
            .add_ethernet("atePort1.Eth", "atePort1", "02:00:01:01:01:01")
            .add_ipv4("atePort1.IPv4", "192.0.2.2", "192.0.2.1", 30);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "ports": [{"name": "atePort1"}],
                "devices": [{
                    "name": "atePort1",
                    "ethernets": [{
                        "name": "atePort1.Eth",
                        "connection": {"choice": "port_name", "port_name": "atePort1"},
                        "mac": "02:00:01:01:01:01",
                        "ipv4_addresses": [{
                            "name": "atePort1.IPv4",
                            "address": "192.0.2.2",
                            "gateway": "192.0.2.1",
                            "prefix": 30
                        }],
                        "ipv6_addresses": []
                    }]
                }],
                "flows": []
            })
        );
        assert_eq!(config.ethernet("atePort1.Eth").unwrap().ipv4_addresses[0].prefix, 30);
    }

    #[test]
    fn serialize_flow() {
        let flow = Flow::new("BaseFlow", "atePort1")
            .ethernet("02:00:01:01:01:01", "02:1a:00:01:00:01")
            .ipv4("192.0.2.2", "203.0.113.0");
        assert_eq!(
            serde_json::to_value(&flow).unwrap(),
            json!({
                "name": "BaseFlow",
                "tx_rx": {"choice": "port", "port": {"tx_name": "atePort1"}},
                "packet": [
                    {"choice": "ethernet", "ethernet": {
                        "src": {"choice": "value", "value": "02:00:01:01:01:01"},
                        "dst": {"choice": "value", "value": "02:1a:00:01:00:01"}
                    }},
                    {"choice": "ipv4", "ipv4": {
                        "src": {"choice": "value", "value": "192.0.2.2"},
                        "dst": {"choice": "value", "value": "203.0.113.0"}
                    }}
                ],
                "metrics": {"enable": true},
                "duration": {"choice": "continuous"}
            })
        );
        assert_eq!(flow.ipv4_header().unwrap().dst.value, "203.0.113.0");
    }

    #[test]
    fn deserialize_config() {
        let config: Config = serde_json::from_str(
            r#"{"ports": [{"name": "p1", "location": "eth1"}], "flows": [{"name": "f",
                "tx_rx": {"choice": "port", "port": {"tx_name": "p1", "rx_names": ["p2"]}},
                "rate": {"choice": "pps", "pps": 100}}]}"#,
        )
        .unwrap();
        assert_eq!(config.ports[0].location.as_deref(), Some("eth1"));
        assert!(config.devices.is_empty());
        let flow = config.flow("f").unwrap();
        assert_eq!(flow.tx_rx.port.rx_names, vec!["p2".to_string()]);
        assert_eq!(flow.rate.as_ref().unwrap().pps, Some(100));
        assert!(flow.ethernet_header().is_none());
    }
}
