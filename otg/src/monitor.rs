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

//! # OTG Control, Metrics and States

use serde::{Deserialize, Serialize};

/// State to set with a control request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// Start
    Start,
    /// Stop
    Stop,
}

/// Control request, sent to `/control/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum ControlRequest {
    /// Protocol state
    Protocol {
        /// Protocol control
        protocol: ProtocolControl,
    },
    /// Traffic state
    Traffic {
        /// Traffic control
        traffic: TrafficControl,
    },
}

/// Control of all protocols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolControl {
    /// Always `all`
    pub choice: String,
    /// State of all protocols
    pub all: StateValue,
}

/// Control of the flow transmission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficControl {
    /// Always `flow_transmit`
    pub choice: String,
    /// Transmit state
    pub flow_transmit: FlowTransmit,
}

/// Transmit state of a set of flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTransmit {
    /// New state
    pub state: ControlState,
    /// Flows to control. If empty, all flows are affected.
    #[serde(default)]
    pub flow_names: Vec<String>,
}

/// Single state value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateValue {
    /// New state
    pub state: ControlState,
}

impl ControlRequest {
    /// Start or stop all protocols
    pub fn protocols(state: ControlState) -> Self {
        Self::Protocol {
            protocol: ProtocolControl {
                choice: "all".to_string(),
                all: StateValue { state },
            },
        }
    }

    /// Start or stop the transmission of all flows
    pub fn traffic(state: ControlState) -> Self {
        Self::Traffic {
            traffic: TrafficControl {
                choice: "flow_transmit".to_string(),
                flow_transmit: FlowTransmit {
                    state,
                    flow_names: Vec::new(),
                },
            },
        }
    }
}

/// Metrics request, sent to `/monitor/metrics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum MetricsRequest {
    /// Metrics of flows
    Flow {
        /// Selected flows
        flow: FlowMetricsRequest,
    },
    /// Metrics of ports
    Port {
        /// Selected ports
        port: PortMetricsRequest,
    },
}

/// Selection of flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetricsRequest {
    /// Names of the flows. If empty, all flows are returned.
    #[serde(default)]
    pub flow_names: Vec<String>,
}

/// Selection of ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMetricsRequest {
    /// Names of the ports. If empty, all ports are returned.
    #[serde(default)]
    pub port_names: Vec<String>,
}

/// Metrics response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum MetricsResponse {
    /// Metrics of flows
    FlowMetrics {
        /// one entry per flow
        #[serde(default)]
        flow_metrics: Vec<FlowMetric>,
    },
    /// Metrics of ports
    PortMetrics {
        /// one entry per port
        #[serde(default)]
        port_metrics: Vec<PortMetric>,
    },
}

/// Metrics of a single flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMetric {
    /// Name of the flow
    pub name: String,
    /// Transmit state (e.g., `started` or `stopped`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmit: Option<String>,
    /// Transmitted frames
    #[serde(default)]
    pub frames_tx: u64,
    /// Received frames
    #[serde(default)]
    pub frames_rx: u64,
    /// Loss in percent, as reported by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f32>,
}

impl FlowMetric {
    /// Loss in percent. Uses the value reported by the controller, or computes it from the frame
    /// counters. Returns `None` if nothing was transmitted.
    pub fn loss_pct(&self) -> Option<f32> {
        match self.loss {
            Some(l) => Some(l),
            None if self.frames_tx == 0 => None,
            None => {
                let lost = self.frames_tx.saturating_sub(self.frames_rx);
                Some(lost as f32 * 100.0 / self.frames_tx as f32)
            }
        }
    }
}

/// Metrics of a single port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMetric {
    /// Name of the port
    pub name: String,
    /// Transmitted frames
    #[serde(default)]
    pub frames_tx: u64,
    /// Received frames
    #[serde(default)]
    pub frames_rx: u64,
}

/// States request, sent to `/monitor/states`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum StatesRequest {
    /// IPv4 neighbors of ethernet interfaces
    Ipv4Neighbors {
        /// Selected interfaces
        ipv4_neighbors: Ipv4NeighborsRequest,
    },
}

/// Selection of ethernet interfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4NeighborsRequest {
    /// Names of the ethernet interfaces. If empty, all interfaces are returned.
    #[serde(default)]
    pub ethernet_names: Vec<String>,
}

/// States response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum StatesResponse {
    /// IPv4 neighbors
    Ipv4Neighbors {
        /// all learned neighbors
        #[serde(default)]
        ipv4_neighbors: Vec<Ipv4Neighbor>,
    },
}

/// IPv4 neighbor learned on an ethernet interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Neighbor {
    /// Name of the ethernet interface
    pub ethernet_name: String,
    /// Address of the neighbor
    pub ipv4_address: String,
    /// Hardware address of the neighbor, if resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_layer_address: Option<String>,
}

/// Version information, returned by `/capabilities/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version of the API specification
    #[serde(default)]
    pub api_spec_version: String,
    /// Version of the SDK
    #[serde(default)]
    pub sdk_version: String,
    /// Version of the application
    #[serde(default)]
    pub app_version: String,
}

/// Error body of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: i32,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_requests() {
        assert_eq!(
            serde_json::to_value(ControlRequest::protocols(ControlState::Start)).unwrap(),
            json!({"choice": "protocol", "protocol": {"choice": "all", "all": {"state": "start"}}})
        );
        assert_eq!(
            serde_json::to_value(ControlRequest::traffic(ControlState::Stop)).unwrap(),
            json!({"choice": "traffic", "traffic": {
                "choice": "flow_transmit",
                "flow_transmit": {"state": "stop", "flow_names": []}
            }})
        );
    }

    #[test]
    fn metrics_request() {
        let req = MetricsRequest::Flow {
            flow: FlowMetricsRequest {
                flow_names: vec!["BaseFlow".to_string()],
            },
        };
        assert_eq!(
            serde_json::to_value(req).unwrap(),
            json!({"choice": "flow", "flow": {"flow_names": ["BaseFlow"]}})
        );
    }

    #[test]
    fn flow_metrics_response() {
        let resp: MetricsResponse = serde_json::from_value(json!({
            "choice": "flow_metrics",
            "flow_metrics": [
                {"name": "BaseFlow", "transmit": "stopped", "frames_tx": 1000, "frames_rx": 1000, "loss": 0.0},
                {"name": "Other", "frames_tx": 200, "frames_rx": 150}
            ]
        }))
        .unwrap();
        match resp {
            MetricsResponse::FlowMetrics { flow_metrics } => {
                assert_eq!(flow_metrics[0].loss_pct(), Some(0.0));
                assert_eq!(flow_metrics[1].loss_pct(), Some(25.0));
            }
            r => panic!("unexpected response: {:?}", r),
        }
    }

    #[test]
    fn loss_without_traffic() {
        let m = FlowMetric {
            name: "f".to_string(),
            transmit: None,
            frames_tx: 0,
            frames_rx: 0,
            loss: None,
        };
        assert_eq!(m.loss_pct(), None);
    }

    #[test]
    fn neighbors_response() {
        let resp: StatesResponse = serde_json::from_value(json!({
            "choice": "ipv4_neighbors",
            "ipv4_neighbors": [
                {"ethernet_name": "atePort1.Eth", "ipv4_address": "192.0.2.1", "link_layer_address": "02:1a:00:01:00:01"},
                {"ethernet_name": "atePort2.Eth", "ipv4_address": "192.0.2.5"}
            ]
        }))
        .unwrap();
        let StatesResponse::Ipv4Neighbors { ipv4_neighbors } = resp;
        assert_eq!(ipv4_neighbors[0].link_layer_address.as_deref(), Some("02:1a:00:01:00:01"));
        assert_eq!(ipv4_neighbors[1].link_layer_address, None);
    }

    #[test]
    fn error_body() {
        let text = r#"{"code": 400, "kind": "validation", "errors": ["bad flow"]}"#;
        let body: ErrorBody = serde_json::from_str(text).unwrap();
        assert_eq!(body.code, 400);
        assert_eq!(body.errors, vec!["bad flow".to_string()]);
    }
}
