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

//! # OTG Controller

use crate::monitor::*;
use crate::types::Config;
use crate::{Error, Result};

use isahc::prelude::*;
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// # OTG Controller Handle
#[derive(Debug, PartialEq, Clone)]
pub struct OtgApi {
    address: String,
    version: Version,
}

impl OtgApi {
    /// Create a new handle and check that the controller is reachable, by requesting its version.
    pub fn new(address: impl AsRef<str>, port: u32) -> Result<Self> {
        let address = format!("http://{}:{}", address.as_ref(), port);
        let version_addr = format!("{}/capabilities/version", address);
        let version: Version = serde_json::from_str(&handle_response(isahc::get(&version_addr)?)?)?;
        info!("Connected to OTG controller {} (API {})", address, version.api_spec_version);
        Ok(Self { address, version })
    }

    /// Version of the controller
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Push a new configuration, replacing the current one
    pub fn set_config(&self, config: &Config) -> Result<()> {
        self.request_post("config", serde_json::to_string(config)?)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Result<Config> {
        Ok(serde_json::from_str(&self.request_get("config")?)?)
    }

    /// Start all protocols
    pub fn start_protocols(&self) -> Result<()> {
        self.control(ControlRequest::protocols(ControlState::Start))
    }

    /// Stop all protocols
    pub fn stop_protocols(&self) -> Result<()> {
        self.control(ControlRequest::protocols(ControlState::Stop))
    }

    /// Start transmitting all flows
    pub fn start_traffic(&self) -> Result<()> {
        self.control(ControlRequest::traffic(ControlState::Start))
    }

    /// Stop transmitting all flows
    pub fn stop_traffic(&self) -> Result<()> {
        self.control(ControlRequest::traffic(ControlState::Stop))
    }

    fn control(&self, request: ControlRequest) -> Result<()> {
        self.request_post("control/state", serde_json::to_string(&request)?)?;
        Ok(())
    }

    /// Get the metrics of the given flows (of all flows if `flow_names` is empty)
    pub fn flow_metrics(&self, flow_names: &[String]) -> Result<Vec<FlowMetric>> {
        let request = MetricsRequest::Flow {
            flow: FlowMetricsRequest {
                flow_names: flow_names.to_vec(),
            },
        };
        match self.post_json("monitor/metrics", &request)? {
            MetricsResponse::FlowMetrics { flow_metrics } => Ok(flow_metrics),
            MetricsResponse::PortMetrics { .. } => Ok(Vec::new()),
        }
    }

    /// Get the metrics of the given ports (of all ports if `port_names` is empty)
    pub fn port_metrics(&self, port_names: &[String]) -> Result<Vec<PortMetric>> {
        let request = MetricsRequest::Port {
            port: PortMetricsRequest {
                port_names: port_names.to_vec(),
            },
        };
        match self.post_json("monitor/metrics", &request)? {
            MetricsResponse::PortMetrics { port_metrics } => Ok(port_metrics),
            MetricsResponse::FlowMetrics { .. } => Ok(Vec::new()),
        }
    }

    /// Get the IPv4 neighbors learned on the given ethernet interfaces
    pub fn ipv4_neighbors(&self, ethernet_names: &[String]) -> Result<Vec<Ipv4Neighbor>> {
        let request = StatesRequest::Ipv4Neighbors {
            ipv4_neighbors: Ipv4NeighborsRequest {
                ethernet_names: ethernet_names.to_vec(),
            },
        };
        let StatesResponse::Ipv4Neighbors { ipv4_neighbors } =
            self.post_json("monitor/states", &request)?;
        Ok(ipv4_neighbors)
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(&self, key: &str, request: &T) -> Result<R> {
        Ok(serde_json::from_str(&self.request_post(key, serde_json::to_string(request)?)?)?)
    }

    fn request_get(&self, key: impl AsRef<str>) -> Result<String> {
        let addr = format!("{}/{}", self.address, key.as_ref());
        trace!("GET  {}", addr);
        handle_response(isahc::get(&addr)?)
    }

    fn request_post(&self, key: impl AsRef<str>, data: String) -> Result<String> {
        let addr = format!("{}/{}", self.address, key.as_ref());
        trace!("POST {} {}", addr, data);
        let request = Request::post(&addr)
            .header("Content-Type", "application/json")
            .body(data)?;
        handle_response(request.send()?)
    }
}

fn handle_response(mut response: Response<Body>) -> Result<String> {
    let status = response.status();
    let text = response.text()?;
    if status.is_success() {
        return Ok(text);
    }
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(Error::OtgError {
            code: body.code,
            kind: body.kind,
            errors: body.errors,
        }),
        Err(_) => Err(Error::ResponseError(status.as_u16(), text)),
    }
}
