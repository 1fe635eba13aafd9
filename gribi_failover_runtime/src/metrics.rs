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

//! Logging of traffic generator metrics

use itertools::Itertools;
use log::*;
use otg::{FlowMetric, PortMetric};

/// Format the flow metrics as a table
pub fn flow_table(metrics: &[FlowMetric]) -> String {
    let rows = metrics.iter().map(|m| {
        let loss = m
            .loss_pct()
            .map(|l| format!("{:.2}", l))
            .unwrap_or_else(|| "-".to_string());
        format!("{:<16} {:>12} {:>12} {:>8}", m.name, m.frames_tx, m.frames_rx, loss)
    });
    let header = format!("{:<16} {:>12} {:>12} {:>8}", "Flow", "Tx Frames", "Rx Frames", "Loss %");
    std::iter::once(header).chain(rows).join("\n")
}

/// Format the port metrics as a table
pub fn port_table(metrics: &[PortMetric]) -> String {
    let rows = metrics
        .iter()
        .map(|m| format!("{:<16} {:>12} {:>12}", m.name, m.frames_tx, m.frames_rx));
    std::iter::once(format!("{:<16} {:>12} {:>12}", "Port", "Tx Frames", "Rx Frames"))
        .chain(rows)
        .join("\n")
}

/// Log the flow metrics
pub fn log_flow_metrics(metrics: &[FlowMetric]) {
    info!("Flow metrics:\n{}", flow_table(metrics));
}

/// Log the port metrics
pub fn log_port_metrics(metrics: &[PortMetric]) {
    info!("Port metrics:\n{}", port_table(metrics));
}
