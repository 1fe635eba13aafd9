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

//! # Runtime System
//!
//! This system configures the device under test and the traffic generator, injects the
//! forwarding state via gRIBI and performs the backup next-hop-group scenario, while checking the
//! AFT telemetry and the traffic loss after every step. For simplified usage, check the function
//! [`run_simulated`].

#![deny(missing_docs, missing_debug_implementations)]

pub mod checks;
pub mod client;
pub mod configure;
mod error;
pub mod guard;
pub mod metrics;
pub mod otg_ate;
pub mod params;
pub mod report;
pub mod scenario;
pub mod sim;
pub mod testbed;
pub mod watch;

pub use error::Error;

use params::ScenarioConfig;
use report::ScenarioReport;
use sim::{SimOptions, SimTestbed};

use log::*;

/// # Run the scenario on the simulated testbed
///
/// This function does the following:
///
/// 1. Build the simulated DUT and wire its four ports to the traffic generator
/// 2. Configure the DUT interfaces and the emulated devices on the traffic generator, and wait
///    until the first port has resolved its gateway
/// 3. Become the primary gRIBI client, flush all entries and inject the backup group, the primary
///    group and the prefix
/// 4. For each phase, disable the next port, check the AFT and send traffic, which must arrive
///    without any loss
///
/// Afterwards, the gRIBI entries are removed and all ports are enabled again.
pub fn run_simulated(cfg: &ScenarioConfig, options: &SimOptions) -> Result<ScenarioReport, Error> {
    let testbed = SimTestbed::new(options)?;
    let dut = testbed.dut();
    let ate = testbed.ate();
    let result = scenario::run(&dut, &ate, testbed.gribi(), cfg);
    match result.as_ref() {
        Ok(r) => info!("Scenario passed all {} phases", r.phases.len()),
        Err(e) => error!("Scenario failed: {}", e),
    }
    result
}

#[cfg(test)]
mod test;
