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

#[cfg(test)]
mod test_scenario;

use crate::params::{ScenarioConfig, Timing};
use crate::sim::{SimOptions, SimTestbed};

use std::time::Duration;

/// Scenario configuration without any waiting
fn fast_config() -> ScenarioConfig {
    ScenarioConfig {
        timing: Timing {
            aft_timeout: Duration::from_millis(50),
            dwell: Duration::from_millis(1),
            arp_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
        },
        ..ScenarioConfig::default()
    }
}

fn testbed() -> SimTestbed {
    SimTestbed::new(&SimOptions::default()).unwrap()
}
