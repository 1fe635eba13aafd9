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

use gribi_failover::gribi::Persistence;
use gribi_failover::netsim::BackupReporting;
use gribi_failover_runtime::metrics::{log_flow_metrics, log_port_metrics};
use gribi_failover_runtime::otg_ate::OtgAte;
use gribi_failover_runtime::params::{ScenarioConfig, Timing};
use gribi_failover_runtime::run_simulated;
use gribi_failover_runtime::sim::{Fault, SimOptions};
use gribi_failover_runtime::testbed::Ate;

use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use std::error::Error;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Run {
            aft_timeout,
            dwell,
            arp_timeout,
            seed,
            network_instance,
            fib_ack,
            no_persistence,
            backup_reporting,
            aft_delay_ms,
            fault,
            json_filename,
        } => {
            let persistence = if no_persistence {
                Persistence::Delete
            } else {
                Persistence::Preserve
            };
            let cfg = ScenarioConfig {
                network_instance: network_instance.clone(),
                fib_ack,
                persistence,
                timing: Timing {
                    aft_timeout: Duration::from_secs(aft_timeout),
                    dwell: Duration::from_secs(dwell),
                    arp_timeout: Duration::from_secs(arp_timeout),
                    ..Timing::default()
                },
                ..ScenarioConfig::default()
            };
            let options = SimOptions {
                seed,
                backup_reporting: backup_reporting.into(),
                aft_delay: Duration::from_millis(aft_delay_ms),
                fault: fault.into(),
                network_instance,
            };

            let report = run_simulated(&cfg, &options)?;
            for phase in report.phases.iter() {
                info!(
                    "{:<14} NHG {} next hops {:?}{} loss {}%",
                    phase.name,
                    phase.next_hop_group,
                    phase.next_hops,
                    if phase.relies_on_backup { " (backup reference)" } else { "" },
                    phase.loss
                );
            }
            if let Some(filename) = json_filename {
                report.write_json(filename)?;
            }
        }
        MainCommand::OtgMetrics {
            host,
            port,
            locations,
            flows,
        } => {
            let ate = OtgAte::new(host, port, locations)?;
            info!("OTG controller version: {:?}", ate.api().version());
            log_flow_metrics(&ate.flow_metrics(&flows)?);
            log_port_metrics(&ate.port_metrics(&[])?);
        }
    }

    Ok(())
}

/// This is the binary to run the backup next-hop-group scenario. The scenario injects a prefix via
/// gRIBI, disables the links towards the primary next hops one after the other and checks the AFT
/// telemetry and the traffic loss after every step.
#[derive(Parser, Debug)]
#[clap(name = "gRIBI Failover (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Run the scenario on the simulated testbed
    #[clap(name = "run")]
    Run {
        /// Time to wait for the prefix to appear in the AFT, in seconds
        #[clap(long, default_value = "10")]
        aft_timeout: u64,
        /// Time to send traffic in every phase, in seconds
        #[clap(short = 'd', long, default_value = "60")]
        dwell: u64,
        /// Time to wait for the traffic generator to resolve its gateway, in seconds
        #[clap(long, default_value = "60")]
        arp_timeout: u64,
        /// Seed for the choice of the next hop of every frame
        #[clap(short = 's', long, default_value = "42")]
        seed: u64,
        /// Name of the default network instance
        #[clap(short = 'n', long, default_value = "DEFAULT")]
        network_instance: String,
        /// Request RIB and FIB acknowledgements
        #[clap(long)]
        fib_ack: bool,
        /// Remove the entries when the client disconnects
        #[clap(long)]
        no_persistence: bool,
        /// How the DUT reports a group that relies on its backup
        #[clap(long, value_enum, default_value = "inline")]
        backup_reporting: Reporting,
        /// Delay until the AFT reflects a change, in milliseconds
        #[clap(long, default_value = "0")]
        aft_delay_ms: u64,
        /// Fault injected into the testbed
        #[clap(long, value_enum, default_value = "none")]
        fault: FaultArg,
        /// Store the report in a json file
        #[clap(long = "json")]
        json_filename: Option<String>,
    },
    /// Print the metrics of an OTG controller
    #[clap(name = "otg-metrics")]
    OtgMetrics {
        /// Host of the controller
        #[clap(long, default_value = "localhost")]
        host: String,
        /// Port of the controller
        #[clap(short = 'p', long, default_value = "8443")]
        port: u32,
        /// Locations of the test ports, in order
        #[clap(short = 'l', long = "location")]
        locations: Vec<String>,
        /// Names of the flows (all flows if empty)
        flows: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Reporting {
    Inline,
    Reference,
}

impl From<Reporting> for BackupReporting {
    fn from(r: Reporting) -> Self {
        match r {
            Reporting::Inline => Self::Inline,
            Reporting::Reference => Self::Reference,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FaultArg {
    None,
    BackupDown,
    NoBackup,
}

impl From<FaultArg> for Fault {
    fn from(f: FaultArg) -> Self {
        match f {
            FaultArg::None => Self::None,
            FaultArg::BackupDown => Self::BackupDown,
            FaultArg::NoBackup => Self::NoBackup,
        }
    }
}
