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

//! # Cleanup guards
//!
//! The guards undo the changes of a scenario when they go out of scope, on every exit path. Errors
//! during cleanup are logged and never propagated. Declare the [`LinkRestorer`] before the
//! [`SessionGuard`], such that the session is flushed and closed before the links are restored.

use crate::checks::flap_interface;
use crate::client::Client;
use crate::testbed::Dut;

use gribi_failover::gribi::GribiSession;
use log::*;
use std::cell::RefCell;

/// Flushes all gRIBI entries and closes the session when dropped.
#[derive(Debug)]
pub struct SessionGuard<'a, S: GribiSession> {
    client: &'a Client<S>,
}

impl<'a, S: GribiSession> SessionGuard<'a, S> {
    /// Guard an (already started) client
    pub fn new(client: &'a Client<S>) -> Self {
        Self { client }
    }
}

impl<'a, S: GribiSession> Drop for SessionGuard<'a, S> {
    fn drop(&mut self) {
        if !self.client.is_connected() {
            return;
        }
        if let Err(e) = self.client.flush_all() {
            error!("Cannot flush the gRIBI entries: {}", e);
        }
        if let Err(e) = self.client.close() {
            error!("Cannot close the gRIBI session: {}", e);
        }
    }
}

/// Re-enables all recorded ports of the DUT when dropped, the most recently recorded port first.
pub struct LinkRestorer<'a> {
    dut: &'a dyn Dut,
    ports: RefCell<Vec<String>>,
}

impl<'a> std::fmt::Debug for LinkRestorer<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRestorer")
            .field("dut", &self.dut.name())
            .field("ports", &self.ports)
            .finish()
    }
}

impl<'a> LinkRestorer<'a> {
    /// Create a restorer without any recorded port
    pub fn new(dut: &'a dyn Dut) -> Self {
        Self {
            dut,
            ports: RefCell::new(Vec::new()),
        }
    }

    /// Record a port to be re-enabled. Call this before disabling the port.
    pub fn record(&self, port: &str) {
        let mut ports = self.ports.borrow_mut();
        if !ports.iter().any(|p| p == port) {
            ports.push(port.to_string());
        }
    }

    /// Ports that will be re-enabled
    pub fn ports(&self) -> Vec<String> {
        self.ports.borrow().clone()
    }
}

impl<'a> Drop for LinkRestorer<'a> {
    fn drop(&mut self) {
        for port in self.ports.borrow().iter().rev() {
            match flap_interface(self.dut, port, true) {
                Ok(()) => debug!("Restored {} on {}", port, self.dut.name()),
                Err(e) => error!("Cannot re-enable {} on {}: {}", port, self.dut.name(), e),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use gribi_failover::aft::{AftIpv4Entry, AftNextHop, AftNextHopGroup};
    use gribi_failover::config::ConfigModifier;
    use gribi_failover::types::{Ipv4Prefix, NextHopId, NhgId};

    /// Device that only records the applied modifiers
    #[derive(Default)]
    struct RecordingDut {
        applied: RefCell<Vec<ConfigModifier>>,
    }

    impl Dut for RecordingDut {
        fn name(&self) -> String {
            "dut".to_string()
        }

        fn port(&self, port: &str) -> Result<String, Error> {
            Ok(port.replace("port", "Ethernet"))
        }

        fn apply(&self, modifier: &ConfigModifier) -> Result<(), Error> {
            self.applied.borrow_mut().push(modifier.clone());
            Ok(())
        }

        fn aft_ipv4_entry(&self, _: &str, _: &Ipv4Prefix) -> Result<Option<AftIpv4Entry>, Error> {
            Ok(None)
        }

        fn aft_next_hop_group(&self, _: &str, _: NhgId) -> Result<Option<AftNextHopGroup>, Error> {
            Ok(None)
        }

        fn aft_next_hop(&self, _: &str, _: NextHopId) -> Result<Option<AftNextHop>, Error> {
            Ok(None)
        }
    }

    #[test]
    fn restores_in_reverse_order() {
        let dut = RecordingDut::default();
        {
            let restorer = LinkRestorer::new(&dut);
            restorer.record("port2");
            restorer.record("port3");
            restorer.record("port2");
            assert_eq!(restorer.ports(), vec!["port2".to_string(), "port3".to_string()]);
        }
        assert_eq!(
            dut.applied.into_inner(),
            vec![
                ConfigModifier::set_enabled("Ethernet3", true),
                ConfigModifier::set_enabled("Ethernet2", true),
            ]
        );
    }
}
