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

//! # gRIBI Client
//!
//! Synchronous client on top of a [`GribiSession`]. Every installation call sends exactly one
//! operation and waits for its result. A missing result, or a result different from the expected
//! one, is returned as an error.

use crate::Error;

use gribi_failover::gribi::*;
use gribi_failover::types::{Ipv4Prefix, NextHopId, NhgId};

use log::*;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Options of a next-hop-group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NhgOptions {
    /// Backup next-hop-group, used once all next hops of the group are unreachable
    pub backup_nhg: Option<NhgId>,
}

/// # gRIBI Client
#[derive(Debug)]
pub struct Client<S: GribiSession> {
    session: S,
    fib_ack: bool,
    persistence: Persistence,
    election_id: Cell<ElectionId>,
    next_op: Cell<u64>,
    connected: Cell<bool>,
}

impl<S: GribiSession> Client<S> {
    /// Create a new client. Nothing is sent to the device before [`Client::start`].
    pub fn new(session: S, fib_ack: bool, persistence: Persistence) -> Self {
        Self {
            session,
            fib_ack,
            persistence,
            election_id: Cell::new(ElectionId::new(1)),
            next_op: Cell::new(1),
            connected: Cell::new(false),
        }
    }

    /// The underlying session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Current election ID of the client
    pub fn election_id(&self) -> ElectionId {
        self.election_id.get()
    }

    /// Returns `true` if the session is established
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Result expected for every successful operation, depending on the requested
    /// acknowledgement.
    pub fn expected_result(&self) -> ProgrammingResult {
        if self.fib_ack {
            ProgrammingResult::InstalledInFib
        } else {
            ProgrammingResult::InstalledInRib
        }
    }

    /// Establish the session with single-primary redundancy.
    pub fn start(&self) -> Result<(), Error> {
        let params = SessionParameters {
            redundancy: Redundancy::SinglePrimary,
            persistence: self.persistence,
            ack_mode: if self.fib_ack { AckMode::RibAndFib } else { AckMode::Rib },
        };
        self.session
            .connect(&params)
            .map_err(Error::ConnectionFailed)?;
        self.connected.set(true);
        info!("gRIBI session established ({:?}, {:?})", params.persistence, params.ack_mode);
        Ok(())
    }

    /// Learn the election ID of the current primary and claim a strictly higher one.
    pub fn become_leader(&self) -> Result<ElectionId, Error> {
        let primary = self.session.elect(self.election_id.get())?;
        let ours = if primary > self.election_id.get() {
            primary.next()
        } else {
            self.election_id.get()
        };
        let leader = self.session.elect(ours)?;
        if leader != ours {
            return Err(GribiError::NotPrimary {
                ours,
                primary: leader,
            }
            .into());
        }
        self.election_id.set(ours);
        info!("Client is primary with election ID {}", ours);
        Ok(ours)
    }

    /// Add a next hop
    pub fn add_nh(
        &self,
        index: NextHopId,
        ip_address: Ipv4Addr,
        network_instance: &str,
        expected: ProgrammingResult,
    ) -> Result<(), Error> {
        self.add(network_instance, Entry::NextHop(NextHop { index, ip_address }), expected)
    }

    /// Add a next-hop-group with weighted next hops
    pub fn add_nhg(
        &self,
        id: NhgId,
        next_hops: BTreeMap<NextHopId, u64>,
        network_instance: &str,
        expected: ProgrammingResult,
        options: Option<NhgOptions>,
    ) -> Result<(), Error> {
        let backup_next_hop_group = options.and_then(|o| o.backup_nhg);
        let entry = Entry::NextHopGroup(NextHopGroup {
            id,
            next_hops,
            backup_next_hop_group,
        });
        self.add(network_instance, entry, expected)
    }

    /// Add an IPv4 entry pointing to a next-hop-group
    pub fn add_ipv4(
        &self,
        prefix: Ipv4Prefix,
        nhg: NhgId,
        network_instance: &str,
        nhg_network_instance: &str,
        expected: ProgrammingResult,
    ) -> Result<(), Error> {
        let entry = Entry::Ipv4(Ipv4Entry {
            prefix,
            next_hop_group: nhg,
            next_hop_group_network_instance: nhg_network_instance.to_string(),
        });
        self.add(network_instance, entry, expected)
    }

    fn add(
        &self,
        network_instance: &str,
        entry: Entry,
        expected: ProgrammingResult,
    ) -> Result<(), Error> {
        let id = self.next_op.get();
        self.next_op.set(id + 1);
        let key = entry.key();
        let op = Operation {
            id,
            network_instance: network_instance.to_string(),
            kind: OperationKind::Add,
            entry,
        };
        debug!("Sending operation {}: add {}", id, key);
        let results = self.session.modify(self.election_id.get(), vec![op])?;
        let result = results
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(GribiError::MissingResult(id))?;
        check_result(&result, expected)?;
        info!("{} programmed ({})", key, result.result);
        Ok(())
    }

    /// Remove all entries from all network instances
    pub fn flush_all(&self) -> Result<(), Error> {
        self.session.flush(self.election_id.get(), None)?;
        info!("Flushed all gRIBI entries");
        Ok(())
    }

    /// Tear down the session
    pub fn close(&self) -> Result<(), Error> {
        if self.connected.replace(false) {
            self.session.disconnect()?;
            info!("gRIBI session closed");
        }
        Ok(())
    }
}

/// A result matches if it equals the expected one. An entry that is already installed in the FIB
/// satisfies the expectation of a RIB installation.
fn check_result(result: &OperationResult, expected: ProgrammingResult) -> Result<(), GribiError> {
    match (expected, result.result) {
        (e, g) if e == g => Ok(()),
        (ProgrammingResult::InstalledInRib, ProgrammingResult::InstalledInFib) => Ok(()),
        (expected, got) => Err(GribiError::UnexpectedResult {
            id: result.id,
            key: result.key,
            expected,
            got,
            reason: result.reason.clone(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn result(r: ProgrammingResult) -> OperationResult {
        OperationResult {
            id: 7,
            key: EntryKey::NextHopGroup(100),
            result: r,
            reason: None,
        }
    }

    #[test]
    fn result_matching() {
        use ProgrammingResult::*;
        assert!(check_result(&result(InstalledInRib), InstalledInRib).is_ok());
        assert!(check_result(&result(InstalledInFib), InstalledInRib).is_ok());
        assert!(check_result(&result(InstalledInFib), InstalledInFib).is_ok());
        assert!(check_result(&result(InstalledInRib), InstalledInFib).is_err());
        match check_result(&result(Failed), InstalledInRib) {
            Err(GribiError::UnexpectedResult {
                id,
                expected,
                got,
                ..
            }) => {
                assert_eq!(id, 7);
                assert_eq!(expected, InstalledInRib);
                assert_eq!(got, Failed);
            }
            r => panic!("unexpected result: {:?}", r),
        }
    }
}
