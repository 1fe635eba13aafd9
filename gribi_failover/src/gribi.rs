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

//! # gRIBI
//!
//! Model of the gRPC Routing Information Base Interface: the entries that can be injected into a
//! device (next hops, next-hop-groups and IPv4 entries), the operations carrying them, their
//! programming results, and the session parameters negotiated between client and device.
//!
//! The transport is abstracted by the [`GribiSession`] trait. The simulated device in
//! [`netsim`](crate::netsim) implements the device side of these semantics.

use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Name of the default network instance, unless a device deviates from it.
pub const DEFAULT_NETWORK_INSTANCE: &str = "DEFAULT";

/// Election ID (128 bit, split into a high and a low part). The client with the highest election
/// ID is the primary client, and is the only one allowed to modify the RIB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ElectionId {
    /// upper 64 bits
    pub high: u64,
    /// lower 64 bits
    pub low: u64,
}

impl ElectionId {
    /// Create a new election ID from its lower 64 bits.
    pub fn new(low: u64) -> Self {
        Self { high: 0, low }
    }

    /// Returns the smallest election ID that is strictly larger than `self`.
    pub fn next(self) -> Self {
        match self.low.checked_add(1) {
            Some(low) => Self {
                high: self.high,
                low,
            },
            None => Self {
                high: self.high.saturating_add(1),
                low: 0,
            },
        }
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.high, self.low)
    }
}

/// Redundancy mode of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Redundancy {
    /// All clients may write, the device keeps one reference per client
    AllPrimary,
    /// Only the client with the highest election ID may write
    SinglePrimary,
}

/// Persistence mode of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persistence {
    /// Entries are removed when the client disconnects
    Delete,
    /// Entries survive the client disconnecting
    Preserve,
}

/// Which acknowledgement the client expects for every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckMode {
    /// Acknowledge once the entry is in the RIB
    Rib,
    /// Acknowledge once the entry is in the RIB and additionally when it is in the FIB
    RibAndFib,
}

/// Parameters of a gRIBI session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParameters {
    /// Redundancy mode
    pub redundancy: Redundancy,
    /// Persistence mode
    pub persistence: Persistence,
    /// Acknowledgement mode
    pub ack_mode: AckMode,
}

/// Next hop entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextHop {
    /// Index of the next hop
    pub index: NextHopId,
    /// Address the next hop resolves to
    pub ip_address: Ipv4Addr,
}

/// Next-hop-group entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextHopGroup {
    /// ID of the group
    pub id: NhgId,
    /// Member next hops and their weight
    pub next_hops: BTreeMap<NextHopId, u64>,
    /// Group used when none of the member next hops can be resolved
    pub backup_next_hop_group: Option<NhgId>,
}

/// IPv4 entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Entry {
    /// Destination prefix
    pub prefix: Ipv4Prefix,
    /// Next-hop-group the prefix points to
    pub next_hop_group: NhgId,
    /// Network instance in which the next-hop-group is resolved
    pub next_hop_group_network_instance: String,
}

/// Any entry that can be injected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// Next hop
    NextHop(NextHop),
    /// Next-hop-group
    NextHopGroup(NextHopGroup),
    /// IPv4 entry
    Ipv4(Ipv4Entry),
}

impl Entry {
    /// Key identifying the entry inside its network instance
    pub fn key(&self) -> EntryKey {
        match self {
            Self::NextHop(nh) => EntryKey::NextHop(nh.index),
            Self::NextHopGroup(nhg) => EntryKey::NextHopGroup(nhg.id),
            Self::Ipv4(e) => EntryKey::Ipv4(e.prefix),
        }
    }
}

/// Key of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryKey {
    /// Next hop index
    NextHop(NextHopId),
    /// Next-hop-group ID
    NextHopGroup(NhgId),
    /// IPv4 prefix
    Ipv4(Ipv4Prefix),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextHop(i) => write!(f, "NH {}", i),
            Self::NextHopGroup(i) => write!(f, "NHG {}", i),
            Self::Ipv4(p) => write!(f, "IPv4 {}", p),
        }
    }
}

/// Kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Add the entry. If the entry already exists, it is replaced (implicit replace).
    Add,
    /// Delete the entry
    Delete,
}

/// Operation sent in a modify request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Client-chosen ID of the operation, used to match the result
    pub id: u64,
    /// Network instance of the entry
    pub network_instance: String,
    /// Add or delete
    pub kind: OperationKind,
    /// The entry itself
    pub entry: Entry,
}

/// Result of programming a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgrammingResult {
    /// The entry was installed in the RIB
    InstalledInRib,
    /// The entry was installed in the RIB and in the FIB
    InstalledInFib,
    /// The operation failed
    Failed,
}

impl fmt::Display for ProgrammingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstalledInRib => write!(f, "RIB_PROGRAMMED"),
            Self::InstalledInFib => write!(f, "FIB_PROGRAMMED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of a single operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// ID of the operation this result belongs to
    pub id: u64,
    /// Key of the entry the operation was about
    pub key: EntryKey,
    /// Programming result
    pub result: ProgrammingResult,
    /// Reason why the operation failed
    pub reason: Option<String>,
}

/// gRIBI errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GribiError {
    /// No session is established
    #[error("No gRIBI session is established")]
    NotConnected,
    /// A session is already established
    #[error("A gRIBI session is already established")]
    AlreadyConnected,
    /// Session parameters were not accepted
    #[error("Unsupported session parameters: {0}")]
    UnsupportedParameters(String),
    /// The election ID used is not the one of the primary client
    #[error("Client with election ID {ours} is not the primary client (primary: {primary})")]
    NotPrimary {
        /// election ID of the client
        ours: ElectionId,
        /// election ID of the current primary client
        primary: ElectionId,
    },
    /// The network instance is not known on the device
    #[error("Unknown network instance: {0}")]
    UnknownNetworkInstance(String),
    /// The operation was programmed with a different result than expected
    #[error("Operation {id} on {key}: expected {expected}, got {got}{}", fmt_reason(.reason))]
    UnexpectedResult {
        /// operation ID
        id: u64,
        /// entry key
        key: EntryKey,
        /// expected result
        expected: ProgrammingResult,
        /// actual result
        got: ProgrammingResult,
        /// reason reported by the device
        reason: Option<String>,
    },
    /// No result was received for an operation
    #[error("No result received for operation {0}")]
    MissingResult(u64),
    /// Transport failure
    #[error("gRIBI transport error: {0}")]
    Transport(String),
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

/// # gRIBI Session
///
/// Transport towards the gRIBI server of a device. All functions are blocking; `modify` returns
/// only once the device has sent a result for every operation (or failed).
pub trait GribiSession {
    /// Establish the session with the given parameters.
    fn connect(&self, params: &SessionParameters) -> Result<(), GribiError>;

    /// Announce the election ID of this client. Returns the election ID of the current primary
    /// client (which is `election_id` if this client won the election).
    fn elect(&self, election_id: ElectionId) -> Result<ElectionId, GribiError>;

    /// Send a modify request. Returns one result for every operation.
    fn modify(
        &self,
        election_id: ElectionId,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, GribiError>;

    /// Flush all entries of a network instance (or of all network instances if `None`).
    fn flush(
        &self,
        election_id: ElectionId,
        network_instance: Option<&str>,
    ) -> Result<(), GribiError>;

    /// Tear down the session.
    fn disconnect(&self) -> Result<(), GribiError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn election_id_next() {
        assert_eq!(ElectionId::new(1).next(), ElectionId::new(2));
        let last = ElectionId {
            high: 0,
            low: u64::MAX,
        };
        assert_eq!(last.next(), ElectionId { high: 1, low: 0 });
        assert!(ElectionId { high: 1, low: 0 } > ElectionId::new(u64::MAX));
    }

    #[test]
    fn unexpected_result_message() {
        let e = GribiError::UnexpectedResult {
            id: 3,
            key: EntryKey::NextHop(1001),
            expected: ProgrammingResult::InstalledInRib,
            got: ProgrammingResult::Failed,
            reason: Some("bad".to_string()),
        };
        assert_eq!(
            e.to_string(),
            "Operation 3 on NH 1001: expected RIB_PROGRAMMED, got FAILED (bad)"
        );
    }
}
