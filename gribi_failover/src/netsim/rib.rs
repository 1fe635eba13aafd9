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

//! # gRIBI RIB
//!
//! Device side of the gRIBI session: leader election, validation and installation of the
//! injected entries, flush and the persistence behavior on disconnect.

use crate::gribi::{
    AckMode, ElectionId, Entry, GribiError, Ipv4Entry, NextHop, NextHopGroup, Operation,
    OperationKind, OperationResult, Persistence, ProgrammingResult, Redundancy,
    SessionParameters,
};
use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use log::*;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Entries of a single network instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstanceRib {
    next_hops: BTreeMap<NextHopId, NextHop>,
    next_hop_groups: BTreeMap<NhgId, NextHopGroup>,
    ipv4_entries: BTreeMap<Ipv4Prefix, Ipv4Entry>,
}

impl NetworkInstanceRib {
    /// Installed next hops
    pub fn next_hops(&self) -> &BTreeMap<NextHopId, NextHop> {
        &self.next_hops
    }

    /// Installed next-hop-groups
    pub fn next_hop_groups(&self) -> &BTreeMap<NhgId, NextHopGroup> {
        &self.next_hop_groups
    }

    /// Installed IPv4 entries
    pub fn ipv4_entries(&self) -> &BTreeMap<Ipv4Prefix, Ipv4Entry> {
        &self.ipv4_entries
    }

    /// Returns `true` if nothing is installed
    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty() && self.next_hop_groups.is_empty() && self.ipv4_entries.is_empty()
    }

    /// Remove everything, IPv4 entries first, then the groups and finally the next hops.
    fn flush(&mut self) -> (usize, usize, usize) {
        let n_ipv4 = self.ipv4_entries.len();
        self.ipv4_entries.clear();
        let n_nhg = self.next_hop_groups.len();
        self.next_hop_groups.clear();
        let n_nh = self.next_hops.len();
        self.next_hops.clear();
        (n_ipv4, n_nhg, n_nh)
    }

    /// Returns `true` if another group uses `id` as its backup.
    pub fn is_backup(&self, id: NhgId) -> bool {
        self.next_hop_groups
            .values()
            .any(|g| g.backup_next_hop_group == Some(id))
    }

    /// Returns `true` if the group, or its backup, has at least one reachable next hop.
    pub fn nhg_resolves<F: Fn(Ipv4Addr) -> bool>(&self, id: NhgId, reachable: &F) -> bool {
        match self.next_hop_groups.get(&id) {
            Some(nhg) => {
                self.members_resolve(nhg, reachable)
                    || nhg
                        .backup_next_hop_group
                        .and_then(|b| self.next_hop_groups.get(&b))
                        .map(|b| self.members_resolve(b, reachable))
                        .unwrap_or(false)
            }
            None => false,
        }
    }

    fn members_resolve<F: Fn(Ipv4Addr) -> bool>(&self, nhg: &NextHopGroup, reachable: &F) -> bool {
        nhg.next_hops
            .keys()
            .filter_map(|i| self.next_hops.get(i))
            .any(|nh| reachable(nh.ip_address))
    }
}

/// # RIB
///
/// All gRIBI entries of a device, organized per network instance. Only one session can be
/// established at a time. With [`Redundancy::SinglePrimary`], only the client with the highest
/// election ID seen so far may modify or flush entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Rib {
    instances: BTreeMap<String, NetworkInstanceRib>,
    session: Option<SessionParameters>,
    primary: Option<ElectionId>,
}

impl Rib {
    /// Create a RIB with the given network instances
    pub fn new<I, S>(network_instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instances: network_instances
                .into_iter()
                .map(|ni| (ni.into(), NetworkInstanceRib::default()))
                .collect(),
            session: None,
            primary: None,
        }
    }

    /// Get the entries of a network instance
    pub fn instance(&self, network_instance: &str) -> Option<&NetworkInstanceRib> {
        self.instances.get(network_instance)
    }

    /// Iterate over all network instances
    pub fn instances(&self) -> impl Iterator<Item = (&String, &NetworkInstanceRib)> {
        self.instances.iter()
    }

    /// Parameters of the established session
    pub fn session(&self) -> Option<&SessionParameters> {
        self.session.as_ref()
    }

    /// Highest election ID seen so far
    pub fn primary(&self) -> Option<ElectionId> {
        self.primary
    }

    /// Establish a session
    pub fn connect(&mut self, params: SessionParameters) -> Result<(), GribiError> {
        if self.session.is_some() {
            return Err(GribiError::AlreadyConnected);
        }
        debug!("gRIBI session established: {:?}", params);
        self.session = Some(params);
        Ok(())
    }

    /// Take part in the election. Returns the election ID of the primary client.
    pub fn elect(&mut self, election_id: ElectionId) -> Result<ElectionId, GribiError> {
        self.session.ok_or(GribiError::NotConnected)?;
        let primary = match self.primary {
            Some(p) if p >= election_id => p,
            _ => election_id,
        };
        if self.primary != Some(primary) {
            info!("New gRIBI primary client with election ID {}", primary);
        }
        self.primary = Some(primary);
        Ok(primary)
    }

    fn check_primary(&self, election_id: ElectionId) -> Result<SessionParameters, GribiError> {
        let session = self.session.ok_or(GribiError::NotConnected)?;
        match (session.redundancy, self.primary) {
            (Redundancy::AllPrimary, _) => Ok(session),
            (Redundancy::SinglePrimary, Some(p)) if p == election_id => Ok(session),
            (Redundancy::SinglePrimary, p) => {
                Err(GribiError::NotPrimary {
                    ours: election_id,
                    primary: p.unwrap_or_default(),
                })
            }
        }
    }

    /// Apply all operations in order. `reachable` tells whether an address can be resolved in
    /// the forwarding plane, which decides if an entry is reported as installed in the FIB.
    pub fn modify<F: Fn(Ipv4Addr) -> bool>(
        &mut self,
        election_id: ElectionId,
        operations: Vec<Operation>,
        reachable: F,
    ) -> Result<Vec<OperationResult>, GribiError> {
        let session = self.check_primary(election_id)?;
        Ok(operations
            .into_iter()
            .map(|op| self.apply(&session, op, &reachable))
            .collect())
    }

    fn apply<F: Fn(Ipv4Addr) -> bool>(
        &mut self,
        session: &SessionParameters,
        op: Operation,
        reachable: &F,
    ) -> OperationResult {
        let key = op.entry.key();
        let outcome = match op.kind {
            OperationKind::Add => self.add(&op.network_instance, op.entry.clone()),
            OperationKind::Delete => self.delete(&op.network_instance, &op.entry),
        };
        let (result, reason) = match outcome {
            Err(reason) => {
                warn!("gRIBI operation {} on {} failed: {}", op.id, key, reason);
                (ProgrammingResult::Failed, Some(reason))
            }
            Ok(()) if session.ack_mode == AckMode::RibAndFib
                && op.kind == OperationKind::Add
                && self.resolves(&op.network_instance, &op.entry, reachable) =>
            {
                (ProgrammingResult::InstalledInFib, None)
            }
            Ok(()) if session.ack_mode == AckMode::RibAndFib
                && op.kind == OperationKind::Delete =>
            {
                (ProgrammingResult::InstalledInFib, None)
            }
            Ok(()) => (ProgrammingResult::InstalledInRib, None),
        };
        trace!("gRIBI operation {} on {}: {}", op.id, key, result);
        OperationResult {
            id: op.id,
            key,
            result,
            reason,
        }
    }

    fn resolves<F: Fn(Ipv4Addr) -> bool>(&self, ni: &str, entry: &Entry, reachable: &F) -> bool {
        match entry {
            Entry::NextHop(nh) => reachable(nh.ip_address),
            Entry::NextHopGroup(nhg) => {
                self.instances
                    .get(ni)
                    .map(|r| r.nhg_resolves(nhg.id, reachable))
                    .unwrap_or(false)
            }
            Entry::Ipv4(e) => self
                .instances
                .get(&e.next_hop_group_network_instance)
                .map(|r| r.nhg_resolves(e.next_hop_group, reachable))
                .unwrap_or(false),
        }
    }

    fn add(&mut self, ni: &str, entry: Entry) -> Result<(), String> {
        if !self.instances.contains_key(ni) {
            return Err(format!("unknown network instance {}", ni));
        }
        if let Entry::Ipv4(e) = &entry {
            let nhg_ni = self
                .instances
                .get(&e.next_hop_group_network_instance)
                .ok_or_else(|| {
                    format!("unknown network instance {}", e.next_hop_group_network_instance)
                })?;
            if !nhg_ni.next_hop_groups.contains_key(&e.next_hop_group) {
                return Err(format!("next-hop-group {} does not exist", e.next_hop_group));
            }
        }
        let rib = self
            .instances
            .get_mut(ni)
            .ok_or_else(|| format!("unknown network instance {}", ni))?;
        match entry {
            Entry::NextHop(nh) => {
                if nh.ip_address.is_unspecified() {
                    return Err(format!("next hop {} has no address", nh.index));
                }
                rib.next_hops.insert(nh.index, nh);
            }
            Entry::NextHopGroup(nhg) => {
                validate_nhg(rib, &nhg)?;
                rib.next_hop_groups.insert(nhg.id, nhg);
            }
            Entry::Ipv4(e) => {
                rib.ipv4_entries.insert(e.prefix, e);
            }
        }
        Ok(())
    }

    fn delete(&mut self, ni: &str, entry: &Entry) -> Result<(), String> {
        let referenced_by_prefix = |id: NhgId| {
            self.instances.values().any(|r| {
                r.ipv4_entries
                    .values()
                    .any(|e| e.next_hop_group_network_instance == ni && e.next_hop_group == id)
            })
        };
        let nhg_referenced = match entry {
            Entry::NextHopGroup(nhg) => referenced_by_prefix(nhg.id),
            _ => false,
        };
        let rib = self
            .instances
            .get_mut(ni)
            .ok_or_else(|| format!("unknown network instance {}", ni))?;
        match entry {
            Entry::NextHop(nh) => {
                let referenced = rib
                    .next_hop_groups
                    .values()
                    .any(|g| g.next_hops.contains_key(&nh.index));
                if referenced {
                    return Err(format!("next hop {} is still referenced", nh.index));
                }
                rib.next_hops
                    .remove(&nh.index)
                    .map(|_| ())
                    .ok_or_else(|| format!("next hop {} does not exist", nh.index))
            }
            Entry::NextHopGroup(nhg) => {
                if nhg_referenced || rib.is_backup(nhg.id) {
                    return Err(format!("next-hop-group {} is still referenced", nhg.id));
                }
                rib.next_hop_groups
                    .remove(&nhg.id)
                    .map(|_| ())
                    .ok_or_else(|| format!("next-hop-group {} does not exist", nhg.id))
            }
            Entry::Ipv4(e) => rib
                .ipv4_entries
                .remove(&e.prefix)
                .map(|_| ())
                .ok_or_else(|| format!("IPv4 entry {} does not exist", e.prefix)),
        }
    }

    /// Flush all entries of one network instance, or of all of them.
    pub fn flush(
        &mut self,
        election_id: ElectionId,
        network_instance: Option<&str>,
    ) -> Result<(), GribiError> {
        self.check_primary(election_id)?;
        match network_instance {
            Some(ni) => {
                let rib = self
                    .instances
                    .get_mut(ni)
                    .ok_or_else(|| GribiError::UnknownNetworkInstance(ni.to_string()))?;
                let (a, b, c) = rib.flush();
                debug!("Flushed {} IPv4 entries, {} NHGs and {} NHs from {}", a, b, c, ni);
            }
            None => {
                for (ni, rib) in self.instances.iter_mut() {
                    let (a, b, c) = rib.flush();
                    debug!("Flushed {} IPv4 entries, {} NHGs and {} NHs from {}", a, b, c, ni);
                }
            }
        }
        Ok(())
    }

    /// Tear down the session. Without persistence, all entries are removed.
    pub fn disconnect(&mut self) -> Result<(), GribiError> {
        let session = self.session.take().ok_or(GribiError::NotConnected)?;
        if session.persistence == Persistence::Delete {
            info!("gRIBI client disconnected without persistence, removing all entries");
            self.instances.values_mut().for_each(|r| {
                r.flush();
            });
        } else {
            debug!("gRIBI client disconnected, entries are preserved");
        }
        Ok(())
    }
}

fn validate_nhg(rib: &NetworkInstanceRib, nhg: &NextHopGroup) -> Result<(), String> {
    if nhg.next_hops.is_empty() {
        return Err(format!("next-hop-group {} has no next hops", nhg.id));
    }
    if let Some((nh, _)) = nhg.next_hops.iter().find(|(_, w)| **w == 0) {
        return Err(format!("next hop {} in next-hop-group {} has weight 0", nh, nhg.id));
    }
    if let Some(nh) = nhg
        .next_hops
        .keys()
        .find(|nh| !rib.next_hops.contains_key(nh))
    {
        return Err(format!("next hop {} does not exist", nh));
    }
    if let Some(backup) = nhg.backup_next_hop_group {
        if backup == nhg.id {
            return Err(format!("next-hop-group {} cannot be its own backup", nhg.id));
        }
        let b = rib
            .next_hop_groups
            .get(&backup)
            .ok_or_else(|| format!("backup next-hop-group {} does not exist", backup))?;
        if b.backup_next_hop_group.is_some() {
            return Err(format!("backup next-hop-group {} has a backup itself", backup));
        }
        if rib.is_backup(nhg.id) {
            return Err(format!("next-hop-group {} is a backup and cannot have a backup", nhg.id));
        }
    }
    Ok(())
}
