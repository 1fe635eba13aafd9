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

//! # Verification rules
//!
//! Pure decision functions applied on the telemetry and the traffic counters. They contain no I/O
//! and no waiting; the runtime fetches the data and feeds it into these functions.

use crate::aft::{AftNextHop, AftNextHopGroup};
use crate::types::{Ipv4Prefix, NextHopId, NhgId};

use itertools::Itertools;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Verification failures. All of them are fatal for the scenario.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// The prefix did not show up in the AFT within the timeout
    #[error("Could not find prefix {0} in telemetry AFT")]
    PrefixNotInAft(Ipv4Prefix),
    /// The group has no next hop and no backup
    #[error("Prefix {0} reachability didn't switch to backup path")]
    NoBackupSwitch(Ipv4Prefix),
    /// The group referenced by the prefix is not in the AFT
    #[error("Next-hop-group {0} is not present in telemetry AFT")]
    NextHopGroupMissing(NhgId),
    /// A next hop referenced by the group is not in the AFT
    #[error("Next hop {0} is not present in telemetry AFT")]
    NextHopMissing(NextHopId),
    /// A next hop has no IP address
    #[error("Next hop {0} has no IP address")]
    NextHopWithoutAddress(NextHopId),
    /// A next hop resolves to an address outside the expected set
    #[error(
        "No matching NH found for {prefix}: NH {next_hop} has address {address}, expected one of [{}]",
        .expected.iter().join(", ")
    )]
    UnexpectedNextHop {
        /// destination prefix
        prefix: Ipv4Prefix,
        /// next hop index
        next_hop: NextHopId,
        /// observed address
        address: Ipv4Addr,
        /// set of expected addresses
        expected: Vec<Ipv4Addr>,
    },
    /// The flow lost traffic, even though it should not
    #[error("LossPct for flow {flow} got {loss}, want 0")]
    TrafficLoss {
        /// flow name
        flow: String,
        /// measured loss in percent
        loss: f32,
    },
    /// The flow should have been dropped entirely
    #[error("Traffic passing for flow {flow} got {loss}, want 100 percent loss")]
    TrafficNotDropped {
        /// flow name
        flow: String,
        /// measured loss in percent
        loss: f32,
    },
    /// No metrics available for the flow
    #[error("No metrics available for flow {0}")]
    FlowMetricsMissing(String),
}

/// How a next-hop-group currently forwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NhgResolution {
    /// The group has member next hops (given by their index)
    Members(Vec<NextHopId>),
    /// The group has no member next hop, but a reference to the given backup group
    Backup(NhgId),
}

/// Check that the next-hop-group used by `prefix` either has at least one member next hop, or
/// refers to a backup group.
pub fn check_next_hop_group(
    prefix: Ipv4Prefix,
    nhg: &AftNextHopGroup,
) -> Result<NhgResolution, VerifyError> {
    if !nhg.next_hops.is_empty() {
        Ok(NhgResolution::Members(nhg.next_hops.keys().copied().collect()))
    } else if let Some(backup) = nhg.backup_next_hop_group {
        Ok(NhgResolution::Backup(backup))
    } else {
        Err(VerifyError::NoBackupSwitch(prefix))
    }
}

/// Check that the address of the next hop is part of the expected set. Returns the observed
/// address.
pub fn check_next_hop_address(
    prefix: Ipv4Prefix,
    nh: &AftNextHop,
    expected: &BTreeSet<Ipv4Addr>,
) -> Result<Ipv4Addr, VerifyError> {
    let address = nh
        .ip_address
        .ok_or(VerifyError::NextHopWithoutAddress(nh.index))?;
    if expected.contains(&address) {
        Ok(address)
    } else {
        Err(VerifyError::UnexpectedNextHop {
            prefix,
            next_hop: nh.index,
            address,
            expected: expected.iter().copied().collect(),
        })
    }
}

/// Check the loss of a flow. With `drop = false`, the loss must be exactly 0%, and with
/// `drop = true`, it must be exactly 100%.
#[allow(clippy::float_cmp)]
pub fn check_loss(flow: &str, loss: f32, drop: bool) -> Result<(), VerifyError> {
    match (drop, loss) {
        (false, l) if l != 0.0 => Err(VerifyError::TrafficLoss {
            flow: flow.to_string(),
            loss,
        }),
        (true, l) if l != 100.0 => {
            Err(VerifyError::TrafficNotDropped {
                flow: flow.to_string(),
                loss,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::{btreemap, btreeset};

    fn prefix() -> Ipv4Prefix {
        "203.0.113.0/24".parse().unwrap()
    }

    #[test]
    fn nhg_with_members() {
        let nhg = AftNextHopGroup {
            id: 100,
            next_hops: btreemap! {1001 => 80, 1002 => 20},
            backup_next_hop_group: Some(200),
        };
        assert_eq!(
            check_next_hop_group(prefix(), &nhg),
            Ok(NhgResolution::Members(vec![1001, 1002]))
        );
    }

    #[test]
    fn nhg_with_backup_only() {
        let nhg = AftNextHopGroup {
            id: 100,
            next_hops: btreemap! {},
            backup_next_hop_group: Some(200),
        };
        assert_eq!(check_next_hop_group(prefix(), &nhg), Ok(NhgResolution::Backup(200)));
    }

    #[test]
    fn nhg_without_anything() {
        let nhg = AftNextHopGroup {
            id: 100,
            next_hops: btreemap! {},
            backup_next_hop_group: None,
        };
        assert_eq!(
            check_next_hop_group(prefix(), &nhg),
            Err(VerifyError::NoBackupSwitch(prefix()))
        );
    }

    #[test]
    fn next_hop_membership() {
        let expected = btreeset! {Ipv4Addr::new(192, 0, 2, 6), Ipv4Addr::new(192, 0, 2, 10)};
        let mut nh = AftNextHop {
            index: 1002,
            ip_address: Some(Ipv4Addr::new(192, 0, 2, 10)),
            interface: None,
        };
        assert_eq!(
            check_next_hop_address(prefix(), &nh, &expected),
            Ok(Ipv4Addr::new(192, 0, 2, 10))
        );

        // the last element of the set must not be treated differently from the others
        nh.ip_address = Some(Ipv4Addr::new(192, 0, 2, 6));
        assert!(check_next_hop_address(prefix(), &nh, &expected).is_ok());

        nh.ip_address = Some(Ipv4Addr::new(192, 0, 2, 14));
        match check_next_hop_address(prefix(), &nh, &expected) {
            Err(VerifyError::UnexpectedNextHop {
                next_hop,
                address,
                ..
            }) => {
                assert_eq!(next_hop, 1002);
                assert_eq!(address, Ipv4Addr::new(192, 0, 2, 14));
            }
            r => panic!("unexpected result: {:?}", r),
        }

        nh.ip_address = None;
        assert_eq!(
            check_next_hop_address(prefix(), &nh, &expected),
            Err(VerifyError::NextHopWithoutAddress(1002))
        );
    }

    #[test]
    fn loss_is_strict() {
        assert!(check_loss("f", 0.0, false).is_ok());
        assert!(check_loss("f", 0.01, false).is_err());
        assert!(check_loss("f", -2.5, false).is_err());
        assert!(check_loss("f", f32::NAN, false).is_err());
        assert!(check_loss("f", f32::NAN, true).is_err());
        assert!(check_loss("f", 100.0, true).is_ok());
        assert!(check_loss("f", 99.9, true).is_err());
        assert!(check_loss("f", 0.0, true).is_err());
    }

    #[test]
    fn unexpected_next_hop_message() {
        let e = VerifyError::UnexpectedNextHop {
            prefix: prefix(),
            next_hop: 1001,
            address: Ipv4Addr::new(192, 0, 2, 6),
            expected: vec![Ipv4Addr::new(192, 0, 2, 10)],
        };
        assert_eq!(
            e.to_string(),
            "No matching NH found for 203.0.113.0/24: NH 1001 has address 192.0.2.6, expected one of [192.0.2.10]"
        );
    }
}
