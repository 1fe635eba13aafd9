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

//! # Testbed configuration
//!
//! Configuration of the DUT interfaces, the emulated devices on the traffic generator and the
//! flow sent towards the injected prefix.

use crate::params::{ScenarioConfig, FLOW_NAME};
use crate::testbed::{Ate, Dut};
use crate::Error;

use gribi_failover::config::ConfigModifier;
use gribi_failover::types::MacAddr;
use log::*;
use otg::{Flow, Ipv4Neighbor};
use std::net::Ipv4Addr;

/// Replace the configuration of all DUT ports with the addresses of the topology. All ports are
/// enabled afterwards.
pub fn configure_dut(dut: &dyn Dut, cfg: &ScenarioConfig) -> Result<(), Error> {
    for link in cfg.topology.links.iter() {
        let iface = dut.port(&link.port)?;
        let modifier = ConfigModifier::Replace(link.dut.new_interface(iface));
        debug!("{}: {}", dut.name(), modifier);
        dut.apply(&modifier)?;
    }
    info!("Configured {} ports on {}", cfg.topology.links.len(), dut.name());
    Ok(())
}

/// Build the configuration of the traffic generator: one port and one emulated device per link,
/// with the DUT address as gateway. The configuration is pushed and the protocols are started.
pub fn configure_ate(ate: &dyn Ate, cfg: &ScenarioConfig) -> Result<otg::Config, Error> {
    let mut top = otg::Config::new();
    for link in cfg.topology.links.iter() {
        let attrs = &link.ate;
        let mac = attrs
            .mac
            .ok_or_else(|| Error::InvalidAteConfig(format!("{} has no MAC address", attrs.name)))?;
        top.add_port(attrs.name.as_str(), Some(ate.port(&link.port)?));
        top.add_device(attrs.name.as_str())
            .add_ethernet(attrs.eth_name(), attrs.name.as_str(), mac.to_string())
            .add_ipv4(
                attrs.ipv4_name(),
                attrs.ipv4.to_string(),
                link.dut.ipv4.to_string(),
                attrs.ipv4_len,
            )
            .add_ipv6(
                attrs.ipv6_name(),
                attrs.ipv6.to_string(),
                link.dut.ipv6.to_string(),
                attrs.ipv6_len,
            );
    }
    ate.push_config(&top)?;
    ate.start_protocols()?;
    info!("Configured {} ports on the traffic generator", top.ports.len());
    Ok(top)
}

/// Add the flow from the first port towards the injected prefix, using `dst_mac` as destination
/// hardware address. The configuration is pushed again and the protocols are restarted.
pub fn create_flow(
    ate: &dyn Ate,
    top: &mut otg::Config,
    cfg: &ScenarioConfig,
    dst_mac: MacAddr,
) -> Result<(), Error> {
    let src = cfg
        .topology
        .links
        .first()
        .ok_or_else(|| Error::UnknownPort("port1".to_string()))?;
    let src_mac = src
        .ate
        .mac
        .ok_or_else(|| Error::InvalidAteConfig(format!("{} has no MAC address", src.ate.name)))?;
    let mut flow = Flow::new(FLOW_NAME, src.ate.name.as_str())
        .ethernet(src_mac.to_string(), dst_mac.to_string())
        .ipv4(src.ate.ipv4.to_string(), cfg.prefix.network().to_string());
    flow.tx_rx.port.rx_names = cfg
        .topology
        .links
        .iter()
        .skip(1)
        .map(|l| l.ate.name.clone())
        .collect();

    top.flows.retain(|f| f.name != FLOW_NAME);
    top.add_flow(flow);
    ate.push_config(top)?;
    ate.start_protocols()?;
    info!("Created flow {} towards {} (dst MAC {})", FLOW_NAME, cfg.prefix, dst_mac);
    Ok(())
}

/// Hardware address learned for `gateway`. Neighbors with other addresses are ignored.
pub fn learned_mac(neighbors: &[Ipv4Neighbor], gateway: Ipv4Addr) -> Result<MacAddr, Error> {
    let gateway = gateway.to_string();
    let neighbor = neighbors
        .iter()
        .filter(|n| n.link_layer_address.is_some())
        .find(|n| n.ipv4_address == gateway)
        .ok_or_else(|| Error::InvalidAteConfig(format!("No resolved neighbor for {}", gateway)))?;
    match neighbor.link_layer_address.as_deref() {
        Some(mac) => Ok(mac.parse()?),
        None => Err(Error::InvalidAteConfig(format!("No resolved neighbor for {}", gateway))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn neighbor(eth: &str, ip: &str, mac: Option<&str>) -> Ipv4Neighbor {
        Ipv4Neighbor {
            ethernet_name: eth.to_string(),
            ipv4_address: ip.to_string(),
            link_layer_address: mac.map(|m| m.to_string()),
        }
    }

    #[test]
    fn learned_mac_of_gateway() {
        let neighbors = vec![
            neighbor("atePort1.Eth", "192.0.2.9", Some("02:1a:00:01:00:03")),
            neighbor("atePort1.Eth", "192.0.2.1", Some("02:1a:00:01:00:01")),
        ];
        assert_eq!(
            learned_mac(&neighbors, Ipv4Addr::new(192, 0, 2, 1)).unwrap(),
            MacAddr([0x02, 0x1a, 0x00, 0x01, 0x00, 0x01])
        );
    }

    #[test]
    fn learned_mac_unresolved() {
        let neighbors = vec![neighbor("atePort1.Eth", "192.0.2.1", None)];
        assert!(learned_mac(&neighbors, Ipv4Addr::new(192, 0, 2, 1)).is_err());
        assert!(learned_mac(&[], Ipv4Addr::new(192, 0, 2, 1)).is_err());
    }

    #[test]
    fn learned_mac_ignores_other_neighbors() {
        let neighbors = vec![neighbor("atePort1.Eth", "192.0.2.9", Some("02:1a:00:01:00:03"))];
        assert!(matches!(
            learned_mac(&neighbors, Ipv4Addr::new(192, 0, 2, 1)),
            Err(Error::InvalidAteConfig(_))
        ));
    }

    #[test]
    fn invalid_mac() {
        let neighbors = vec![neighbor("atePort1.Eth", "192.0.2.1", Some("not-a-mac"))];
        assert!(matches!(
            learned_mac(&neighbors, Ipv4Addr::new(192, 0, 2, 1)),
            Err(Error::Failover(_))
        ));
    }
}
