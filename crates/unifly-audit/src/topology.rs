//! Topology extraction and device classification.
//!
//! Turns untyped per-device records into [`Switch`] entities with resolved
//! ports. A malformed record is skipped and listed in
//! [`Topology::skipped`]; it never fails the pass.
//!
//! Role classification:
//!
//! - **Gateway**: the device exposes a WAN interface. If its uplink points
//!   at another device in the snapshot it is gateway hardware running as a
//!   mesh access point instead, and is classified as such.
//! - **Access point**: the device has radios and more than two ports.
//!   Radio devices with two or fewer ports are passthrough APs and dropped.
//! - **Switch**: everything else.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::convert::{aggregated_by, capabilities, port_settings};
use crate::model::{
    DeviceRole, EffectivePortConfig, GlobalSwitchSettings, MacAddress, Network, PoeState, Port,
    PortProfile, Switch, Uplink,
};
use crate::resolve::{PortResolver, resolve_switch_settings};
use crate::snapshot::{RawDevice, RawPort};

/// Radio devices with at most this many ports cannot be managed.
const PASSTHROUGH_MAX_PORTS: usize = 2;

/// Why a device record produced no switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    Malformed,
    MissingMac,
    PassthroughAccessPoint,
    NoPorts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDevice {
    pub mac: Option<MacAddress>,
    pub name: Option<String>,
    pub reason: SkipReason,
}

/// The wired link between a device's uplink port and the parent port it names.
#[derive(Debug, Clone, Copy)]
pub struct InfrastructureLink<'a> {
    pub downstream: &'a Switch,
    pub downstream_port: &'a Port,
    pub upstream: &'a Switch,
    pub upstream_port: &'a Port,
}

/// Immutable, resolved topology for one pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    pub switches: Vec<Switch>,
    pub skipped: Vec<SkippedDevice>,
}

impl Topology {
    pub fn switch(&self, mac: &MacAddress) -> Option<&Switch> {
        self.switches.iter().find(|s| &s.mac == mac)
    }

    pub fn gateway(&self) -> Option<&Switch> {
        self.switches.iter().find(|s| s.role == DeviceRole::Gateway)
    }

    /// Every resolvable wired uplink between two devices in the topology.
    pub fn infrastructure_links(&self) -> Vec<InfrastructureLink<'_>> {
        self.switches
            .iter()
            .filter_map(|downstream| {
                let uplink = downstream.uplink.as_ref().filter(|u| !u.wireless)?;
                let upstream = self.switch(uplink.mac.as_ref()?)?;
                let upstream_port = upstream.port(uplink.remote_port?)?;
                let downstream_port = downstream.port(downstream.uplink_port()?)?;
                Some(InfrastructureLink {
                    downstream,
                    downstream_port,
                    upstream,
                    upstream_port,
                })
            })
            .collect()
    }

    /// Ports on either end of an infrastructure link.
    pub fn infrastructure_ports(&self) -> BTreeSet<(MacAddress, u32)> {
        let mut ports: BTreeSet<(MacAddress, u32)> = self
            .switches
            .iter()
            .filter_map(|s| s.uplink_port().map(|idx| (s.mac.clone(), idx)))
            .collect();
        for link in self.infrastructure_links() {
            ports.insert((link.upstream.mac.clone(), link.upstream_port.index));
        }
        ports
    }

    pub fn port_count(&self) -> usize {
        self.switches.iter().map(|s| s.ports.len()).sum()
    }
}

/// Build the topology from raw device records.
///
/// `global` is the site-wide switch settings layer, parsed once by the
/// caller and threaded in read-only.
pub fn extract(
    devices: &[Value],
    networks: &[Network],
    profiles: &[PortProfile],
    global: &GlobalSwitchSettings,
) -> Topology {
    let resolver = PortResolver::new(profiles, networks);
    let mut topology = Topology::default();

    let parsed: Vec<RawDevice> = devices
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if !record.is_object() {
                tracing::warn!(index = i, "skipping device record that is not an object");
                topology.skipped.push(SkippedDevice {
                    mac: None,
                    name: None,
                    reason: SkipReason::Malformed,
                });
                return None;
            }
            match serde_json::from_value::<RawDevice>(record.clone()) {
                Ok(raw) if raw.mac.as_deref().is_some_and(|m| !m.trim().is_empty()) => Some(raw),
                Ok(raw) => {
                    tracing::warn!(index = i, "skipping device record without a MAC");
                    topology.skipped.push(SkippedDevice {
                        mac: None,
                        name: raw.name,
                        reason: SkipReason::MissingMac,
                    });
                    None
                }
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "skipping malformed device record");
                    topology.skipped.push(SkippedDevice {
                        mac: None,
                        name: None,
                        reason: SkipReason::Malformed,
                    });
                    None
                }
            }
        })
        .collect();

    // Mesh reclassification needs to know every MAC in the snapshot.
    let known_macs: BTreeSet<MacAddress> = parsed
        .iter()
        .filter_map(|d| d.mac.as_deref().map(MacAddress::new))
        .collect();

    for raw in &parsed {
        match build_switch(raw, &known_macs, &resolver, global) {
            Ok(switch) => {
                tracing::debug!(
                    mac = %switch.mac,
                    role = %switch.role,
                    ports = switch.ports.len(),
                    "extracted device"
                );
                topology.switches.push(switch);
            }
            Err(skipped) => {
                tracing::debug!(reason = %skipped.reason, "device produced no switch");
                topology.skipped.push(skipped);
            }
        }
    }

    tracing::info!(
        switches = topology.switches.len(),
        ports = topology.port_count(),
        skipped = topology.skipped.len(),
        "topology extracted"
    );
    topology
}

fn has_wan_interface(raw: &RawDevice, ports: &[RawPort]) -> bool {
    raw.wan1.is_some() || ports.iter().any(is_wan_port)
}

fn is_wan_port(port: &RawPort) -> bool {
    port.network_name
        .as_deref()
        .is_some_and(|n| n.trim().to_ascii_lowercase().starts_with("wan"))
}

fn has_radio(raw: &RawDevice) -> bool {
    raw.device_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("uap"))
        || raw.radio_table.as_ref().is_some_and(|r| !r.is_empty())
}

fn parse_ports(values: Option<&[Value]>) -> Vec<RawPort> {
    values
        .map(|list| {
            list.iter()
                .filter_map(|v| serde_json::from_value::<RawPort>(v.clone()).ok())
                .filter(|p| p.port_idx.is_some())
                .collect()
        })
        .unwrap_or_default()
}

fn build_switch(
    raw: &RawDevice,
    known_macs: &BTreeSet<MacAddress>,
    resolver: &PortResolver<'_>,
    global: &GlobalSwitchSettings,
) -> Result<Switch, SkippedDevice> {
    let mac = MacAddress::new(raw.mac.as_deref().unwrap_or_default());
    let skip = |reason| SkippedDevice {
        mac: Some(mac.clone()),
        name: raw.name.clone(),
        reason,
    };

    let port_table = parse_ports(raw.port_table.as_deref());
    let overrides = parse_ports(raw.port_overrides.as_deref());
    let uplink = raw.uplink.as_ref().map(Uplink::from);

    let (role, mesh_backhaul) = if has_wan_interface(raw, &port_table) {
        let upstream_is_known = uplink
            .as_ref()
            .and_then(|u| u.mac.as_ref())
            .is_some_and(|up| up != &mac && known_macs.contains(up));
        if upstream_is_known {
            (DeviceRole::AccessPoint, true)
        } else {
            (DeviceRole::Gateway, false)
        }
    } else if has_radio(raw) {
        if port_table.len() <= PASSTHROUGH_MAX_PORTS {
            return Err(skip(SkipReason::PassthroughAccessPoint));
        }
        (DeviceRole::AccessPoint, false)
    } else {
        (DeviceRole::Switch, false)
    };

    let local_uplink = uplink.as_ref().filter(|u| !u.wireless).and_then(|u| u.local_port);
    let ports = build_ports(&port_table, &overrides, local_uplink, resolver);
    if ports.is_empty() {
        return Err(skip(SkipReason::NoPorts));
    }

    let settings = resolve_switch_settings(&mac, raw.jumboframe_enabled, raw.flowctrl_enabled, global);

    Ok(Switch {
        mac,
        name: raw.name.clone(),
        model: raw.model.clone(),
        role,
        mesh_backhaul,
        capabilities: capabilities(raw),
        uplink,
        settings,
        ports,
    })
}

fn build_ports(
    table: &[RawPort],
    overrides: &[RawPort],
    local_uplink: Option<u32>,
    resolver: &PortResolver<'_>,
) -> Vec<Port> {
    let mut by_index: BTreeMap<u32, Port> = BTreeMap::new();

    for raw in table {
        let Some(index) = raw.port_idx else { continue };
        if by_index.contains_key(&index) {
            continue;
        }
        let over = overrides.iter().find(|o| o.port_idx == Some(index));
        let settings = port_settings(raw, over);
        let effective = resolver.resolve(&settings);
        let up = raw.up.unwrap_or(false);
        let is_wan = is_wan_port(raw);

        by_index.insert(
            index,
            Port {
                index,
                name: over
                    .and_then(|o| o.name.clone())
                    .or_else(|| raw.name.clone()),
                up,
                media: raw.media.clone(),
                speed_mbps: raw.speed.filter(|s| up && *s > 0),
                poe: PoeState {
                    capable: raw.port_poe.unwrap_or(false) || raw.poe_caps.is_some_and(|c| c > 0),
                    enabled: raw.poe_enable.unwrap_or(false),
                },
                is_uplink: raw.is_uplink.unwrap_or(false) || local_uplink == Some(index),
                is_wan,
                aggregated_by: aggregated_by(&raw.aggregated_by).filter(|parent| *parent != index),
                is_lag_child: false,
                manageable: !is_wan,
                settings,
                effective,
            },
        );
    }

    // A port referenced as a LAG parent is never itself a child.
    let parents: BTreeSet<u32> = by_index.values().filter_map(|p| p.aggregated_by).collect();
    for port in by_index.values_mut() {
        port.is_lag_child = port.aggregated_by.is_some() && !parents.contains(&port.index);
    }

    inherit_lag_state(&mut by_index);
    by_index.into_values().collect()
}

/// LAG children carry their parent's VLAN and forwarding state.
fn inherit_lag_state(ports: &mut BTreeMap<u32, Port>) {
    let inherited: Vec<(u32, EffectivePortConfig)> = ports
        .values()
        .filter(|p| p.is_lag_child)
        .filter_map(|child| {
            let parent = ports.get(&child.aggregated_by?)?;
            Some((child.index, parent.effective.clone()))
        })
        .collect();

    for (index, parent) in inherited {
        if let Some(child) = ports.get_mut(&index) {
            let eff = &mut child.effective;
            eff.forward = parent.forward;
            eff.native_network_id = parent.native_network_id;
            eff.native_vlan = parent.native_vlan;
            eff.excluded_network_ids = parent.excluded_network_ids;
            eff.tagged_vlan_mgmt = parent.tagged_vlan_mgmt;
            eff.tagged_vlans = parent.tagged_vlans;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForwardMode, NetworkPurpose, SettingsSource};
    use serde_json::json;

    fn networks() -> Vec<Network> {
        vec![
            Network {
                id: "lan".into(),
                name: "LAN".into(),
                purpose: NetworkPurpose::Home,
                enabled: true,
                vlan_id: None,
            },
            Network {
                id: "iot".into(),
                name: "IoT".into(),
                purpose: NetworkPurpose::IoT,
                enabled: true,
                vlan_id: Some(30),
            },
        ]
    }

    fn ports(n: u32) -> Vec<Value> {
        (1..=n)
            .map(|i| json!({ "port_idx": i, "up": true, "speed": 1000, "native_networkconf_id": "lan" }))
            .collect()
    }

    fn run(devices: &[Value]) -> Topology {
        extract(devices, &networks(), &[], &GlobalSwitchSettings::default())
    }

    #[test]
    fn classifies_roles() {
        let topo = run(&[
            json!({ "mac": "00:00:00:00:00:01", "type": "udm", "wan1": { "ip": "1.2.3.4" }, "port_table": ports(4) }),
            json!({ "mac": "00:00:00:00:00:02", "type": "usw", "port_table": ports(8) }),
            json!({ "mac": "00:00:00:00:00:03", "type": "uap", "port_table": ports(5) }),
        ]);
        let roles: Vec<DeviceRole> = topo.switches.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            [DeviceRole::Gateway, DeviceRole::Switch, DeviceRole::AccessPoint]
        );
        assert_eq!(topo.gateway().map(|g| g.mac.as_str()), Some("00:00:00:00:00:01"));
    }

    #[test]
    fn passthrough_ap_is_dropped() {
        let topo = run(&[json!({
            "mac": "00:00:00:00:00:03",
            "radio_table": [{ "radio": "ng" }],
            "port_table": ports(2)
        })]);
        assert!(topo.switches.is_empty());
        assert_eq!(topo.skipped[0].reason, SkipReason::PassthroughAccessPoint);
    }

    #[test]
    fn wan_port_marks_gateway_and_is_unmanageable() {
        let mut table = ports(3);
        table.push(json!({ "port_idx": 4, "up": true, "network_name": "WAN" }));
        let topo = run(&[json!({ "mac": "00:00:00:00:00:01", "port_table": table })]);
        let gw = &topo.switches[0];
        assert_eq!(gw.role, DeviceRole::Gateway);
        let wan = gw.port(4).map(|p| (p.is_wan, p.manageable));
        assert_eq!(wan, Some((true, false)));
        assert_eq!(gw.manageable_ports().count(), 3);
    }

    #[test]
    fn gateway_uplinked_to_known_device_is_mesh_ap() {
        let topo = run(&[
            json!({ "mac": "00:00:00:00:00:01", "wan1": {}, "port_table": ports(4) }),
            json!({
                "mac": "00:00:00:00:00:09",
                "wan1": {},
                "uplink": { "uplink_mac": "00:00:00:00:00:01", "type": "wireless" },
                "port_table": ports(4)
            }),
        ]);
        let mesh = topo.switch(&MacAddress::new("00:00:00:00:00:09"));
        assert_eq!(mesh.map(|s| (s.role, s.mesh_backhaul)), Some((DeviceRole::AccessPoint, true)));
        assert_eq!(topo.switches.iter().filter(|s| s.role == DeviceRole::Gateway).count(), 1);
    }

    #[test]
    fn lag_children_detected_and_inherit_parent() {
        let topo = run(&[json!({
            "mac": "00:00:00:00:00:02",
            "port_table": [
                { "port_idx": 1, "up": true, "forward": "all", "native_networkconf_id": "lan", "aggregated_by": false },
                { "port_idx": 2, "up": false, "forward": "native", "aggregated_by": 1 },
                { "port_idx": 3, "up": true, "aggregated_by": "3" },
                { "port_idx": 4, "up": true, "aggregated_by": "false" }
            ]
        })]);
        let sw = &topo.switches[0];
        let flags: Vec<bool> = sw.ports.iter().map(|p| p.is_lag_child).collect();
        assert_eq!(flags, [false, true, false, false]);
        assert!(sw.is_lag_parent(1));

        let child = sw.port(2).map(|p| p.effective.clone()).unwrap_or_default();
        assert_eq!(child.forward, ForwardMode::All);
        assert_eq!(child.tagged_vlans, BTreeSet::from([30]));
    }

    #[test]
    fn port_overrides_apply_before_profiles() {
        let topo = run(&[json!({
            "mac": "00:00:00:00:00:02",
            "port_table": [{ "port_idx": 1, "up": true, "forward": "native" }],
            "port_overrides": [{ "port_idx": 1, "forward": "disabled", "name": "Spare" }]
        })]);
        let port = &topo.switches[0].ports[0];
        assert_eq!(port.effective.forward, ForwardMode::Disabled);
        assert_eq!(port.name.as_deref(), Some("Spare"));
    }

    #[test]
    fn malformed_records_skipped_others_kept() {
        let topo = run(&[
            json!("not a device"),
            json!({ "name": "no mac", "port_table": ports(2) }),
            json!({ "mac": "00:00:00:00:00:05", "port_table": [] }),
            json!({ "mac": "00:00:00:00:00:06", "port_table": "garbage", "uplink": 7 }),
            json!({ "mac": "00:00:00:00:00:02", "port_table": ports(2) }),
        ]);
        assert_eq!(topo.switches.len(), 1);
        let reasons: Vec<SkipReason> = topo.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            [
                SkipReason::Malformed,
                SkipReason::MissingMac,
                SkipReason::NoPorts,
                SkipReason::NoPorts
            ]
        );
    }

    #[test]
    fn infrastructure_links_resolved() {
        let topo = run(&[
            json!({ "mac": "00:00:00:00:00:01", "port_table": ports(4) }),
            json!({
                "mac": "00:00:00:00:00:02",
                "uplink": { "uplink_mac": "00:00:00:00:00:01", "uplink_remote_port": 3, "port_idx": 1 },
                "port_table": ports(4)
            }),
        ]);
        let links = topo.infrastructure_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].upstream_port.index, 3);
        assert_eq!(links[0].downstream_port.index, 1);
        assert!(links[0].downstream_port.is_uplink);

        let infra = topo.infrastructure_ports();
        assert!(infra.contains(&(MacAddress::new("00:00:00:00:00:01"), 3)));
        assert!(infra.contains(&(MacAddress::new("00:00:00:00:00:02"), 1)));
    }

    #[test]
    fn excluded_device_keeps_own_switch_settings() {
        let global = GlobalSwitchSettings {
            jumbo_frames: Some(true),
            flow_control: Some(true),
            exclusions: BTreeSet::from([MacAddress::new("00:00:00:00:00:02")]),
        };
        let topo = extract(
            &[
                json!({ "mac": "00:00:00:00:00:01", "port_table": ports(2) }),
                json!({ "mac": "00:00:00:00:00:02", "jumboframe_enabled": false, "port_table": ports(2) }),
            ],
            &networks(),
            &[],
            &global,
        );
        let settings: Vec<(bool, SettingsSource)> = topo
            .switches
            .iter()
            .map(|s| (s.settings.jumbo_frames, s.settings.source))
            .collect();
        assert_eq!(
            settings,
            [(true, SettingsSource::Global), (false, SettingsSource::Device)]
        );
    }
}
