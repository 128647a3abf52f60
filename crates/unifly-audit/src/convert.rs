// ── Raw-to-domain conversions ──
//
// Bridges raw snapshot records into canonical `model` types. Enum-valued
// strings are parsed leniently: an unknown value reads as absent. Records
// without identity are rejected with a reason so the caller can log it.

use serde_json::Value;

use crate::model::{
    DeviceCapabilities, FirewallAction, FirewallRule, GlobalSwitchSettings, MacAddress,
    MatchTarget, Network, PortProfile, PortSettings, Uplink, network::classify_purpose,
};
use crate::snapshot::{
    RawDevice, RawFirewallRule, RawGlobalSwitch, RawNetwork, RawPort, RawPortProfile, RawTarget,
    RawUplink, value_as_u32,
};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_enum<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn macs(raw: Option<&[String]>) -> Vec<MacAddress> {
    raw.map(|list| list.iter().map(MacAddress::new).collect())
        .unwrap_or_default()
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

/// LAG parent reference: `false` / `"false"` mark "not aggregated".
pub(crate) fn aggregated_by(raw: &Value) -> Option<u32> {
    match raw {
        Value::Bool(_) | Value::Null => None,
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => None,
        other => value_as_u32(other),
    }
}

// ── Network ────────────────────────────────────────────────────────

impl TryFrom<RawNetwork> for Network {
    type Error = String;

    fn try_from(raw: RawNetwork) -> Result<Self, Self::Error> {
        let id = non_blank(raw.id).ok_or("missing _id")?;
        let name = non_blank(raw.name).unwrap_or_else(|| id.clone());
        let vlan_id = if raw.vlan_enabled == Some(false) {
            None
        } else {
            raw.vlan
                .filter(|v| (1..=4094).contains(v))
                .and_then(|v| u16::try_from(v).ok())
        };
        Ok(Self {
            purpose: classify_purpose(raw.purpose.as_deref(), &name),
            id,
            name,
            enabled: raw.enabled.unwrap_or(true),
            vlan_id,
        })
    }
}

// ── Port profile ───────────────────────────────────────────────────

impl TryFrom<RawPortProfile> for PortProfile {
    type Error = String;

    fn try_from(raw: RawPortProfile) -> Result<Self, Self::Error> {
        let name = non_blank(raw.name);
        let id = non_blank(raw.id)
            .or_else(|| name.clone())
            .ok_or("missing _id and name")?;
        Ok(Self {
            name: name.unwrap_or_else(|| id.clone()),
            id,
            forward: raw.forward,
            native_network_id: non_blank(raw.native_networkconf_id),
            excluded_network_ids: raw.excluded_networkconf_ids,
            tagged_vlan_mgmt: parse_enum(raw.tagged_vlan_mgmt.as_deref()),
            poe_mode: parse_enum(raw.poe_mode.as_deref()),
            autoneg: raw.autoneg,
            speed_mbps: raw.speed,
            port_security_enabled: raw.port_security_enabled,
            port_security_macs: raw
                .port_security_mac_address
                .as_ref()
                .map(|list| list.iter().map(MacAddress::new).collect()),
            isolation: raw.isolation,
            dot1x_ctrl: parse_enum(raw.dot1x_ctrl.as_deref()),
        })
    }
}

// ── Firewall ───────────────────────────────────────────────────────

/// Absent or empty payloads are the permissive `Any`.
fn match_target(raw: Option<&RawTarget>) -> MatchTarget {
    let Some(raw) = raw else {
        return MatchTarget::Any;
    };
    let kind = raw
        .matching_target
        .as_deref()
        .map(|k| k.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let payload = |v: &Option<Vec<String>>| v.clone().filter(|v| !v.is_empty());

    match kind.as_str() {
        "" | "any" => MatchTarget::Any,
        "network" | "networks" => payload(&raw.network_ids).map_or(MatchTarget::Any, MatchTarget::Networks),
        "ip" | "ips" => payload(&raw.ips).map_or(MatchTarget::Any, MatchTarget::Ips),
        "domain" | "domains" | "web" => {
            payload(&raw.domains).map_or(MatchTarget::Any, MatchTarget::Domains)
        }
        other => MatchTarget::Other {
            kind: other.to_owned(),
            values: raw.values.clone().unwrap_or_default(),
        },
    }
}

impl TryFrom<RawFirewallRule> for FirewallRule {
    type Error = String;

    fn try_from(raw: RawFirewallRule) -> Result<Self, Self::Error> {
        let id = non_blank(raw.id).ok_or("missing _id")?;
        let action: FirewallAction = parse_enum(raw.action.as_deref())
            .ok_or_else(|| format!("unknown action {:?}", raw.action.unwrap_or_default()))?;
        Ok(Self {
            name: non_blank(raw.name).unwrap_or_else(|| id.clone()),
            id,
            enabled: raw.enabled.unwrap_or(true),
            action,
            index: raw.index.unwrap_or_default(),
            protocol: non_blank(raw.protocol),
            icmp_type: non_blank(raw.icmp_typename),
            source: match_target(raw.source.as_ref()),
            destination: match_target(raw.destination.as_ref()),
            destination_ports: raw.destination.as_ref().and_then(|d| non_blank(d.port.clone())),
            source_zone: raw.source.as_ref().and_then(|s| non_blank(s.zone_id.clone())),
            destination_zone: raw
                .destination
                .as_ref()
                .and_then(|d| non_blank(d.zone_id.clone())),
        })
    }
}

// ── Settings ───────────────────────────────────────────────────────

impl From<RawGlobalSwitch> for GlobalSwitchSettings {
    fn from(raw: RawGlobalSwitch) -> Self {
        Self {
            jumbo_frames: raw.jumboframe_enabled,
            flow_control: raw.flowctrl_enabled,
            exclusions: macs(raw.switch_exclusions.as_deref()).into_iter().collect(),
        }
    }
}

// ── Device pieces ──────────────────────────────────────────────────

impl From<&RawUplink> for Uplink {
    fn from(raw: &RawUplink) -> Self {
        let wireless = raw.is_wireless.unwrap_or(false)
            || raw
                .link_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("wireless"));
        Self {
            mac: raw.uplink_mac.as_deref().map(MacAddress::new),
            remote_port: raw.uplink_remote_port,
            local_port: raw.port_idx,
            wireless,
        }
    }
}

pub(crate) fn capabilities(raw: &RawDevice) -> DeviceCapabilities {
    DeviceCapabilities {
        max_aggregate_sessions: raw.switch_caps.as_ref().and_then(|c| c.max_aggregate_sessions),
        max_mirror_sessions: raw.switch_caps.as_ref().and_then(|c| c.max_mirror_sessions),
        total_max_power_watts: raw.total_max_power,
    }
}

/// Configuration of one port with its `port_overrides` entry layered on top.
///
/// Any field the override defines replaces the `port_table` value. The
/// override's `speed` is a forced speed; in `port_table` it is the current
/// link speed and only counts as forced when autoneg is off.
pub(crate) fn port_settings(port: &RawPort, over: Option<&RawPort>) -> PortSettings {
    fn pick<T>(over: Option<&RawPort>, port: &RawPort, f: impl Fn(&RawPort) -> Option<T>) -> Option<T> {
        over.and_then(&f).or_else(|| f(port))
    }

    let autoneg = pick(over, port, |p| p.autoneg);
    let speed_mbps = over.and_then(|o| o.speed).or_else(|| {
        if autoneg == Some(false) {
            port.speed.filter(|s| *s > 0)
        } else {
            None
        }
    });

    PortSettings {
        forward: pick(over, port, |p| non_blank(p.forward.clone())),
        native_network_id: pick(over, port, |p| non_blank(p.native_networkconf_id.clone())),
        excluded_network_ids: pick(over, port, |p| p.excluded_networkconf_ids.clone())
            .unwrap_or_default(),
        tagged_vlan_mgmt: pick(over, port, |p| parse_enum(p.tagged_vlan_mgmt.as_deref())),
        poe_mode: pick(over, port, |p| parse_enum(p.poe_mode.as_deref())),
        autoneg,
        speed_mbps,
        port_security_enabled: pick(over, port, |p| p.port_security_enabled).unwrap_or(false),
        port_security_macs: macs(pick(over, port, |p| p.port_security_mac_address.clone()).as_deref()),
        isolation: pick(over, port, |p| p.isolation).unwrap_or(false),
        dot1x_ctrl: pick(over, port, |p| parse_enum(p.dot1x_ctrl.as_deref())),
        profile_id: pick(over, port, |p| non_blank(p.portconf_id.clone())),
    }
}
