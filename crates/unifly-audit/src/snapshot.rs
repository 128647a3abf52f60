// ── Controller snapshot ──
//
// A point-in-time dump of controller state as the acquisition layer wrote
// it. Records stay untyped until they are converted one by one, so a
// single malformed record never fails the whole pass. Field-level parsing
// is lenient: a value of the wrong type reads as absent.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuditError;
use crate::model::{FirewallRule, GlobalSwitchSettings, Network, PortProfile};

/// Raw snapshot. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub devices: Vec<Value>,
    pub networks: Vec<Value>,
    pub port_profiles: Vec<Value>,
    pub firewall_rules: Vec<Value>,
    /// Wireless clients; carried for the WiFi heuristics, not read by the core.
    pub clients: Vec<Value>,
    pub settings: Vec<Value>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self, AuditError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AuditError> {
        if !value.is_object() {
            return Err(AuditError::Snapshot {
                message: "top-level value must be a JSON object".into(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn networks(&self) -> Vec<Network> {
        parse_records::<RawNetwork, _>("network", &self.networks)
    }

    pub fn port_profiles(&self) -> Vec<PortProfile> {
        parse_records::<RawPortProfile, _>("port profile", &self.port_profiles)
    }

    pub fn firewall_rules(&self) -> Vec<FirewallRule> {
        parse_records::<RawFirewallRule, _>("firewall rule", &self.firewall_rules)
    }

    /// The `global_switch` settings record, or empty settings when absent.
    pub fn global_switch_settings(&self) -> GlobalSwitchSettings {
        self.settings
            .iter()
            .filter(|s| s.get("key").and_then(Value::as_str) == Some("global_switch"))
            .find_map(|s| serde_json::from_value::<RawGlobalSwitch>(s.clone()).ok())
            .map(GlobalSwitchSettings::from)
            .unwrap_or_default()
    }
}

/// Convert each record, skipping (and logging) those that do not parse or
/// lack identity.
fn parse_records<R, T>(what: &str, records: &[Value]) -> Vec<T>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = String>,
{
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let converted = serde_json::from_value::<R>(record.clone())
                .map_err(|e| e.to_string())
                .and_then(T::try_from);
            match converted {
                Ok(item) => Some(item),
                Err(reason) => {
                    tracing::warn!(index = i, %reason, "skipping {what} record");
                    None
                }
            }
        })
        .collect()
}

// ── Lenient field readers ───────────────────────────────────────────

/// Any value that does not deserialize as `T` reads as absent.
pub(crate) fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).ok())
}

/// Booleans as the controller emits them: `true`, `"true"`, `1`.
pub(crate) fn flag<'de, D>(de: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(value_as_flag(&value))
}

fn value_as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    }
}

/// Non-negative integers, also from numeric strings.
pub(crate) fn number<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(value_as_u32(&value))
}

pub(crate) fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Port specs arrive as strings or bare numbers.
pub(crate) fn port_spec<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// String lists, dropping non-string elements.
pub(crate) fn string_list<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

// ── Raw records ─────────────────────────────────────────────────────

/// One `stat/device` record.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawDevice {
    #[serde(default, deserialize_with = "lenient")]
    pub mac: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub wan1: Option<serde_json::Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub radio_table: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub port_table: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub port_overrides: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub uplink: Option<RawUplink>,
    #[serde(default, deserialize_with = "lenient")]
    pub switch_caps: Option<RawSwitchCaps>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_max_power: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub jumboframe_enabled: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub flowctrl_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUplink {
    #[serde(default, deserialize_with = "lenient")]
    pub uplink_mac: Option<String>,
    #[serde(default, deserialize_with = "number")]
    pub uplink_remote_port: Option<u32>,
    #[serde(default, deserialize_with = "number")]
    pub port_idx: Option<u32>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub link_type: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_wireless: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSwitchCaps {
    #[serde(default, deserialize_with = "number")]
    pub max_aggregate_sessions: Option<u32>,
    #[serde(default, deserialize_with = "number")]
    pub max_mirror_sessions: Option<u32>,
}

/// A `port_table` entry or a `port_overrides` entry. Overrides carry the
/// configuration fields only; `speed` there is the forced speed.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPort {
    #[serde(default, deserialize_with = "number")]
    pub port_idx: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub up: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Option<String>,
    #[serde(default, deserialize_with = "number")]
    pub speed: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub port_poe: Option<bool>,
    #[serde(default, deserialize_with = "number")]
    pub poe_caps: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub poe_enable: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub poe_mode: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_uplink: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub network_name: Option<String>,
    #[serde(default)]
    pub aggregated_by: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub forward: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub native_networkconf_id: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub excluded_networkconf_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub tagged_vlan_mgmt: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub autoneg: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub port_security_enabled: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub port_security_mac_address: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flag")]
    pub isolation: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub dot1x_ctrl: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub portconf_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawNetwork {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "number")]
    pub vlan: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub vlan_enabled: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPortProfile {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub forward: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub native_networkconf_id: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub excluded_networkconf_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub tagged_vlan_mgmt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub poe_mode: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub autoneg: Option<bool>,
    #[serde(default, deserialize_with = "number")]
    pub speed: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub port_security_enabled: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub port_security_mac_address: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flag")]
    pub isolation: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub dot1x_ctrl: Option<String>,
}

/// One side of a firewall rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawTarget {
    #[serde(default, deserialize_with = "lenient")]
    pub matching_target: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub network_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub ips: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub domains: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub values: Option<Vec<String>>,
    #[serde(default, deserialize_with = "port_spec")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub zone_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawFirewallRule {
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
    #[serde(default, alias = "rule_index", deserialize_with = "lenient")]
    pub index: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub icmp_typename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<RawTarget>,
    #[serde(default, deserialize_with = "lenient")]
    pub destination: Option<RawTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawGlobalSwitch {
    #[serde(default, deserialize_with = "flag")]
    pub jumboframe_enabled: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub flowctrl_enabled: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub switch_exclusions: Option<Vec<String>>,
}
