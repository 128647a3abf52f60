// ── Port domain types ──
//
// A port carries two layers: `settings` is the raw configuration after
// the device's own `port_overrides` were applied, `effective` is the
// result of merging the referenced port profile on top (see `resolve`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::ids::MacAddress;

/// How a switch port forwards VLAN traffic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ForwardMode {
    /// Untagged on the native network only.
    #[default]
    #[strum(serialize = "native")]
    Native,
    /// Native network untagged, every other network tagged.
    #[strum(serialize = "all")]
    All,
    /// Native network untagged, tagged set chosen per port.
    #[strum(to_string = "custom", serialize = "customize")]
    Custom,
    #[strum(serialize = "disabled")]
    Disabled,
}

impl ForwardMode {
    /// Normalize a raw controller value. Synonyms collapse onto one variant;
    /// unknown or absent values resolve to `Native`.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// Which tagged VLANs a trunk carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TaggedVlanMgmt {
    /// Every network tagged.
    Auto,
    /// No tagged networks.
    BlockAll,
    /// Every network except the excluded list.
    Custom,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum PoeMode {
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "off")]
    Off,
    #[strum(serialize = "pasv24")]
    Passive24,
    #[strum(serialize = "passthrough")]
    Passthrough,
}

/// 802.1x port control mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Dot1xControl {
    ForceAuthorized,
    ForceUnauthorized,
    Auto,
    MacBased,
    MultiHost,
}

impl Dot1xControl {
    /// Modes that require a supplicant (or MAC) to authenticate.
    pub fn is_enforcing(self) -> bool {
        matches!(self, Self::Auto | Self::MacBased | Self::MultiHost)
    }
}

/// Physical PoE state of a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoeState {
    /// The port hardware can source power at all.
    pub capable: bool,
    /// Power output is currently enabled.
    pub enabled: bool,
}

impl PoeState {
    pub fn is_powering(self) -> bool {
        self.capable && self.enabled
    }
}

/// Raw configurable port values, before profile resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct PortSettings {
    pub forward: Option<String>,
    pub native_network_id: Option<String>,
    pub excluded_network_ids: Vec<String>,
    pub tagged_vlan_mgmt: Option<TaggedVlanMgmt>,
    pub poe_mode: Option<PoeMode>,
    pub autoneg: Option<bool>,
    /// Forced link speed; only meaningful when autoneg is off.
    pub speed_mbps: Option<u32>,
    pub port_security_enabled: bool,
    pub port_security_macs: Vec<MacAddress>,
    pub isolation: bool,
    pub dot1x_ctrl: Option<Dot1xControl>,
    pub profile_id: Option<String>,
}

impl PortSettings {
    /// Autoneg as the port itself is configured (absent means on).
    pub fn uses_autoneg(&self) -> bool {
        self.autoneg.unwrap_or(true)
    }
}

/// Resolved port configuration. Built once by the resolver, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct EffectivePortConfig {
    /// Profile that was actually found and applied.
    pub profile_id: Option<String>,
    pub forward: ForwardMode,
    pub native_network_id: Option<String>,
    pub native_vlan: Option<u16>,
    pub excluded_network_ids: BTreeSet<String>,
    pub tagged_vlan_mgmt: Option<TaggedVlanMgmt>,
    /// VLAN ids carried tagged on the port.
    pub tagged_vlans: BTreeSet<u16>,
    pub poe_mode: Option<PoeMode>,
    pub autoneg: bool,
    pub forced_speed_mbps: Option<u32>,
    pub port_security_enabled: bool,
    pub allowed_macs: Vec<MacAddress>,
    pub isolation: bool,
    pub dot1x_protected: bool,
}

impl EffectivePortConfig {
    pub fn is_disabled(&self) -> bool {
        self.forward == ForwardMode::Disabled
    }

    /// Untagged single-network port.
    pub fn is_access(&self) -> bool {
        self.forward == ForwardMode::Native
    }

    pub fn is_trunk(&self) -> bool {
        matches!(self.forward, ForwardMode::All | ForwardMode::Custom)
    }

    /// Trunk with no VLAN pruning at all.
    pub fn tags_all_vlans(&self) -> bool {
        match self.forward {
            ForwardMode::All => true,
            ForwardMode::Custom => match self.tagged_vlan_mgmt {
                Some(TaggedVlanMgmt::Auto) => true,
                Some(TaggedVlanMgmt::BlockAll) => false,
                Some(TaggedVlanMgmt::Custom) | None => self.excluded_network_ids.is_empty(),
            },
            ForwardMode::Native | ForwardMode::Disabled => false,
        }
    }

    pub fn is_mac_restricted(&self) -> bool {
        self.port_security_enabled && !self.allowed_macs.is_empty()
    }

    /// 802.1x control counts as protected on its own.
    pub fn is_protected(&self) -> bool {
        self.dot1x_protected || self.is_mac_restricted()
    }
}

/// A switch port with raw and effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Port {
    pub index: u32,
    pub name: Option<String>,
    pub up: bool,
    pub media: Option<String>,
    /// Current negotiated link speed; absent when the link is down.
    pub speed_mbps: Option<u32>,
    pub poe: PoeState,
    pub is_uplink: bool,
    pub is_wan: bool,
    /// Index of the LAG parent when this port is aggregated into another.
    pub aggregated_by: Option<u32>,
    pub is_lag_child: bool,
    pub manageable: bool,
    pub settings: PortSettings,
    pub effective: EffectivePortConfig,
}

impl Port {
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => format!("{name} (#{})", self.index),
            _ => format!("Port {}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_mode_synonyms() {
        assert_eq!(ForwardMode::normalize(Some("customize")), ForwardMode::Custom);
        assert_eq!(ForwardMode::normalize(Some("Custom")), ForwardMode::Custom);
        assert_eq!(ForwardMode::normalize(Some("ALL")), ForwardMode::All);
        assert_eq!(ForwardMode::normalize(Some("disabled")), ForwardMode::Disabled);
    }

    #[test]
    fn forward_mode_defaults_to_native() {
        assert_eq!(ForwardMode::normalize(None), ForwardMode::Native);
        assert_eq!(ForwardMode::normalize(Some("bogus")), ForwardMode::Native);
    }

    #[test]
    fn forward_mode_displays_canonical_name() {
        assert_eq!(ForwardMode::Custom.to_string(), "custom");
    }

    #[test]
    fn tagged_mgmt_parses_snake_case() {
        assert_eq!("block_all".parse::<TaggedVlanMgmt>().ok(), Some(TaggedVlanMgmt::BlockAll));
        assert_eq!("AUTO".parse::<TaggedVlanMgmt>().ok(), Some(TaggedVlanMgmt::Auto));
    }

    #[test]
    fn dot1x_enforcing_modes() {
        assert!(Dot1xControl::Auto.is_enforcing());
        assert!(Dot1xControl::MacBased.is_enforcing());
        assert!(!Dot1xControl::ForceAuthorized.is_enforcing());
    }

    #[test]
    fn custom_trunk_with_empty_exclusions_tags_everything() {
        let cfg = EffectivePortConfig {
            forward: ForwardMode::Custom,
            ..EffectivePortConfig::default()
        };
        assert!(cfg.tags_all_vlans());

        let pruned = EffectivePortConfig {
            forward: ForwardMode::Custom,
            excluded_network_ids: BTreeSet::from(["iot".to_owned()]),
            ..EffectivePortConfig::default()
        };
        assert!(!pruned.tags_all_vlans());
    }

    #[test]
    fn dot1x_counts_as_protected_without_mac_list() {
        let cfg = EffectivePortConfig {
            dot1x_protected: true,
            ..EffectivePortConfig::default()
        };
        assert!(cfg.is_protected());
        assert!(!cfg.is_mac_restricted());
    }
}
