//! Effective port configuration.
//!
//! A port's effective configuration is a pure function of its raw settings
//! (device overrides already applied), the port profile it references, and
//! the network list. Each field has its own merge rule; see
//! [`PortResolver::resolve_with`].

use std::collections::BTreeSet;

use crate::model::{
    EffectivePortConfig, EffectiveSwitchSettings, ForwardMode, GlobalSwitchSettings, MacAddress,
    Network, PortProfile, PortSettings, SettingsSource, TaggedVlanMgmt, find_network,
    find_profile, ids_match,
};

/// Read-only resolver over one pass's profiles and networks.
#[derive(Debug, Clone, Copy)]
pub struct PortResolver<'a> {
    profiles: &'a [PortProfile],
    networks: &'a [Network],
}

impl<'a> PortResolver<'a> {
    pub fn new(profiles: &'a [PortProfile], networks: &'a [Network]) -> Self {
        Self { profiles, networks }
    }

    /// Resolve a port through the profile it references, if that profile
    /// exists. Unknown references fall back to the raw settings.
    pub fn resolve(&self, settings: &PortSettings) -> EffectivePortConfig {
        let profile = settings.profile_id.as_deref().and_then(|reference| {
            let found = find_profile(self.profiles, reference);
            if found.is_none() {
                tracing::debug!(profile = reference, "unknown port profile, using port settings");
            }
            found
        });
        self.resolve_with(settings, profile)
    }

    /// Merge `profile` on top of `settings`.
    ///
    /// Every profile field wins when the profile defines it. The excluded
    /// list is the one field where "defined but empty" matters: it replaces
    /// the port's list with "allow all".
    pub fn resolve_with(
        &self,
        settings: &PortSettings,
        profile: Option<&PortProfile>,
    ) -> EffectivePortConfig {
        let forward = ForwardMode::normalize(
            profile
                .and_then(|p| p.forward.as_deref())
                .filter(|f| !f.trim().is_empty())
                .or(settings.forward.as_deref()),
        );

        let native_network_id = profile
            .and_then(|p| p.native_network_id.clone())
            .or_else(|| settings.native_network_id.clone());

        let excluded_network_ids: BTreeSet<String> =
            match profile.and_then(|p| p.excluded_network_ids.as_ref()) {
                Some(list) => normalize_ids(list),
                None => normalize_ids(&settings.excluded_network_ids),
            };

        let tagged_vlan_mgmt = profile
            .and_then(|p| p.tagged_vlan_mgmt)
            .or(settings.tagged_vlan_mgmt);

        let autoneg = profile
            .and_then(|p| p.autoneg)
            .or(settings.autoneg)
            .unwrap_or(true);
        let forced_speed_mbps = if autoneg {
            None
        } else {
            profile.and_then(|p| p.speed_mbps).or(settings.speed_mbps)
        };

        let (port_security_enabled, allowed_macs) =
            match profile.and_then(|p| p.port_security_enabled) {
                Some(enabled) => (
                    enabled,
                    profile
                        .and_then(|p| p.port_security_macs.clone())
                        .unwrap_or_default(),
                ),
                None => (
                    settings.port_security_enabled,
                    settings.port_security_macs.clone(),
                ),
            };

        let isolation = profile
            .and_then(|p| p.isolation)
            .unwrap_or(settings.isolation);

        let dot1x_protected = profile
            .and_then(|p| p.dot1x_ctrl)
            .or(settings.dot1x_ctrl)
            .is_some_and(|c| c.is_enforcing());

        let native_vlan = native_network_id
            .as_deref()
            .and_then(|id| find_network(self.networks, id))
            .map(Network::effective_vlan);

        let tagged_vlans = self.tagged_vlans(
            forward,
            tagged_vlan_mgmt,
            &excluded_network_ids,
            native_vlan,
        );

        EffectivePortConfig {
            profile_id: profile.map(|p| p.id.clone()),
            forward,
            native_network_id,
            native_vlan,
            excluded_network_ids,
            tagged_vlan_mgmt,
            tagged_vlans,
            poe_mode: profile.and_then(|p| p.poe_mode).or(settings.poe_mode),
            autoneg,
            forced_speed_mbps,
            port_security_enabled,
            allowed_macs,
            isolation,
            dot1x_protected,
        }
    }

    /// Resolve an empty port through `profile`: the profile's own settings.
    pub fn resolve_profile(&self, profile: &PortProfile) -> EffectivePortConfig {
        self.resolve_with(&PortSettings::default(), Some(profile))
    }

    /// VLAN ids that can ride a trunk: enabled, tagged, not WAN or VPN.
    pub fn trunkable_vlans(&self) -> impl Iterator<Item = (&'a Network, u16)> {
        self.networks
            .iter()
            .filter(|n| n.enabled && n.purpose.is_trunkable())
            .filter_map(|n| n.vlan_id.map(|v| (n, v)))
    }

    fn tagged_vlans(
        &self,
        forward: ForwardMode,
        mgmt: Option<TaggedVlanMgmt>,
        excluded: &BTreeSet<String>,
        native_vlan: Option<u16>,
    ) -> BTreeSet<u16> {
        let all = || self.trunkable_vlans();
        let mut tagged: BTreeSet<u16> = match (forward, mgmt) {
            (ForwardMode::Native | ForwardMode::Disabled, _)
            | (ForwardMode::Custom, Some(TaggedVlanMgmt::BlockAll)) => BTreeSet::new(),
            (ForwardMode::All, _) | (ForwardMode::Custom, Some(TaggedVlanMgmt::Auto)) => {
                all().map(|(_, v)| v).collect()
            }
            (ForwardMode::Custom, Some(TaggedVlanMgmt::Custom) | None) => all()
                .filter(|(n, _)| !excluded.iter().any(|id| ids_match(id, &n.id)))
                .map(|(_, v)| v)
                .collect(),
        };
        if let Some(native) = native_vlan {
            tagged.remove(&native);
        }
        tagged
    }
}

fn normalize_ids(ids: &[String]) -> BTreeSet<String> {
    ids.iter()
        .map(|id| id.trim().to_ascii_lowercase())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Jumbo frames and flow control for one device.
///
/// Devices in the global exclusion list keep their own values (absent
/// means off). Everyone else follows the global record, falling back to
/// the device's own value when the record omits a setting.
pub fn resolve_switch_settings(
    mac: &MacAddress,
    own_jumbo_frames: Option<bool>,
    own_flow_control: Option<bool>,
    global: &GlobalSwitchSettings,
) -> EffectiveSwitchSettings {
    if global.is_excluded(mac) {
        EffectiveSwitchSettings {
            jumbo_frames: own_jumbo_frames.unwrap_or(false),
            flow_control: own_flow_control.unwrap_or(false),
            source: SettingsSource::Device,
        }
    } else {
        EffectiveSwitchSettings {
            jumbo_frames: global.jumbo_frames.or(own_jumbo_frames).unwrap_or(false),
            flow_control: global.flow_control.or(own_flow_control).unwrap_or(false),
            source: SettingsSource::Global,
        }
    }
}
