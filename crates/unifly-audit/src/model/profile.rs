// ── Port profile domain types ──

use serde::{Deserialize, Serialize};

use super::ids::{MacAddress, ids_match};
use super::port::{Dot1xControl, PoeMode, TaggedVlanMgmt};

/// Named, reusable bundle of port overrides.
///
/// Every override is optional: `None` means "the profile does not set this
/// field" and the port's own value stands. `excluded_network_ids` keeps the
/// distinction between an absent list and `Some(vec![])`, which replaces the
/// port's list with "allow all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortProfile {
    pub id: String,
    pub name: String,
    pub forward: Option<String>,
    pub native_network_id: Option<String>,
    pub excluded_network_ids: Option<Vec<String>>,
    pub tagged_vlan_mgmt: Option<TaggedVlanMgmt>,
    pub poe_mode: Option<PoeMode>,
    pub autoneg: Option<bool>,
    pub speed_mbps: Option<u32>,
    pub port_security_enabled: Option<bool>,
    pub port_security_macs: Option<Vec<MacAddress>>,
    pub isolation: Option<bool>,
    pub dot1x_ctrl: Option<Dot1xControl>,
}

impl PortProfile {
    /// The profile pins a link speed instead of negotiating.
    pub fn forced_speed(&self) -> Option<u32> {
        match (self.autoneg, self.speed_mbps) {
            (Some(false), Some(speed)) => Some(speed),
            _ => None,
        }
    }

    pub fn forces_poe_off(&self) -> bool {
        self.poe_mode == Some(PoeMode::Off)
    }
}

/// Find a profile by id, falling back to its name. Both case-insensitive.
pub fn find_profile<'a>(profiles: &'a [PortProfile], reference: &str) -> Option<&'a PortProfile> {
    profiles
        .iter()
        .find(|p| ids_match(&p.id, reference))
        .or_else(|| profiles.iter().find(|p| ids_match(&p.name, reference)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> PortProfile {
        PortProfile {
            id: id.into(),
            name: name.into(),
            ..PortProfile::default()
        }
    }

    #[test]
    fn lookup_prefers_id_then_name() {
        let profiles = vec![profile("aa01", "Cameras"), profile("aa02", "aa01")];
        assert_eq!(find_profile(&profiles, "AA01").map(|p| p.name.as_str()), Some("Cameras"));
        assert_eq!(find_profile(&profiles, "cameras").map(|p| p.id.as_str()), Some("aa01"));
        assert!(find_profile(&profiles, "missing").is_none());
    }

    #[test]
    fn forced_speed_requires_autoneg_off() {
        let mut p = profile("x", "x");
        p.speed_mbps = Some(1000);
        assert_eq!(p.forced_speed(), None);
        p.autoneg = Some(false);
        assert_eq!(p.forced_speed(), Some(1000));
    }
}
