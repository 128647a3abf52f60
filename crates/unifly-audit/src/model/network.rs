// ── Network domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::ids::ids_match;

/// Audit-level purpose of a network.
///
/// The controller only distinguishes corporate / guest / wan / vpn;
/// the finer classes are inferred from the network name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NetworkPurpose {
    Home,
    Corporate,
    #[strum(serialize = "iot")]
    #[serde(rename = "iot")]
    IoT,
    Security,
    Guest,
    Management,
    Wan,
    Vpn,
}

impl NetworkPurpose {
    /// WAN and VPN networks are never carried on switch trunks.
    pub fn is_trunkable(self) -> bool {
        !matches!(self, Self::Wan | Self::Vpn)
    }

    /// Networks whose access ports deserve MAC restriction or 802.1x.
    pub fn is_sensitive(self) -> bool {
        matches!(self, Self::Security | Self::Management)
    }
}

/// The canonical Network type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub purpose: NetworkPurpose,
    pub enabled: bool,
    /// `None` for the untagged default LAN.
    pub vlan_id: Option<u16>,
}

impl Network {
    /// VLAN the network rides on; the untagged default LAN is VLAN 1.
    pub fn effective_vlan(&self) -> u16 {
        self.vlan_id.unwrap_or(1)
    }
}

/// Look up a network by controller id, ignoring case.
pub fn find_network<'a>(networks: &'a [Network], id: &str) -> Option<&'a Network> {
    networks.iter().find(|n| ids_match(&n.id, id))
}

/// Infer the audit purpose from the controller `purpose` field and the name.
pub(crate) fn classify_purpose(purpose: Option<&str>, name: &str) -> NetworkPurpose {
    let purpose = purpose.map(str::to_ascii_lowercase);
    match purpose.as_deref() {
        Some("wan") => return NetworkPurpose::Wan,
        Some("remote-user-vpn" | "site-vpn" | "vpn-client" | "vpn") => return NetworkPurpose::Vpn,
        Some("guest") => return NetworkPurpose::Guest,
        _ => {}
    }

    let lower = name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["guest", "visitor"]) {
        NetworkPurpose::Guest
    } else if has(&["iot", "smart", "automation"]) {
        NetworkPurpose::IoT
    } else if has(&["security", "camera", "cctv", "nvr", "protect", "surveillance"]) {
        NetworkPurpose::Security
    } else if has(&["mgmt", "management", "infra"]) {
        NetworkPurpose::Management
    } else if has(&["home", "family", "default"]) {
        NetworkPurpose::Home
    } else {
        NetworkPurpose::Corporate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_purpose_wins_for_wan_and_vpn() {
        assert_eq!(classify_purpose(Some("wan"), "Home WAN"), NetworkPurpose::Wan);
        assert_eq!(
            classify_purpose(Some("remote-user-vpn"), "Road Warrior"),
            NetworkPurpose::Vpn
        );
        assert_eq!(classify_purpose(Some("guest"), "Lobby"), NetworkPurpose::Guest);
    }

    #[test]
    fn name_heuristics() {
        assert_eq!(classify_purpose(Some("corporate"), "IoT Devices"), NetworkPurpose::IoT);
        assert_eq!(classify_purpose(Some("corporate"), "Cameras"), NetworkPurpose::Security);
        assert_eq!(classify_purpose(None, "MGMT"), NetworkPurpose::Management);
        assert_eq!(classify_purpose(None, "Default"), NetworkPurpose::Home);
        assert_eq!(classify_purpose(None, "Office"), NetworkPurpose::Corporate);
    }

    #[test]
    fn trunkable_excludes_wan_and_vpn() {
        assert!(!NetworkPurpose::Wan.is_trunkable());
        assert!(!NetworkPurpose::Vpn.is_trunkable());
        assert!(NetworkPurpose::IoT.is_trunkable());
    }

    #[test]
    fn purpose_display_is_snake_case() {
        assert_eq!(NetworkPurpose::IoT.to_string(), "iot");
        assert_eq!(NetworkPurpose::Management.to_string(), "management");
    }
}
