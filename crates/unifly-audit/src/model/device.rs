// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::ids::MacAddress;
use super::port::Port;

/// Audit role of a managed device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceRole {
    Gateway,
    AccessPoint,
    Switch,
}

/// Hardware limits reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub max_aggregate_sessions: Option<u32>,
    pub max_mirror_sessions: Option<u32>,
    pub total_max_power_watts: Option<f64>,
}

/// Upstream link as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uplink {
    /// MAC of the upstream device.
    pub mac: Option<MacAddress>,
    /// Port index on the upstream device.
    pub remote_port: Option<u32>,
    /// Port index on this device.
    pub local_port: Option<u32>,
    pub wireless: bool,
}

/// Where the effective jumbo-frame / flow-control values came from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettingsSource {
    #[default]
    Global,
    /// Device is in the global exclusion list.
    Device,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSwitchSettings {
    pub jumbo_frames: bool,
    pub flow_control: bool,
    pub source: SettingsSource,
}

/// A managed device with switch ports: switches, gateways and
/// multi-port access points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub mac: MacAddress,
    pub name: Option<String>,
    pub model: Option<String>,
    pub role: DeviceRole,
    /// Gateway hardware acting as a wireless mesh AP.
    pub mesh_backhaul: bool,
    pub capabilities: DeviceCapabilities,
    pub uplink: Option<Uplink>,
    pub settings: EffectiveSwitchSettings,
    /// Ordered by port index.
    pub ports: Vec<Port>,
}

impl Switch {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.mac.as_str())
    }

    pub fn port(&self, index: u32) -> Option<&Port> {
        self.ports.iter().find(|p| p.index == index)
    }

    /// Local port carrying this device's wired uplink.
    pub fn uplink_port(&self) -> Option<u32> {
        self.uplink
            .as_ref()
            .filter(|u| !u.wireless)
            .and_then(|u| u.local_port)
            .or_else(|| self.ports.iter().find(|p| p.is_uplink).map(|p| p.index))
    }

    /// Ports that participate in configuration audits.
    pub fn manageable_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.manageable)
    }

    /// `true` when some other port is aggregated into this one.
    pub fn is_lag_parent(&self, index: u32) -> bool {
        self.ports.iter().any(|p| p.aggregated_by == Some(index))
    }
}
