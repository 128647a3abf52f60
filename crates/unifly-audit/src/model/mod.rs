// ── Audit domain model ──
//
// Canonical, typed view of one controller snapshot. Everything here is
// built once per pass by the topology extractor and never mutated.

pub mod ids;

pub mod device;
pub mod finding;
pub mod firewall;
pub mod network;
pub mod port;
pub mod profile;
pub mod settings;

// ── Re-exports ──────────────────────────────────────────────────────

pub use ids::{MacAddress, ids_match};

pub use device::{
    DeviceCapabilities, DeviceRole, EffectiveSwitchSettings, SettingsSource, Switch, Uplink,
};
pub use finding::{AffectedEntity, AuditReport, FailedRule, Finding, FindingKind, Severity};
pub use firewall::{FirewallAction, FirewallRule, MatchTarget};
pub use network::{Network, NetworkPurpose, find_network};
pub use port::{
    Dot1xControl, EffectivePortConfig, ForwardMode, PoeMode, PoeState, Port, PortSettings,
    TaggedVlanMgmt,
};
pub use profile::{PortProfile, find_profile};
pub use settings::GlobalSwitchSettings;
