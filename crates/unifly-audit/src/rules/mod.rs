// ── Built-in audit rules ──
//
// Every rule reads one immutable `AuditContext` and returns findings.
// Rules never mutate the context; the engine owns isolation.

mod firewall;
mod ports;
mod profiles;
mod settings;
mod trunk;

pub use firewall::FirewallOverlapRule;
pub use ports::{EdgeTrunkRule, UnprotectedAccessRule, UnusedPortRule};
pub use profiles::ProfileConsolidationRule;
pub use settings::SwitchSettingsRule;
pub use trunk::TrunkConsistencyRule;

use crate::engine::RuleEngine;
use crate::model::{
    AffectedEntity, FirewallRule, GlobalSwitchSettings, Network, Port, PortProfile, Switch,
};
use crate::options::AuditOptions;
use crate::topology::Topology;

/// Read-only input shared by every rule in one pass.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub topology: Topology,
    pub networks: Vec<Network>,
    pub port_profiles: Vec<PortProfile>,
    pub firewall_rules: Vec<FirewallRule>,
    pub switch_settings: GlobalSwitchSettings,
    pub options: AuditOptions,
}

impl AuditContext {
    /// Manageable ports on every extracted device.
    pub fn ports(&self) -> impl Iterator<Item = (&Switch, &Port)> {
        self.topology
            .switches
            .iter()
            .flat_map(|s| s.manageable_ports().map(move |p| (s, p)))
    }
}

/// The full built-in rule set, in dispatch order.
pub fn default_rules() -> RuleEngine<AuditContext> {
    RuleEngine::new(vec![
        Box::new(UnusedPortRule),
        Box::new(EdgeTrunkRule),
        Box::new(UnprotectedAccessRule),
        Box::new(TrunkConsistencyRule),
        Box::new(ProfileConsolidationRule),
        Box::new(FirewallOverlapRule),
        Box::new(SwitchSettingsRule),
    ])
}

pub(crate) fn port_entity(switch: &Switch, port: &Port) -> AffectedEntity {
    AffectedEntity::Port {
        device_mac: switch.mac.clone(),
        device_name: switch.name.clone(),
        port: port.index,
        port_name: port.name.clone(),
    }
}
