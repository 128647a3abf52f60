// ── Port hygiene rules ──

use serde_json::json;

use super::{AuditContext, port_entity};
use crate::engine::Rule;
use crate::error::AuditError;
use crate::model::{Finding, FindingKind, NetworkPurpose, Port, Severity, Switch, find_network};

/// Ports left enabled with nothing plugged in.
///
/// LAG members are included: an idle member still forwards if a cable
/// shows up.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnusedPortRule;

impl Rule<AuditContext> for UnusedPortRule {
    fn id(&self) -> &'static str {
        "port.unused"
    }

    fn description(&self) -> &'static str {
        "Enabled switch ports with no link"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        let mut findings = Vec::new();
        for switch in &ctx.topology.switches {
            let idle: Vec<&Port> = switch
                .manageable_ports()
                .filter(|p| !p.up && !p.is_uplink && !p.effective.is_disabled())
                .collect();
            if idle.is_empty() {
                continue;
            }
            let indexes: Vec<u32> = idle.iter().map(|p| p.index).collect();
            findings.push(
                Finding::new(
                    self.id(),
                    FindingKind::Hardening,
                    Severity::Informational,
                    format!("{} has {} unused enabled ports", switch.display_name(), idle.len()),
                )
                .with_message(
                    "Disable ports that have no link so an unplanned device cannot join the network.",
                )
                .affecting_all(idle.iter().map(|p| port_entity(switch, p)))
                .with_metadata("ports", json!(indexes)),
            );
        }
        Ok(findings)
    }
}

/// Edge ports that carry every VLAN.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTrunkRule;

impl Rule<AuditContext> for EdgeTrunkRule {
    fn id(&self) -> &'static str {
        "port.edge-trunk"
    }

    fn description(&self) -> &'static str {
        "Non-infrastructure ports tagging all VLANs"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        let infrastructure = ctx.topology.infrastructure_ports();
        let findings = ctx
            .ports()
            .filter(|(s, p)| is_edge(s, p) && !infrastructure.contains(&(s.mac.clone(), p.index)))
            .filter(|(_, p)| p.effective.tags_all_vlans() && !p.effective.tagged_vlans.is_empty())
            .map(|(switch, port)| {
                let vlans: Vec<u16> = port.effective.tagged_vlans.iter().copied().collect();
                Finding::new(
                    self.id(),
                    FindingKind::Hardening,
                    Severity::Recommended,
                    format!("{} {} tags every VLAN", switch.display_name(), port.display_name()),
                )
                .with_message(
                    "Ports facing end devices should carry only the VLANs they need. \
                     Block unused VLANs or convert the port to an access port.",
                )
                .affecting(port_entity(switch, port))
                .with_metadata("tagged_vlans", json!(vlans))
            })
            .collect();
        Ok(findings)
    }
}

/// Access ports on sensitive networks with no admission control.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnprotectedAccessRule;

impl Rule<AuditContext> for UnprotectedAccessRule {
    fn id(&self) -> &'static str {
        "port.unprotected-access"
    }

    fn description(&self) -> &'static str {
        "Access ports on security or management networks without MAC restriction or 802.1X"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        let infrastructure = ctx.topology.infrastructure_ports();
        let mut findings = Vec::new();
        for (switch, port) in ctx.ports() {
            let eff = &port.effective;
            if !is_edge(switch, port)
                || infrastructure.contains(&(switch.mac.clone(), port.index))
                || !eff.is_access()
                || eff.is_protected()
            {
                continue;
            }
            let Some(network) = eff
                .native_network_id
                .as_deref()
                .and_then(|id| find_network(&ctx.networks, id))
                .filter(|n| n.purpose.is_sensitive())
            else {
                continue;
            };
            let severity = match network.purpose {
                NetworkPurpose::Management => Severity::Critical,
                _ => Severity::Recommended,
            };
            findings.push(
                Finding::new(
                    self.id(),
                    FindingKind::Hardening,
                    severity,
                    format!(
                        "{} {} exposes {} without admission control",
                        switch.display_name(),
                        port.display_name(),
                        network.name
                    ),
                )
                .with_message(
                    "Enable port security with an allowed MAC list or 802.1X on ports \
                     attached to security or management networks.",
                )
                .affecting(port_entity(switch, port))
                .with_metadata("network_id", network.id.clone())
                .with_metadata("network", network.name.clone()),
            );
        }
        Ok(findings)
    }
}

/// VLAN rules only look at edge ports: no LAG members, no uplinks.
fn is_edge(switch: &Switch, port: &Port) -> bool {
    !port.is_lag_child && !port.is_uplink && switch.uplink_port() != Some(port.index)
}
