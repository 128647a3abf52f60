// ── Port profile consolidation ──

use serde_json::json;

use super::AuditContext;
use crate::engine::Rule;
use crate::error::AuditError;
use crate::grouping::{CompatibilityGrouper, ConsolidationSuggestion, SpeedClass, SuggestionKind};
use crate::model::{AffectedEntity, Finding, FindingKind};

/// Ports configured by hand that could share a profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileConsolidationRule;

impl Rule<AuditContext> for ProfileConsolidationRule {
    fn id(&self) -> &'static str {
        "profile.consolidation"
    }

    fn description(&self) -> &'static str {
        "Groups of identically configured ports that should share a port profile"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        let grouper = CompatibilityGrouper::new(
            &ctx.port_profiles,
            &ctx.networks,
            ctx.options.grouping,
        );
        grouper
            .suggestions(&ctx.topology)
            .iter()
            .map(|s| self.finding(s))
            .collect()
    }
}

impl ProfileConsolidationRule {
    fn finding(&self, s: &ConsolidationSuggestion) -> Result<Finding, AuditError> {
        let count = s.ports.len();
        let title = match s.kind {
            SuggestionKind::ExtendUsage => {
                format!("Apply profile \"{}\" to {count} more ports", s.profile_name)
            }
            SuggestionKind::ApplyExisting => {
                format!("Apply unused profile \"{}\" to {count} ports", s.profile_name)
            }
            SuggestionKind::CreateNew => {
                format!("Create profile \"{}\" for {count} ports", s.profile_name)
            }
        };
        let message = match (s.kind, s.alternate) {
            (SuggestionKind::CreateNew, _) => {
                "These ports share a VLAN configuration that no existing profile covers."
            }
            (_, true) => {
                "The closest matching profile does not fit these ports on PoE or link speed; \
                 this profile does."
            }
            (_, false) => "These ports already match the profile's VLAN configuration.",
        };
        let speed = match s.speed {
            SpeedClass::Autoneg => json!("autoneg"),
            SpeedClass::Forced(mbps) => json!(mbps),
        };
        let signature = serde_json::to_value(&s.signature)
            .map_err(|e| AuditError::rule(self.id(), e.to_string()))?;

        let mut finding = Finding::new(self.id(), FindingKind::Suggestion, s.severity, title)
            .with_message(message)
            .with_metadata("suggestion", s.kind.as_ref())
            .with_metadata("profile_name", s.profile_name.clone())
            .with_metadata("poe_required", s.poe_required)
            .with_metadata("speed", speed)
            .with_metadata("alternate", s.alternate)
            .with_metadata("signature", signature);

        if let Some(id) = &s.profile_id {
            finding = finding.with_metadata("profile_id", id.clone()).affecting(
                AffectedEntity::PortProfile {
                    id: id.clone(),
                    name: s.profile_name.clone(),
                },
            );
        }
        if !s.already_using.is_empty() {
            finding = finding.with_metadata("already_using", s.already_using.len());
        }
        Ok(finding.affecting_all(s.ports.iter().map(AffectedEntity::from)))
    }
}
