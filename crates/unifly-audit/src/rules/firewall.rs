// ── Firewall overlap ──

use super::AuditContext;
use crate::engine::Rule;
use crate::error::AuditError;
use crate::firewall::{RuleOverlap, find_overlaps};
use crate::model::{AffectedEntity, Finding, FindingKind, FirewallRule, Severity};

/// Rule pairs that can match the same packet.
///
/// Differing actions mean the later rule is shadowed for the shared
/// traffic. Matching actions are redundant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallOverlapRule;

impl Rule<AuditContext> for FirewallOverlapRule {
    fn id(&self) -> &'static str {
        "firewall.overlap"
    }

    fn description(&self) -> &'static str {
        "Firewall rules whose match criteria overlap"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        Ok(find_overlaps(&ctx.firewall_rules)
            .iter()
            .map(|o| self.finding(o))
            .collect())
    }
}

impl FirewallOverlapRule {
    fn finding(&self, overlap: &RuleOverlap<'_>) -> Finding {
        let (first, second) = (overlap.first, overlap.second);
        let (severity, title, message) = if overlap.conflicting {
            (
                Severity::Recommended,
                format!("\"{}\" shadows \"{}\"", first.name, second.name),
                format!(
                    "Traffic matched by both rules is handled by \"{}\" ({}) before \"{}\" ({}) is reached.",
                    first.name, first.action, second.name, second.action
                ),
            )
        } else {
            (
                Severity::Informational,
                format!("\"{}\" overlaps \"{}\"", first.name, second.name),
                format!(
                    "Both rules {} the shared traffic; one of them may be redundant.",
                    first.action
                ),
            )
        };
        Finding::new(self.id(), FindingKind::Issue, severity, title)
            .with_message(message)
            .affecting(entity(first))
            .affecting(entity(second))
            .with_metadata("conflicting", overlap.conflicting)
            .with_metadata("first_index", first.index)
            .with_metadata("second_index", second.index)
    }
}

fn entity(rule: &FirewallRule) -> AffectedEntity {
    AffectedEntity::FirewallRule {
        id: rule.id.clone(),
        name: rule.name.clone(),
    }
}
