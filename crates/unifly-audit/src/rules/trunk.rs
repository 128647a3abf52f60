// ── Trunk consistency ──

use serde_json::json;

use super::AuditContext;
use crate::engine::Rule;
use crate::error::AuditError;
use crate::grouping::{TrunkMismatch, trunk_mismatches};
use crate::model::{AffectedEntity, Finding, FindingKind, Severity};

/// Both ends of a wired uplink must agree on the VLANs they carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrunkConsistencyRule;

impl Rule<AuditContext> for TrunkConsistencyRule {
    fn id(&self) -> &'static str {
        "trunk.consistency"
    }

    fn description(&self) -> &'static str {
        "VLAN mismatches between the two ends of an uplink"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        Ok(trunk_mismatches(&ctx.topology)
            .iter()
            .map(|m| self.finding(m))
            .collect())
    }
}

impl TrunkConsistencyRule {
    fn finding(&self, mismatch: &TrunkMismatch) -> Finding {
        let up = AffectedEntity::from(&mismatch.upstream);
        let down = AffectedEntity::from(&mismatch.downstream);

        let mut details = Vec::new();
        if let Some((a, b)) = mismatch.native {
            details.push(format!("native VLAN {a} upstream vs {b} downstream"));
        }
        if !mismatch.upstream_only.is_empty() {
            details.push(format!("tagged only upstream: {}", join(&mismatch.upstream_only)));
        }
        if !mismatch.downstream_only.is_empty() {
            details.push(format!(
                "tagged only downstream: {}",
                join(&mismatch.downstream_only)
            ));
        }

        // A native VLAN mismatch leaks traffic between networks.
        let severity = if mismatch.native.is_some() {
            Severity::Critical
        } else {
            Severity::Recommended
        };

        Finding::new(
            self.id(),
            FindingKind::Issue,
            severity,
            format!("VLAN mismatch between {up} and {down}"),
        )
        .with_message(details.join("; "))
        .with_metadata("upstream_only", json!(mismatch.upstream_only))
        .with_metadata("downstream_only", json!(mismatch.downstream_only))
        .with_metadata("native", json!(mismatch.native))
        .affecting(up)
        .affecting(down)
    }
}

fn join<'a>(vlans: impl IntoIterator<Item = &'a u16>) -> String {
    vlans
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
