// ── Audit pass options ──
//
// Tuning knobs for one pass. The core never reads config files; the CLI
// builds these from `unifly-config` and hands them in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Thresholds for port-profile consolidation suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingOptions {
    /// Smallest group that produces any suggestion.
    pub min_group_size: usize,
    /// `CreateNew` groups at least this large are escalated.
    pub create_new_escalation: usize,
    /// `ExtendUsage` / `ApplyExisting` groups at least this large are escalated.
    pub extend_usage_escalation: usize,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            min_group_size: 2,
            create_new_escalation: 5,
            extend_usage_escalation: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    pub grouping: GroupingOptions,
    /// Rule ids removed from the engine before the pass.
    pub disabled_rules: BTreeSet<String>,
}

impl AuditOptions {
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.contains(rule_id)
    }
}
