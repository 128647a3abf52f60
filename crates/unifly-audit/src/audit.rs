// ── Audit pass facade ──
//
// Wires snapshot parsing, topology extraction and rule dispatch into one
// synchronous call. Holds no per-pass state, so one `Auditor` can audit
// any number of snapshots.

use crate::engine::RuleEngine;
use crate::error::AuditError;
use crate::model::AuditReport;
use crate::options::AuditOptions;
use crate::rules::{AuditContext, default_rules};
use crate::snapshot::Snapshot;
use crate::topology;

#[derive(Debug)]
pub struct Auditor {
    engine: RuleEngine<AuditContext>,
    options: AuditOptions,
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new(AuditOptions::default())
    }
}

impl Auditor {
    /// Built-in rules minus the ones `options` disables.
    pub fn new(options: AuditOptions) -> Self {
        let engine = default_rules().without(&options.disabled_rules);
        Self { engine, options }
    }

    /// Use a custom rule set. `options.disabled_rules` still applies.
    pub fn with_engine(engine: RuleEngine<AuditContext>, options: AuditOptions) -> Self {
        Self {
            engine: engine.without(&options.disabled_rules),
            options,
        }
    }

    pub fn engine(&self) -> &RuleEngine<AuditContext> {
        &self.engine
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Parse and resolve everything a pass needs from `snapshot`.
    pub fn context(&self, snapshot: &Snapshot) -> AuditContext {
        let networks = snapshot.networks();
        let port_profiles = snapshot.port_profiles();
        let switch_settings = snapshot.global_switch_settings();
        let topology = topology::extract(
            &snapshot.devices,
            &networks,
            &port_profiles,
            &switch_settings,
        );
        AuditContext {
            topology,
            networks,
            port_profiles,
            firewall_rules: snapshot.firewall_rules(),
            switch_settings,
            options: self.options.clone(),
        }
    }

    pub fn run(&self, snapshot: &Snapshot) -> AuditReport {
        self.run_context(&self.context(snapshot))
    }

    /// Run against a prepared context. Findings come back most severe
    /// first.
    pub fn run_context(&self, ctx: &AuditContext) -> AuditReport {
        let mut report = AuditReport::new();
        self.engine.run_into(ctx, &mut report);
        report.sort_by_severity();
        tracing::info!(
            rules = self.engine.len(),
            findings = report.findings.len(),
            failed = report.failed_rules.len(),
            score = report.score,
            "audit complete"
        );
        report
    }

    /// Parse a snapshot document and audit it.
    pub fn run_json(&self, raw: &str) -> Result<AuditReport, AuditError> {
        let snapshot = Snapshot::from_json(raw)?;
        Ok(self.run(&snapshot))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn disabled_rules_never_run() {
        let options = AuditOptions {
            disabled_rules: BTreeSet::from(["port.unused".to_owned()]),
            ..AuditOptions::default()
        };
        let auditor = Auditor::new(options);
        assert!(!auditor.engine().rule_ids().contains(&"port.unused"));
        assert_eq!(auditor.engine().len(), 6);
    }

    #[test]
    fn empty_snapshot_scores_full() {
        let report = Auditor::default().run_json("{}").unwrap();
        assert_eq!(report.score, 100);
        assert!(report.findings.is_empty());
        assert!(report.failed_rules.is_empty());
    }

    #[test]
    fn non_object_snapshot_is_rejected() {
        assert!(matches!(
            Auditor::default().run_json("[1, 2]"),
            Err(AuditError::Snapshot { .. })
        ));
    }
}
