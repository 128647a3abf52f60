//! Rule dispatch with per-rule fault isolation.
//!
//! A rule that returns an error or panics loses its findings for the pass;
//! the remaining rules still run. Failures are logged and, when running
//! into a report, recorded in [`AuditReport::failed_rules`].

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::AuditError;
use crate::model::{AuditReport, Finding};

/// One pluggable analyzer. Returns zero or more findings for a context.
pub trait Rule<C: ?Sized>: Send + Sync {
    /// Stable identifier, used in findings and to disable the rule.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    fn evaluate(&self, ctx: &C) -> Result<Vec<Finding>, AuditError>;
}

/// Ordered rule set. Stateless between passes, so one engine can serve
/// concurrent evaluations over independent contexts.
pub struct RuleEngine<C: ?Sized> {
    rules: Vec<Box<dyn Rule<C>>>,
}

impl<C: ?Sized> Default for RuleEngine<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C: ?Sized> std::fmt::Debug for RuleEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_ids())
            .finish()
    }
}

impl<C: ?Sized> RuleEngine<C> {
    pub fn new(rules: Vec<Box<dyn Rule<C>>>) -> Self {
        Self { rules }
    }

    pub fn register(&mut self, rule: impl Rule<C> + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Drop rules whose id is in `disabled`.
    #[must_use]
    pub fn without(mut self, disabled: &BTreeSet<String>) -> Self {
        self.rules.retain(|r| !disabled.contains(r.id()));
        self
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// `(id, description)` pairs in dispatch order.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and return the findings in rule order.
    pub fn run(&self, ctx: &C) -> Vec<Finding> {
        self.dispatch(ctx, |_, _| {})
    }

    /// Run every rule, appending findings and failures to `report`.
    pub fn run_into(&self, ctx: &C, report: &mut AuditReport) {
        let mut failures = Vec::new();
        let findings = self.dispatch(ctx, |id, err| failures.push((id, err.to_string())));
        report.extend(findings);
        for (id, err) in failures {
            report.record_failure(id, err);
        }
    }

    fn dispatch(&self, ctx: &C, mut on_failure: impl FnMut(&'static str, &AuditError)) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            match evaluate_isolated(rule.as_ref(), ctx) {
                Ok(batch) => {
                    tracing::debug!(rule = rule.id(), findings = batch.len(), "rule evaluated");
                    findings.extend(batch);
                }
                Err(err) => {
                    tracing::warn!(rule = rule.id(), error = %err, "rule failed, findings discarded");
                    on_failure(rule.id(), &err);
                }
            }
        }
        findings
    }
}

fn evaluate_isolated<C: ?Sized>(rule: &dyn Rule<C>, ctx: &C) -> Result<Vec<Finding>, AuditError> {
    catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx))).unwrap_or_else(|payload| {
        Err(AuditError::Panicked {
            rule_id: rule.id().to_owned(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FindingKind, Severity};

    struct Ctx {
        count: usize,
    }

    struct Emits(&'static str);

    impl Rule<Ctx> for Emits {
        fn id(&self) -> &'static str {
            self.0
        }

        fn evaluate(&self, ctx: &Ctx) -> Result<Vec<Finding>, AuditError> {
            Ok((0..ctx.count)
                .map(|i| Finding::new(self.0, FindingKind::Issue, Severity::Recommended, format!("#{i}")))
                .collect())
        }
    }

    struct Fails;

    impl Rule<Ctx> for Fails {
        fn id(&self) -> &'static str {
            "fails"
        }

        fn evaluate(&self, _ctx: &Ctx) -> Result<Vec<Finding>, AuditError> {
            Err(AuditError::rule("fails", "bad data"))
        }
    }

    struct Panics;

    impl Rule<Ctx> for Panics {
        fn id(&self) -> &'static str {
            "panics"
        }

        #[allow(clippy::panic)]
        fn evaluate(&self, _ctx: &Ctx) -> Result<Vec<Finding>, AuditError> {
            panic!("index out of range");
        }
    }

    fn engine() -> RuleEngine<Ctx> {
        RuleEngine::new(vec![
            Box::new(Emits("first")),
            Box::new(Fails),
            Box::new(Panics),
            Box::new(Emits("last")),
        ])
    }

    #[test]
    fn zero_one_or_many_findings() {
        let engine = RuleEngine::new(vec![Box::new(Emits("x")) as Box<dyn Rule<Ctx>>]);
        assert!(engine.run(&Ctx { count: 0 }).is_empty());
        assert_eq!(engine.run(&Ctx { count: 1 }).len(), 1);
        assert_eq!(engine.run(&Ctx { count: 4 }).len(), 4);
    }

    #[test]
    fn failures_are_isolated() {
        let findings = engine().run(&Ctx { count: 2 });
        let ids: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, ["first", "first", "last", "last"]);
    }

    #[test]
    fn run_into_records_failures() {
        let mut report = AuditReport::new();
        engine().run_into(&Ctx { count: 1 }, &mut report);
        assert_eq!(report.findings.len(), 2);
        let failed: Vec<&str> = report.failed_rules.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(failed, ["fails", "panics"]);
        assert!(report.failed_rules[1].error.contains("index out of range"));
    }

    #[test]
    fn both_shapes_agree() {
        let ctx = Ctx { count: 3 };
        let fresh = engine().run(&ctx);
        let mut report = AuditReport::new();
        engine().run_into(&ctx, &mut report);
        assert_eq!(fresh, report.findings);
    }

    #[test]
    fn disabled_rules_removed() {
        let disabled = BTreeSet::from(["fails".to_owned(), "panics".to_owned()]);
        let engine = engine().without(&disabled);
        assert_eq!(engine.rule_ids(), ["first", "last"]);
    }
}
