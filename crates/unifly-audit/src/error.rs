// ── Audit error types ──
//
// Malformed snapshot fields never surface here: they degrade to defaults
// inside the extractor. These errors cover the top-level input and rule
// faults, which the engine isolates and records on the report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid snapshot: {message}")]
    Snapshot { message: String },

    #[error("Rule {rule_id} failed: {message}")]
    RuleFailed { rule_id: String, message: String },

    #[error("Rule {rule_id} panicked: {message}")]
    Panicked { rule_id: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    pub fn rule(rule_id: &str, message: impl Into<String>) -> Self {
        Self::RuleFailed {
            rule_id: rule_id.to_owned(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot {
            message: err.to_string(),
        }
    }
}
