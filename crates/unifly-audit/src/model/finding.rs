// ── Finding and report types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use super::ids::MacAddress;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FindingKind {
    /// Misconfiguration that breaks or degrades something.
    Issue,
    /// Security posture improvement.
    Hardening,
    /// Maintainability improvement, nothing is broken.
    Suggestion,
}

/// Ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    Informational,
    Recommended,
    Critical,
}

impl Severity {
    fn base_penalty(self) -> i32 {
        match self {
            Self::Critical => -10,
            Self::Recommended => -4,
            Self::Informational => -1,
        }
    }
}

/// Entity a finding points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AffectedEntity {
    Device {
        mac: MacAddress,
        name: Option<String>,
    },
    Port {
        device_mac: MacAddress,
        device_name: Option<String>,
        port: u32,
        port_name: Option<String>,
    },
    Network {
        id: String,
        name: String,
    },
    FirewallRule {
        id: String,
        name: String,
    },
    PortProfile {
        id: String,
        name: String,
    },
}

impl fmt::Display for AffectedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { mac, name } => write!(f, "{}", name.as_deref().unwrap_or(mac.as_str())),
            Self::Port {
                device_mac,
                device_name,
                port,
                ..
            } => write!(
                f,
                "{} port {port}",
                device_name.as_deref().unwrap_or(device_mac.as_str())
            ),
            Self::Network { name, .. } => write!(f, "network {name}"),
            Self::FirewallRule { name, .. } => write!(f, "rule {name}"),
            Self::PortProfile { name, .. } => write!(f, "profile {name}"),
        }
    }
}

/// One audit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub affected: Vec<AffectedEntity>,
    /// Points added to (negative: removed from) the 100-point score.
    pub score_impact: i32,
    pub metadata: Map<String, Value>,
}

impl Finding {
    /// Start a finding with the default score impact for its kind and severity.
    pub fn new(
        rule_id: impl Into<String>,
        kind: FindingKind,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        let score_impact = match kind {
            FindingKind::Suggestion => 0,
            FindingKind::Issue | FindingKind::Hardening => severity.base_penalty(),
        };
        Self {
            rule_id: rule_id.into(),
            kind,
            severity,
            title: title.into(),
            message: String::new(),
            affected: Vec::new(),
            score_impact,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn affecting(mut self, entity: AffectedEntity) -> Self {
        self.affected.push(entity);
        self
    }

    #[must_use]
    pub fn affecting_all(mut self, entities: impl IntoIterator<Item = AffectedEntity>) -> Self {
        self.affected.extend(entities);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn with_score_impact(mut self, impact: i32) -> Self {
        self.score_impact = impact;
        self
    }
}

/// A rule that faulted during a pass. Its findings were discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRule {
    pub rule_id: String,
    pub error: String,
}

/// Result of one audit pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    /// 0..=100, higher is better.
    pub score: u8,
    pub findings: Vec<Finding>,
    pub failed_rules: Vec<FailedRule>,
}

impl Default for AuditReport {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            score: 100,
            findings: Vec::new(),
            failed_rules: Vec::new(),
        }
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
        self.score = compute_score(&self.findings);
    }

    pub fn record_failure(&mut self, rule_id: &str, error: impl fmt::Display) {
        self.failed_rules.push(FailedRule {
            rule_id: rule_id.to_owned(),
            error: error.to_string(),
        });
    }

    /// Most severe first; rule order is kept within a severity.
    pub fn sort_by_severity(&mut self) {
        self.findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn findings_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| f.rule_id == rule_id)
    }
}

fn compute_score(findings: &[Finding]) -> u8 {
    let total: i64 = findings.iter().map(|f| i64::from(f.score_impact)).sum();
    u8::try_from((100 + total).clamp(0, 100)).unwrap_or(0)
}
