// ── Firewall domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum FirewallAction {
    #[strum(to_string = "allow", serialize = "accept")]
    Allow,
    #[strum(to_string = "block", serialize = "drop")]
    Block,
    #[strum(serialize = "reject")]
    Reject,
}

/// What one side of a firewall rule matches on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum MatchTarget {
    /// Matches all traffic on this side.
    #[default]
    Any,
    /// Controller network ids.
    Networks(Vec<String>),
    /// IPv4 addresses or CIDR blocks.
    Ips(Vec<String>),
    Domains(Vec<String>),
    /// Target types the audit does not interpret (regions, MAC lists, ...).
    Other { kind: String, values: Vec<String> },
}

impl MatchTarget {
    pub fn kind(&self) -> &str {
        match self {
            Self::Any => "any",
            Self::Networks(_) => "network",
            Self::Ips(_) => "ip",
            Self::Domains(_) => "domain",
            Self::Other { kind, .. } => kind,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Networks(v) | Self::Ips(v) | Self::Domains(v) | Self::Other { values: v, .. } => {
                v
            }
        }
    }
}

/// A firewall rule or zone policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub action: FirewallAction,
    /// Evaluation order; lower runs first.
    pub index: i64,
    /// `None` means every protocol.
    pub protocol: Option<String>,
    /// ICMP type name; `None` means any type.
    pub icmp_type: Option<String>,
    pub source: MatchTarget,
    pub destination: MatchTarget,
    /// Destination port spec such as `"80,443,8000-8080"`.
    pub destination_ports: Option<String>,
    pub source_zone: Option<String>,
    pub destination_zone: Option<String>,
}

impl FirewallRule {
    /// Protocol with the wildcard made explicit.
    pub fn protocol_name(&self) -> String {
        self.protocol
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map_or_else(|| "all".to_owned(), str::to_ascii_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_synonyms() {
        assert_eq!("ACCEPT".parse::<FirewallAction>().ok(), Some(FirewallAction::Allow));
        assert_eq!("drop".parse::<FirewallAction>().ok(), Some(FirewallAction::Block));
        assert_eq!(FirewallAction::Allow.to_string(), "allow");
    }

    #[test]
    fn target_kind_and_values() {
        let t = MatchTarget::Ips(vec!["10.0.0.0/8".into()]);
        assert_eq!(t.kind(), "ip");
        assert_eq!(t.values().len(), 1);
        assert!(MatchTarget::Any.values().is_empty());
    }
}
