//! Firewall rule overlap detection.
//!
//! Two rules overlap when every dimension they match on overlaps. The
//! dimensions are independent, so the result does not depend on which
//! rule is passed first.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::FirewallRule;
use crate::overlap::{
    icmp_types_overlap, ports_overlap, protocol_has_ports, protocols_overlap, targets_overlap,
};

/// Per-dimension overlap results for one rule pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct OverlapCheck {
    pub protocol: bool,
    pub source: bool,
    pub destination: bool,
    pub ports: bool,
    pub icmp: bool,
}

impl OverlapCheck {
    pub fn compare(a: &FirewallRule, b: &FirewallRule) -> Self {
        let protocol = protocols_overlap(a.protocol.as_deref(), b.protocol.as_deref());

        // Ports only mean something when both sides speak TCP/UDP.
        let ports = if protocol_has_ports(a.protocol.as_deref())
            && protocol_has_ports(b.protocol.as_deref())
        {
            ports_overlap(a.destination_ports.as_deref(), b.destination_ports.as_deref())
        } else {
            true
        };

        let icmp = if a.protocol_name() == "icmp" && b.protocol_name() == "icmp" {
            icmp_types_overlap(a.icmp_type.as_deref(), b.icmp_type.as_deref())
        } else {
            true
        };

        Self {
            protocol,
            source: targets_overlap(&a.source, &b.source),
            destination: targets_overlap(&a.destination, &b.destination),
            ports,
            icmp,
        }
    }

    pub fn all(self) -> bool {
        self.protocol && self.source && self.destination && self.ports && self.icmp
    }
}

/// `true` when some packet could match both rules.
pub fn rules_overlap(a: &FirewallRule, b: &FirewallRule) -> bool {
    OverlapCheck::compare(a, b).all()
}

/// An overlapping pair, `first` evaluated before `second`.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOverlap<'a> {
    pub first: &'a FirewallRule,
    pub second: &'a FirewallRule,
    /// Actions differ, so `second` is at least partly shadowed.
    pub conflicting: bool,
}

fn zone_key(rule: &FirewallRule) -> (String, String) {
    let norm = |z: Option<&str>| z.map(str::to_ascii_lowercase).unwrap_or_default();
    (
        norm(rule.source_zone.as_deref()),
        norm(rule.destination_zone.as_deref()),
    )
}

/// Compare enabled rules pairwise within each zone pair.
///
/// Pairs are reported in evaluation order; disabled rules never match
/// traffic and are ignored.
pub fn find_overlaps(rules: &[FirewallRule]) -> Vec<RuleOverlap<'_>> {
    let mut by_zone: BTreeMap<(String, String), Vec<&FirewallRule>> = BTreeMap::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        by_zone.entry(zone_key(rule)).or_default().push(rule);
    }

    let mut overlaps = Vec::new();
    for group in by_zone.values_mut() {
        group.sort_by_key(|r| r.index);
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                if rules_overlap(first, second) {
                    overlaps.push(RuleOverlap {
                        first,
                        second,
                        conflicting: first.action != second.action,
                    });
                }
            }
        }
    }
    tracing::debug!(
        rules = rules.len(),
        overlaps = overlaps.len(),
        "firewall overlap scan complete"
    );
    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FirewallAction, MatchTarget};

    fn rule(id: &str, index: i64) -> FirewallRule {
        FirewallRule {
            id: id.into(),
            name: format!("rule {id}"),
            enabled: true,
            action: FirewallAction::Block,
            index,
            protocol: Some("tcp".into()),
            icmp_type: None,
            source: MatchTarget::Networks(vec!["lan".into()]),
            destination: MatchTarget::Ips(vec!["10.0.0.0/8".into()]),
            destination_ports: Some("443".into()),
            source_zone: None,
            destination_zone: None,
        }
    }

    #[test]
    fn identical_rules_overlap() {
        let a = rule("a", 1);
        let b = rule("b", 2);
        assert!(rules_overlap(&a, &b));
        assert!(rules_overlap(&b, &a));
    }

    #[test]
    fn each_dimension_can_break_the_overlap() {
        let base = rule("a", 1);

        let mut protocol = rule("b", 2);
        protocol.protocol = Some("udp".into());

        let mut source = rule("b", 2);
        source.source = MatchTarget::Networks(vec!["guest".into()]);

        let mut destination = rule("b", 2);
        destination.destination = MatchTarget::Ips(vec!["192.168.0.0/16".into()]);

        let mut ports = rule("b", 2);
        ports.destination_ports = Some("80".into());

        for other in [&protocol, &source, &destination, &ports] {
            assert!(!rules_overlap(&base, other), "{other:?}");
            assert!(!rules_overlap(other, &base));
        }

        let mut icmp_a = rule("a", 1);
        icmp_a.protocol = Some("icmp".into());
        icmp_a.icmp_type = Some("echo-request".into());
        let mut icmp_b = icmp_a.clone();
        assert!(rules_overlap(&icmp_a, &icmp_b));
        icmp_b.icmp_type = Some("echo-reply".into());
        let check = OverlapCheck::compare(&icmp_a, &icmp_b);
        assert!(!check.icmp);
        assert!(check.protocol && check.source && check.destination && check.ports);
        assert!(!check.all());
    }

    #[test]
    fn ports_ignored_without_port_semantics() {
        let mut a = rule("a", 1);
        a.protocol = Some("all".into());
        a.destination_ports = Some("22".into());
        let b = rule("b", 2);
        assert!(OverlapCheck::compare(&a, &b).ports);
    }

    #[test]
    fn icmp_type_ignored_unless_both_icmp() {
        let mut a = rule("a", 1);
        a.protocol = Some("all".into());
        a.icmp_type = Some("echo-request".into());
        let mut b = rule("b", 2);
        b.protocol = Some("icmp".into());
        b.icmp_type = Some("echo-reply".into());
        assert!(OverlapCheck::compare(&a, &b).icmp);
    }

    #[test]
    fn find_overlaps_respects_zones_and_enabled() {
        let mut allow = rule("allow", 1);
        allow.action = FirewallAction::Allow;
        let block = rule("block", 2);
        let mut disabled = rule("disabled", 3);
        disabled.enabled = false;
        let mut other_zone = rule("other", 4);
        other_zone.source_zone = Some("dmz".into());

        let rules = vec![block.clone(), allow, disabled, other_zone];
        let found = find_overlaps(&rules);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first.id, "allow");
        assert_eq!(found[0].second.id, "block");
        assert!(found[0].conflicting);
    }

    #[test]
    fn same_action_is_redundant() {
        let rules = vec![rule("a", 1), rule("b", 2)];
        let found = find_overlaps(&rules);
        assert_eq!(found.len(), 1);
        assert!(!found[0].conflicting);
    }
}
