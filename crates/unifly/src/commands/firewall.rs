//! Firewall command handlers (rules + overlaps).

use tabled::Tabled;
use unifly_audit::FirewallRule;
use unifly_audit::firewall::{OverlapCheck, RuleOverlap, find_overlaps};
use unifly_audit::model::MatchTarget;

use crate::cli::{FirewallArgs, FirewallCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

fn target_label(t: &MatchTarget) -> String {
    match t {
        MatchTarget::Any => "any".into(),
        other => format!("{}: {}", other.kind(), output::join_or_dash(other.values())),
    }
}

fn zones(r: &FirewallRule) -> String {
    match (r.source_zone.as_deref(), r.destination_zone.as_deref()) {
        (None, None) => "-".into(),
        (src, dst) => format!("{} -> {}", src.unwrap_or("*"), dst.unwrap_or("*")),
    }
}

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Index")]
    index: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Zones")]
    zones: String,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        Self {
            index: r.index,
            name: r.name.clone(),
            action: r.action.to_string(),
            enabled: if r.enabled { "yes" } else { "no" }.into(),
            protocol: r.protocol_name(),
            source: target_label(&r.source),
            destination: target_label(&r.destination),
            ports: r.destination_ports.clone().unwrap_or_else(|| "-".into()),
            zones: zones(r),
        }
    }
}

// ── Overlap table row ───────────────────────────────────────────────

#[derive(Tabled)]
struct OverlapRow {
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Second")]
    second: String,
    #[tabled(rename = "Effect")]
    effect: String,
    #[tabled(rename = "Zones")]
    zones: String,
}

impl From<&RuleOverlap<'_>> for OverlapRow {
    fn from(o: &RuleOverlap<'_>) -> Self {
        Self {
            first: format!("{} ({}, #{})", o.first.name, o.first.action, o.first.index),
            second: format!("{} ({}, #{})", o.second.name, o.second.action, o.second.index),
            effect: if o.conflicting { "shadowed" } else { "redundant" }.into(),
            zones: zones(o.first),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &FirewallArgs, settings: &Settings) -> Result<(), CliError> {
    match &args.command {
        FirewallCommand::Rules(input) => {
            let snapshot = util::read_snapshot(&input.snapshot)?;
            let mut rules = util::context(settings, &snapshot).firewall_rules;
            rules.sort_by_key(|r| r.index);
            let out = output::render_list(
                settings.output,
                &rules,
                |r| RuleRow::from(r),
                |r| r.id.clone(),
            );
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        FirewallCommand::Overlaps(input) => {
            let snapshot = util::read_snapshot(&input.snapshot)?;
            let rules = util::context(settings, &snapshot).firewall_rules;
            let overlaps = find_overlaps(&rules);
            for o in &overlaps {
                tracing::debug!(
                    first = %o.first.id,
                    second = %o.second.id,
                    dimensions = ?OverlapCheck::compare(o.first, o.second),
                    "overlapping pair"
                );
            }
            let out = output::render_list(
                settings.output,
                &overlaps,
                |o| OverlapRow::from(o),
                |o| format!("{} {}", o.first.id, o.second.id),
            );
            output::print_output(&out, settings.quiet);
            Ok(())
        }
    }
}
