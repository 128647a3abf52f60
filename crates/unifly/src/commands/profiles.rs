//! Port profile command handlers (usage listing + consolidation).

use serde::Serialize;
use tabled::Tabled;
use unifly_audit::grouping::{CompatibilityGrouper, ConsolidationSuggestion, SpeedClass};
use unifly_audit::model::{find_network, ids_match};
use unifly_audit::{AuditContext, ForwardMode, PortProfile};

use crate::cli::{ProfilesArgs, ProfilesCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Profile usage ───────────────────────────────────────────────────

#[derive(Serialize)]
struct ProfileUsage<'a> {
    #[serde(flatten)]
    profile: &'a PortProfile,
    /// Ports whose effective configuration references this profile.
    port_count: usize,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Forward")]
    forward: String,
    #[tabled(rename = "Native")]
    native: String,
    #[tabled(rename = "PoE")]
    poe: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Ports")]
    ports: usize,
}

impl ProfileRow {
    fn new(u: &ProfileUsage<'_>, ctx: &AuditContext) -> Self {
        let p = u.profile;
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            forward: p
                .forward
                .as_deref()
                .map_or_else(|| "-".into(), |f| ForwardMode::normalize(Some(f)).to_string()),
            native: p.native_network_id.as_deref().map_or_else(
                || "-".into(),
                |id| find_network(&ctx.networks, id).map_or_else(|| id.to_owned(), |n| n.name.clone()),
            ),
            poe: p.poe_mode.map_or_else(|| "-".into(), |m| m.to_string()),
            speed: match (p.autoneg, p.forced_speed()) {
                (_, Some(speed)) => format!("{speed}M"),
                (Some(true), None) => "autoneg".into(),
                _ => "-".into(),
            },
            ports: u.port_count,
        }
    }
}

fn usage(ctx: &AuditContext) -> Vec<ProfileUsage<'_>> {
    ctx.port_profiles
        .iter()
        .map(|profile| ProfileUsage {
            profile,
            port_count: ctx
                .topology
                .switches
                .iter()
                .flat_map(|s| &s.ports)
                .filter(|p| {
                    p.effective
                        .profile_id
                        .as_deref()
                        .is_some_and(|id| ids_match(id, &profile.id))
                })
                .count(),
        })
        .collect()
}

// ── Suggestions ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "PoE")]
    poe: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

impl SuggestionRow {
    fn new(s: &ConsolidationSuggestion, color: bool) -> Self {
        Self {
            action: s.kind.to_string(),
            profile: if s.alternate {
                format!("{} (alternate)", s.profile_name)
            } else {
                s.profile_name.clone()
            },
            severity: output::severity_label(s.severity, color),
            poe: if s.poe_required { "required" } else { "-" }.into(),
            speed: match s.speed {
                SpeedClass::Autoneg => "autoneg".into(),
                SpeedClass::Forced(mbps) => format!("{mbps}M"),
            },
            ports: s
                .ports
                .iter()
                .map(|p| {
                    format!(
                        "{}#{}",
                        p.device_name.as_deref().unwrap_or(p.device_mac.as_str()),
                        p.port
                    )
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ProfilesArgs, settings: &Settings) -> Result<(), CliError> {
    match &args.command {
        ProfilesCommand::List(input) => {
            let snapshot = util::read_snapshot(&input.snapshot)?;
            let ctx = util::context(settings, &snapshot);
            let rows = usage(&ctx);
            let out = output::render_list(
                settings.output,
                &rows,
                |u| ProfileRow::new(u, &ctx),
                |u| u.profile.id.clone(),
            );
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        ProfilesCommand::Suggest(input) => {
            let snapshot = util::read_snapshot(&input.snapshot)?;
            let ctx = util::context(settings, &snapshot);
            let grouper =
                CompatibilityGrouper::new(&ctx.port_profiles, &ctx.networks, ctx.options.grouping);
            let suggestions = grouper.suggestions(&ctx.topology);
            if suggestions.is_empty() {
                tracing::info!("no consolidation suggestions");
            }
            let color = output::should_color(settings.color);
            let out = output::render_list(
                settings.output,
                &suggestions,
                |s| SuggestionRow::new(s, color),
                |s| s.profile_name.clone(),
            );
            output::print_output(&out, settings.quiet);
            Ok(())
        }
    }
}
