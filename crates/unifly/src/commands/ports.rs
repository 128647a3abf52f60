//! Port view: effective configuration after profile resolution.

use serde::Serialize;
use tabled::Tabled;
use unifly_audit::model::{find_network, find_profile};
use unifly_audit::{AuditContext, MacAddress, Port, Switch};

use crate::cli::PortsArgs;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

/// One port with the device it belongs to, for structured output.
#[derive(Serialize)]
struct PortView<'a> {
    device_mac: &'a MacAddress,
    device_name: &'a str,
    #[serde(flatten)]
    port: &'a Port,
}

// ── Port table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "Forward")]
    forward: String,
    #[tabled(rename = "Native")]
    native: String,
    #[tabled(rename = "Tagged")]
    tagged: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "PoE")]
    poe: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl PortRow {
    fn new(view: &PortView<'_>, ctx: &AuditContext) -> Self {
        let p = view.port;
        let eff = &p.effective;

        let native = eff.native_network_id.as_deref().map_or_else(
            || "-".to_owned(),
            |id| match find_network(&ctx.networks, id) {
                Some(n) => format!("{} ({})", n.name, n.effective_vlan()),
                None => id.to_owned(),
            },
        );
        let tagged = if eff.is_access() || eff.is_disabled() {
            "-".to_owned()
        } else if eff.tags_all_vlans() {
            "all".to_owned()
        } else {
            output::join_or_dash(&eff.tagged_vlans)
        };
        let profile = eff.profile_id.as_deref().map_or_else(
            || "-".to_owned(),
            |id| find_profile(&ctx.port_profiles, id).map_or_else(|| id.to_owned(), |pr| pr.name.clone()),
        );
        let poe = match (p.poe.capable, p.poe.is_powering()) {
            (false, _) => "-",
            (true, true) => "on",
            (true, false) => "off",
        };

        let mut notes = Vec::new();
        if p.is_uplink {
            notes.push("uplink".to_owned());
        }
        if let Some(parent) = p.aggregated_by.filter(|_| p.is_lag_child) {
            notes.push(format!("lag of {parent}"));
        }
        if !p.manageable {
            notes.push("unmanaged".to_owned());
        }
        if eff.is_protected() {
            notes.push("secured".to_owned());
        }

        Self {
            device: view.device_name.to_owned(),
            port: p.display_name(),
            link: match (p.up, p.speed_mbps) {
                (true, Some(speed)) if speed > 0 => format!("up {speed}M"),
                (true, _) => "up".into(),
                (false, _) => "down".into(),
            },
            forward: eff.forward.to_string(),
            native,
            tagged,
            profile,
            poe: poe.into(),
            notes: output::join_or_dash(notes),
        }
    }
}

fn views<'a>(switches: impl IntoIterator<Item = &'a Switch>, up_only: bool) -> Vec<PortView<'a>> {
    switches
        .into_iter()
        .flat_map(|s| {
            s.ports
                .iter()
                .filter(move |p| !up_only || p.up)
                .map(move |port| PortView {
                    device_mac: &s.mac,
                    device_name: s.display_name(),
                    port,
                })
        })
        .collect()
}

pub fn handle(args: &PortsArgs, settings: &Settings) -> Result<(), CliError> {
    let snapshot = util::read_snapshot(&args.input.snapshot)?;
    let ctx = util::context(settings, &snapshot);

    let ports = match args.device.as_deref() {
        Some(device) => views([util::find_switch(&ctx.topology, device)?], args.up),
        None => views(&ctx.topology.switches, args.up),
    };

    let out = output::render_list(
        settings.output,
        &ports,
        |v| PortRow::new(v, &ctx),
        |v| format!("{} {}", v.device_mac, v.port.index),
    );
    output::print_output(&out, settings.quiet);
    Ok(())
}
