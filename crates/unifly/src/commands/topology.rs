//! Topology view: managed devices, roles and uplinks.

use tabled::Tabled;
use unifly_audit::{Switch, Topology};

use crate::cli::SnapshotArgs;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Switch table row ────────────────────────────────────────────────

#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Uplink")]
    uplink: String,
    #[tabled(rename = "Jumbo")]
    jumbo: String,
    #[tabled(rename = "Flow Ctrl")]
    flow_control: String,
}

impl From<&Switch> for SwitchRow {
    fn from(s: &Switch) -> Self {
        let on_off = |v: bool| if v { "on" } else { "off" }.to_owned();
        let managed = s.manageable_ports().count();
        Self {
            mac: s.mac.to_string(),
            name: s.name.clone().unwrap_or_else(|| "-".into()),
            model: s.model.clone().unwrap_or_else(|| "-".into()),
            role: if s.mesh_backhaul {
                format!("{} (mesh)", s.role)
            } else {
                s.role.to_string()
            },
            ports: if managed == s.ports.len() {
                managed.to_string()
            } else {
                format!("{managed}/{}", s.ports.len())
            },
            uplink: uplink_label(s),
            jumbo: on_off(s.settings.jumbo_frames),
            flow_control: format!("{} ({})", on_off(s.settings.flow_control), s.settings.source),
        }
    }
}

fn uplink_label(s: &Switch) -> String {
    let Some(uplink) = s.uplink.as_ref() else {
        return "-".into();
    };
    if uplink.wireless {
        return "wireless".into();
    }
    match (&uplink.mac, uplink.remote_port) {
        (Some(mac), Some(port)) => format!("{mac} #{port}"),
        (Some(mac), None) => mac.to_string(),
        _ => "-".into(),
    }
}

fn topology_detail(t: &Topology) -> String {
    let rows: Vec<SwitchRow> = t.switches.iter().map(SwitchRow::from).collect();
    let mut lines = vec![output::render_table(&rows)];
    if !t.skipped.is_empty() {
        lines.push(String::new());
        lines.push(format!("Skipped {} device record(s):", t.skipped.len()));
        for skipped in &t.skipped {
            let who = skipped
                .name
                .clone()
                .or_else(|| skipped.mac.as_ref().map(ToString::to_string))
                .unwrap_or_else(|| "(unidentified)".into());
            lines.push(format!("  {who}: {}", skipped.reason));
        }
    }
    lines.join("\n")
}

pub fn handle(args: &SnapshotArgs, settings: &Settings) -> Result<(), CliError> {
    let snapshot = util::read_snapshot(&args.snapshot)?;
    let ctx = util::context(settings, &snapshot);
    let out = output::render_single(settings.output, &ctx.topology, topology_detail, |t| {
        t.switches
            .iter()
            .map(|s| s.mac.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, settings.quiet);
    Ok(())
}
