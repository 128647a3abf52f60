//! Shared helpers for command handlers.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use unifly_audit::{AuditContext, Auditor, MacAddress, Severity, Snapshot, Switch, Topology};

use crate::cli::SeverityLevel;
use crate::config::Settings;
use crate::error::CliError;

/// Read and parse a snapshot from a file, or stdin for `-`.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, CliError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::SnapshotRead {
                source_name: "stdin".into(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                CliError::SnapshotNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CliError::SnapshotRead {
                    source_name: path.display().to_string(),
                    source,
                }
            }
        })?
    };

    let snapshot = Snapshot::from_json(&raw)?;
    tracing::debug!(
        devices = snapshot.devices.len(),
        networks = snapshot.networks.len(),
        port_profiles = snapshot.port_profiles.len(),
        firewall_rules = snapshot.firewall_rules.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// Build an auditor from config, with extra rules disabled for this run.
pub fn auditor(settings: &Settings, disable: &[String]) -> Result<Auditor, CliError> {
    let mut options = settings.config.audit.to_options();
    if !disable.is_empty() {
        let known = unifly_audit::default_rules().rule_ids();
        for id in disable {
            if !known.contains(&id.as_str()) {
                return Err(CliError::Validation {
                    field: "--disable".into(),
                    reason: format!("unknown rule '{id}'. Run: unifly rules"),
                });
            }
            options.disabled_rules.insert(id.clone());
        }
    }
    Ok(Auditor::new(options))
}

/// Resolved topology and lookups for the read-only views.
pub fn context(settings: &Settings, snapshot: &Snapshot) -> AuditContext {
    Auditor::new(settings.config.audit.to_options()).context(snapshot)
}

/// Find a switch by MAC (any common notation) or case-insensitive name.
pub fn find_switch<'a>(topology: &'a Topology, identifier: &str) -> Result<&'a Switch, CliError> {
    let mac = MacAddress::new(identifier);
    topology
        .switches
        .iter()
        .find(|s| {
            s.mac == mac
                || s
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(identifier))
        })
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "topology <SNAPSHOT>".into(),
        })
}

pub fn severity(level: SeverityLevel) -> Severity {
    match level {
        SeverityLevel::Informational => Severity::Informational,
        SeverityLevel::Recommended => Severity::Recommended,
        SeverityLevel::Critical => Severity::Critical,
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;
    Ok(confirmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn topology() -> Topology {
        let snapshot = Snapshot::from_json(
            r#"{"devices": [{"mac": "AA:BB:CC:00:00:01", "name": "Core", "type": "usw",
                "port_table": [{"port_idx": 1, "up": true}]}]}"#,
        )
        .unwrap();
        Auditor::default().context(&snapshot).topology
    }

    #[test]
    fn find_switch_by_mac_or_name() {
        let topology = topology();
        assert!(find_switch(&topology, "aa-bb-cc-00-00-01").is_ok());
        assert!(find_switch(&topology, "core").is_ok());
    }

    #[test]
    fn unknown_switch_is_not_found() {
        let err = find_switch(&topology(), "edge").unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn missing_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::SnapshotNotFound { .. }));
    }

    #[test]
    fn severity_levels_map_in_order() {
        assert!(severity(SeverityLevel::Critical) > severity(SeverityLevel::Recommended));
        assert!(severity(SeverityLevel::Recommended) > severity(SeverityLevel::Informational));
    }
}
