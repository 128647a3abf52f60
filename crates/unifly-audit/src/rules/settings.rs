// ── Switch-wide settings consistency ──

use serde_json::json;

use super::AuditContext;
use crate::engine::Rule;
use crate::error::AuditError;
use crate::model::{AffectedEntity, Finding, FindingKind, SettingsSource, Severity, Switch};

/// Jumbo frames and flow control should agree across the switching
/// fabric. Mixed MTUs silently drop oversized frames at the boundary.
///
/// Devices on the global exclusion list keep their own values, so they
/// are the usual source of drift and are reported as overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchSettingsRule;

struct Setting {
    key: &'static str,
    label: &'static str,
    severity: Severity,
    read: fn(&Switch) -> bool,
}

const SETTINGS: [Setting; 2] = [
    Setting {
        key: "jumbo_frames",
        label: "Jumbo frames",
        severity: Severity::Recommended,
        read: |s| s.settings.jumbo_frames,
    },
    Setting {
        key: "flow_control",
        label: "Flow control",
        severity: Severity::Informational,
        read: |s| s.settings.flow_control,
    },
];

impl Rule<AuditContext> for SwitchSettingsRule {
    fn id(&self) -> &'static str {
        "switch.settings"
    }

    fn description(&self) -> &'static str {
        "Jumbo frame and flow control settings that differ between switches"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        let switches: Vec<&Switch> = ctx.topology.switches.iter().collect();
        Ok(SETTINGS
            .iter()
            .filter_map(|setting| self.check(setting, &switches))
            .collect())
    }
}

impl SwitchSettingsRule {
    fn check(&self, setting: &Setting, switches: &[&Switch]) -> Option<Finding> {
        let (on, off): (Vec<&Switch>, Vec<&Switch>) =
            switches.iter().copied().partition(|s| (setting.read)(s));
        if on.is_empty() || off.is_empty() {
            return None;
        }
        // The minority is out of line; on a tie, the disabled side is.
        let (outliers, majority_value) = if on.len() < off.len() {
            (on, false)
        } else {
            (off, true)
        };
        let names: Vec<&str> = outliers.iter().map(|s| s.display_name()).collect();
        Some(
            Finding::new(
                self.id(),
                FindingKind::Issue,
                setting.severity,
                format!(
                    "{} {} on {} of {} switches",
                    setting.label,
                    if majority_value { "disabled" } else { "enabled" },
                    outliers.len(),
                    switches.len()
                ),
            )
            .with_message(format!(
                "{} is {} on most switches but not on: {}.",
                setting.label,
                if majority_value { "enabled" } else { "disabled" },
                names.join(", ")
            ))
            .with_metadata("setting", setting.key)
            .with_metadata("expected", majority_value)
            .with_metadata(
                "device_overrides",
                json!(
                    outliers
                        .iter()
                        .filter(|s| s.settings.source == SettingsSource::Device)
                        .map(|s| s.mac.as_str())
                        .collect::<Vec<_>>()
                ),
            )
            .affecting_all(outliers.iter().map(|s| AffectedEntity::Device {
                mac: s.mac.clone(),
                name: s.name.clone(),
            })),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::model::{GlobalSwitchSettings, MacAddress};
    use crate::rules::fixtures::networks;
    use crate::topology::extract;

    fn device(mac: &str, jumbo: Option<bool>) -> Value {
        let mut d = json!({ "mac": mac, "name": mac, "port_table": [{ "port_idx": 1, "up": true }] });
        if let Some(j) = jumbo {
            d["jumboframe_enabled"] = json!(j);
        }
        d
    }

    fn ctx(devices: &[Value], global: GlobalSwitchSettings) -> AuditContext {
        let networks = networks();
        AuditContext {
            topology: extract(devices, &networks, &[], &global),
            networks,
            switch_settings: global,
            ..AuditContext::default()
        }
    }

    #[test]
    fn consistent_fabric_is_clean() {
        let global = GlobalSwitchSettings {
            jumbo_frames: Some(true),
            ..GlobalSwitchSettings::default()
        };
        let devices = [device("aa:aa:aa:aa:aa:01", None), device("aa:aa:aa:aa:aa:02", None)];
        assert!(SwitchSettingsRule.evaluate(&ctx(&devices, global)).unwrap().is_empty());
    }

    #[test]
    fn excluded_device_override_is_flagged() {
        let global = GlobalSwitchSettings {
            jumbo_frames: Some(true),
            exclusions: [MacAddress::new("aa:aa:aa:aa:aa:03")].into(),
            ..GlobalSwitchSettings::default()
        };
        let devices = [
            device("aa:aa:aa:aa:aa:01", None),
            device("aa:aa:aa:aa:aa:02", None),
            device("aa:aa:aa:aa:aa:03", Some(false)),
        ];
        let findings = SwitchSettingsRule.evaluate(&ctx(&devices, global)).unwrap();
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.metadata["setting"], json!("jumbo_frames"));
        assert_eq!(f.metadata["expected"], json!(true));
        assert_eq!(f.affected.len(), 1);
        assert_eq!(f.metadata["device_overrides"], json!(["aa:aa:aa:aa:aa:03"]));
    }

    #[test]
    fn device_values_apply_without_global_record() {
        let devices = [
            device("aa:aa:aa:aa:aa:01", Some(true)),
            device("aa:aa:aa:aa:aa:02", Some(true)),
            device("aa:aa:aa:aa:aa:03", None),
        ];
        let findings = SwitchSettingsRule
            .evaluate(&ctx(&devices, GlobalSwitchSettings::default()))
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].metadata["device_overrides"], json!([]));
        assert_eq!(findings[0].severity, Severity::Recommended);
    }
}
