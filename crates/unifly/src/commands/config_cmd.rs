//! Config command handlers.

use std::collections::BTreeSet;

use clap::ValueEnum;

use crate::cli::{ColorMode, ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Settings, save_config_to};
use crate::error::CliError;
use crate::output;

use super::util;

const VALID_KEYS: &str = "defaults.output, defaults.color, audit.disabled_rules, \
                          audit.min_group_size, audit.create_new_escalation, \
                          audit.extend_usage_escalation";

fn format_config(cfg: &Config) -> String {
    let disabled = if cfg.audit.disabled_rules.is_empty() {
        "(none)".to_owned()
    } else {
        cfg.audit
            .disabled_rules
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    [
        format!("Output:                  {}", cfg.defaults.output),
        format!("Color:                   {}", cfg.defaults.color),
        format!("Disabled rules:          {disabled}"),
        format!("Min group size:          {}", cfg.audit.min_group_size),
        format!("Create-new escalation:   {}", cfg.audit.create_new_escalation),
        format!("Extend-usage escalation: {}", cfg.audit.extend_usage_escalation),
    ]
    .join("\n")
}

/// Canonical spelling of a `ValueEnum` value, validated.
fn enum_value<T: ValueEnum>(field: &str, raw: &str) -> Result<String, CliError> {
    let parsed: T = config::parse_value(field, raw)?;
    Ok(parsed
        .to_possible_value()
        .map_or_else(|| raw.to_owned(), |p| p.get_name().to_owned()))
}

fn threshold(field: &str, raw: &str) -> Result<usize, CliError> {
    raw.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a positive whole number".into(),
    })
}

/// Apply one `key = value` change in place.
fn apply(cfg: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "defaults.output" | "output" => {
            cfg.defaults.output = enum_value::<OutputFormat>("defaults.output", value)?;
        }
        "defaults.color" | "color" => {
            cfg.defaults.color = enum_value::<ColorMode>("defaults.color", value)?;
        }
        "audit.disabled_rules" | "disabled_rules" => {
            cfg.audit.disabled_rules = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect::<BTreeSet<_>>();
        }
        "audit.min_group_size" | "min_group_size" => {
            cfg.audit.min_group_size = threshold("audit.min_group_size", value)?;
        }
        "audit.create_new_escalation" | "create_new_escalation" => {
            cfg.audit.create_new_escalation = threshold("audit.create_new_escalation", value)?;
        }
        "audit.extend_usage_escalation" | "extend_usage_escalation" => {
            cfg.audit.extend_usage_escalation = threshold("audit.extend_usage_escalation", value)?;
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_config_path(global);

    match &args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init => {
            if path.exists()
                && !util::confirm(
                    &format!("Overwrite existing config at {}?", path.display()),
                    "overwrite config",
                    global.yes,
                )?
            {
                eprintln!("Aborted.");
                return Ok(());
            }
            save_config_to(&Config::default(), &path)?;
            eprintln!("✓ Wrote default config to {}", path.display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let settings = Settings::resolve(global)?;
            let out = output::render_single(settings.output, &settings.config, format_config, |_| {
                path.display().to_string()
            });
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load(global)?;
            apply(&mut cfg, key, value)?;
            save_config_to(&cfg, &path)?;
            eprintln!("✓ Set {key} in {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_known_keys() {
        let mut cfg = Config::default();
        apply(&mut cfg, "defaults.output", "JSON").unwrap();
        assert_eq!(cfg.defaults.output, "json");
        apply(&mut cfg, "audit.disabled_rules", "port.unused, firewall.overlap,").unwrap();
        assert_eq!(cfg.audit.disabled_rules.len(), 2);
        apply(&mut cfg, "min_group_size", "4").unwrap();
        assert_eq!(cfg.audit.min_group_size, 4);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut cfg = Config::default();
        assert!(apply(&mut cfg, "defaults.color", "sometimes").is_err());
        assert!(apply(&mut cfg, "audit.min_group_size", "-1").is_err());
        assert!(matches!(
            apply(&mut cfg, "controller", "x"),
            Err(CliError::Validation { field, .. }) if field == "controller"
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn show_lists_every_setting() {
        let text = format_config(&Config::default());
        assert!(text.contains("Disabled rules:          (none)"));
        assert!(text.contains("Min group size:          2"));
    }
}
