//! Shared configuration for the unifly audit tools.
//!
//! TOML file + `UNIFLY_` environment overrides, loaded with figment, and
//! translation to `unifly_audit::AuditOptions`. The audit core never reads
//! files; callers load a [`Config`] here and hand the options in.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use unifly_audit::{AuditOptions, GroupingOptions};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Audit pass tuning.
    #[serde(default)]
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuditSettings {
    /// Rule ids to skip, e.g. `["port.unused"]`.
    #[serde(default)]
    pub disabled_rules: BTreeSet<String>,

    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    #[serde(default = "default_create_new_escalation")]
    pub create_new_escalation: usize,

    #[serde(default = "default_extend_usage_escalation")]
    pub extend_usage_escalation: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            disabled_rules: BTreeSet::new(),
            min_group_size: default_min_group_size(),
            create_new_escalation: default_create_new_escalation(),
            extend_usage_escalation: default_extend_usage_escalation(),
        }
    }
}

fn default_min_group_size() -> usize {
    GroupingOptions::default().min_group_size
}
fn default_create_new_escalation() -> usize {
    GroupingOptions::default().create_new_escalation
}
fn default_extend_usage_escalation() -> usize {
    GroupingOptions::default().extend_usage_escalation
}

impl AuditSettings {
    /// Reject thresholds the grouper cannot use and unknown rule ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("audit.min_group_size", self.min_group_size),
            ("audit.create_new_escalation", self.create_new_escalation),
            ("audit.extend_usage_escalation", self.extend_usage_escalation),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be at least 1".into(),
                });
            }
        }

        let known = unifly_audit::default_rules().rule_ids();
        if let Some(unknown) = self
            .disabled_rules
            .iter()
            .find(|id| !known.contains(&id.as_str()))
        {
            return Err(ConfigError::Validation {
                field: "audit.disabled_rules".into(),
                reason: format!("unknown rule '{unknown}' (expected one of: {})", known.join(", ")),
            });
        }
        Ok(())
    }

    /// Core options for one audit pass.
    pub fn to_options(&self) -> AuditOptions {
        AuditOptions {
            grouping: GroupingOptions {
                min_group_size: self.min_group_size,
                create_new_escalation: self.create_new_escalation,
                extend_usage_escalation: self.extend_usage_escalation,
            },
            disabled_rules: self.disabled_rules.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "unifly", "unifly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("unifly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIFLY_").split("__"));

    let config: Config = figment.extract()?;
    config.audit.validate()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.audit.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
