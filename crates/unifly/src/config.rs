//! CLI configuration: a thin wrapper around `unifly_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` overrides (`--config`,
//! `--output`, `--color`).

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use unifly_config::{Config, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `UNIFLY_CONFIG`, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(unifly_config::config_path)
}

/// Load the active config. Invalid files are errors; a missing file is not.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_config_path(global))?)
}

/// Flags and config merged into the values every command needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub output: OutputFormat,
    pub color: ColorMode,
    pub quiet: bool,
}

impl Settings {
    /// Flag > env > config file > built-in default.
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = load(global)?;
        let output = match global.output {
            Some(format) => format,
            None => parse_value("defaults.output", &config.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_value("defaults.color", &config.defaults.color)?,
        };
        Ok(Self {
            config,
            output,
            color,
            quiet: global.quiet,
        })
    }
}

/// Parse a config string with the same spelling rules as the flag.
pub fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!(
            "'{raw}' is not one of: {}",
            T::value_variants()
                .iter()
                .filter_map(|v| v.to_possible_value().map(|p| p.get_name().to_owned()))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}
