//! CLI error types with miette diagnostics.
//!
//! Maps `AuditError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use unifly_audit::AuditError;
use unifly_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const FINDINGS: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────

    #[error("Snapshot file '{path}' not found")]
    #[diagnostic(
        code(unifly::snapshot_not_found),
        help("Pass the path of a controller snapshot JSON file, or `-` to read stdin.")
    )]
    SnapshotNotFound { path: String },

    #[error("Could not read snapshot from {source_name}")]
    #[diagnostic(code(unifly::snapshot_read))]
    SnapshotRead {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot: {message}")]
    #[diagnostic(
        code(unifly::invalid_snapshot),
        help(
            "A snapshot is a JSON object with `devices`, `networks`, `port_profiles`,\n\
             `firewall_rules` and `settings` arrays. Missing arrays are treated as empty."
        )
    )]
    InvalidSnapshot { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(unifly::not_found),
        help("Run: unifly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Audit ────────────────────────────────────────────────────────

    #[error("{count} finding(s) at or above {threshold}")]
    #[diagnostic(
        code(unifly::findings_threshold),
        help("Findings are listed above. Lower the bar with --fail-on or drop the flag.")
    )]
    FindingsThreshold { count: usize, threshold: String },

    #[error(transparent)]
    #[diagnostic(code(unifly::audit))]
    Audit(AuditError),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(unifly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(unifly::config),
        help("Inspect the effective configuration with: unifly config show")
    )]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(unifly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AuditError> for CliError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Snapshot { message } => Self::InvalidSnapshot { message },
            other => Self::Audit(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SnapshotNotFound { .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::FindingsThreshold { .. } => exit_code::FINDINGS,
            _ => exit_code::GENERAL,
        }
    }
}
