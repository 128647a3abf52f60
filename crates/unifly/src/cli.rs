//! Clap derive structures for the `unifly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Kept free of crate-internal imports so `build.rs` can include it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// unifly -- configuration audits for UniFi networks
#[derive(Debug, Parser)]
#[command(
    name = "unifly",
    version,
    about = "Audit UniFi network configuration snapshots",
    long_about = "Audits a point-in-time UniFi controller snapshot for port, VLAN,\n\
        profile and firewall misconfigurations.\n\n\
        Snapshots are JSON documents with `devices`, `networks`,\n\
        `port_profiles`, `firewall_rules` and `settings` arrays.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "UNIFLY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides `defaults.output`)
    #[arg(long, short = 'o', env = "UNIFLY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (overrides `defaults.color`)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Finding severity as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityLevel {
    Informational,
    Recommended,
    Critical,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every enabled rule against a snapshot
    #[command(alias = "a")]
    Audit(AuditArgs),

    /// List the built-in audit rules
    Rules,

    /// Show switches, roles and uplinks extracted from a snapshot
    #[command(alias = "topo")]
    Topology(SnapshotArgs),

    /// Show the effective configuration of every port
    Ports(PortsArgs),

    /// Inspect port profiles and consolidation suggestions
    #[command(alias = "prof")]
    Profiles(ProfilesArgs),

    /// Inspect firewall rules and overlapping rule pairs
    #[command(alias = "fw")]
    Firewall(FirewallArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared argument groups ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Snapshot JSON file, or `-` for stdin
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

// ── Audit ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,

    /// Skip a rule for this run (repeatable, adds to `audit.disabled_rules`)
    #[arg(long = "disable", value_name = "RULE")]
    pub disable: Vec<String>,

    /// Only show findings at or above this severity
    #[arg(long, value_name = "LEVEL")]
    pub min_severity: Option<SeverityLevel>,

    /// Exit with status 3 when any finding reaches this severity
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<SeverityLevel>,
}

// ── Ports ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortsArgs {
    #[command(flatten)]
    pub input: SnapshotArgs,

    /// Only show ports of this device (MAC or name)
    #[arg(long, short = 'd')]
    pub device: Option<String>,

    /// Hide ports that are down
    #[arg(long)]
    pub up: bool,
}

// ── Profiles ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// List port profiles and how many ports reference each
    #[command(alias = "ls")]
    List(SnapshotArgs),

    /// Suggest profiles for ports that share a configuration
    Suggest(SnapshotArgs),
}

// ── Firewall ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FirewallArgs {
    #[command(subcommand)]
    pub command: FirewallCommand,
}

#[derive(Debug, Subcommand)]
pub enum FirewallCommand {
    /// List firewall rules in evaluation order
    #[command(alias = "ls")]
    Rules(SnapshotArgs),

    /// List rule pairs that can match the same traffic
    Overlaps(SnapshotArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init,

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value
    Set {
        /// Key, e.g. `defaults.output` or `audit.min_group_size`
        key: String,
        /// New value (comma-separated for `audit.disabled_rules`)
        value: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
