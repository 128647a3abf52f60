//! Configuration audit engine for UniFi networks.
//!
//! Takes a point-in-time controller snapshot and produces typed findings.
//! Everything is synchronous and side-effect free; acquiring the snapshot
//! and presenting the report are left to callers.
//!
//! - **[`Auditor`]**: Facade for one pass. It parses a [`Snapshot`], extracts
//!   the [`Topology`], builds an [`AuditContext`] and dispatches every
//!   enabled rule into an [`AuditReport`].
//!
//! - **Topology extraction** ([`topology`]): Classifies devices as gateway,
//!   access point or switch, drops passthrough APs, detects LAG members and
//!   resolves every port.
//!
//! - **Port resolution** ([`resolve`]): Field-by-field merge of a port's
//!   own settings with its port profile, plus the global switch settings
//!   layer with its per-device exclusions.
//!
//! - **Overlap primitives** ([`overlap`]): CIDR containment, domain
//!   suffixes, port ranges, protocols and ICMP types. [`firewall`] combines
//!   them into rule-pair overlap detection.
//!
//! - **Compatibility grouping** ([`grouping`]): VLAN signatures, PoE and
//!   speed filters, profile consolidation suggestions and trunk
//!   consistency between uplink ends.
//!
//! - **[`RuleEngine`]**: Ordered, fault-isolating rule dispatch. A rule
//!   that errors or panics loses its findings; the others still run.

pub mod audit;
mod convert;
pub mod engine;
pub mod error;
pub mod firewall;
pub mod grouping;
pub mod model;
pub mod options;
pub mod overlap;
pub mod resolve;
pub mod rules;
pub mod snapshot;
pub mod topology;

// ── Primary re-exports ──────────────────────────────────────────────
pub use audit::Auditor;
pub use engine::{Rule, RuleEngine};
pub use error::AuditError;
pub use options::{AuditOptions, GroupingOptions};
pub use rules::{AuditContext, default_rules};
pub use snapshot::Snapshot;
pub use topology::Topology;

pub use model::{
    AffectedEntity, AuditReport, DeviceRole, EffectivePortConfig, FailedRule, Finding,
    FindingKind, FirewallRule, ForwardMode, MacAddress, Network, NetworkPurpose, Port,
    PortProfile, Severity, Switch,
};
