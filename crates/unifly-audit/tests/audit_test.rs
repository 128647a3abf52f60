#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use unifly_audit::{
    AffectedEntity, AuditContext, AuditError, AuditOptions, Auditor, Finding, FindingKind,
    ForwardMode, MacAddress, Rule, RuleEngine, Severity, Snapshot,
};

// ── Fixtures ────────────────────────────────────────────────────────

const CORE: &str = "aa:bb:cc:00:00:01";
const EDGE: &str = "aa:bb:cc:00:00:02";

fn networks() -> Value {
    json!([
        { "_id": "net-lan", "name": "Default", "purpose": "corporate" },
        { "_id": "net-iot", "name": "IoT", "purpose": "corporate", "vlan": 30, "vlan_enabled": true },
        { "_id": "net-cam", "name": "Cameras", "purpose": "corporate", "vlan": 40, "vlan_enabled": true },
        { "_id": "net-wan", "name": "Internet", "purpose": "wan" }
    ])
}

fn port(idx: u32, up: bool, extra: &Value) -> Value {
    let speed = if up { 1000 } else { 0 };
    let mut p = json!({ "port_idx": idx, "up": up, "speed": speed });
    if let (Some(obj), Some(extra)) = (p.as_object_mut(), extra.as_object()) {
        obj.extend(extra.clone());
    }
    p
}

fn iot(idx: u32) -> Value {
    port(
        idx,
        true,
        &json!({ "forward": "native", "native_networkconf_id": "net-iot" }),
    )
}

fn snapshot(devices: Value, profiles: Value) -> Snapshot {
    Snapshot::from_value(json!({
        "devices": devices,
        "networks": networks(),
        "port_profiles": profiles,
    }))
    .unwrap()
}

fn core_switch(ports: Vec<Value>) -> Value {
    json!({ "mac": CORE, "name": "Core", "model": "USW-24", "type": "usw", "port_table": ports })
}

fn ports_of(finding: &Finding) -> Vec<u32> {
    finding
        .affected
        .iter()
        .filter_map(|a| match a {
            AffectedEntity::Port { port, .. } => Some(*port),
            _ => None,
        })
        .collect()
}

// ── Consolidation ───────────────────────────────────────────────────

#[test]
fn three_matching_ports_yield_one_create_new() {
    let snap = snapshot(json!([core_switch(vec![iot(1), iot(2), iot(3)])]), json!([]));
    let report = Auditor::default().run(&snap);

    let suggestions: Vec<&Finding> = report.findings_for("profile.consolidation").collect();
    assert_eq!(suggestions.len(), 1);
    let s = suggestions[0];
    assert_eq!(s.kind, FindingKind::Suggestion);
    assert_eq!(s.metadata["suggestion"], json!("create_new"));
    assert_eq!(ports_of(s), [1, 2, 3]);
}

#[test]
fn single_port_yields_no_suggestion() {
    let snap = snapshot(json!([core_switch(vec![iot(1)])]), json!([]));
    let report = Auditor::default().run(&snap);
    assert_eq!(report.findings_for("profile.consolidation").count(), 0);
}

#[test]
fn larger_group_threshold_from_options() {
    let mut options = AuditOptions::default();
    options.grouping.min_group_size = 4;
    let snap = snapshot(json!([core_switch(vec![iot(1), iot(2), iot(3)])]), json!([]));
    let report = Auditor::new(options).run(&snap);
    assert_eq!(report.findings_for("profile.consolidation").count(), 0);
}

// ── Resolution ──────────────────────────────────────────────────────

#[test]
fn profile_forward_mode_overrides_port() {
    let device = json!([core_switch(vec![port(
        1,
        true,
        &json!({ "forward": "native", "portconf_id": "prof-off" }),
    )])]);
    let profiles = json!([{ "_id": "prof-off", "name": "Off", "forward": "disabled" }]);

    let auditor = Auditor::default();
    let ctx = auditor.context(&snapshot(device.clone(), profiles));
    let resolved = &ctx.topology.switches[0].ports[0].effective;
    assert_eq!(resolved.forward, ForwardMode::Disabled);

    let ctx = auditor.context(&snapshot(device, json!([])));
    assert_eq!(ctx.topology.switches[0].ports[0].effective.forward, ForwardMode::Native);
}

#[test]
fn lag_member_exempt_from_vlan_rules_but_not_unused() {
    let snap = snapshot(
        json!([core_switch(vec![
            port(5, true, &json!({ "forward": "all" })),
            port(6, false, &json!({ "aggregated_by": 5 })),
        ])]),
        json!([]),
    );
    let ctx = Auditor::default().context(&snap);
    let child = &ctx.topology.switches[0].ports[1];
    assert!(child.is_lag_child);
    assert_eq!(child.effective.forward, ForwardMode::All);

    let report = Auditor::default().run_context(&ctx);
    let edge: Vec<u32> = report
        .findings_for("port.edge-trunk")
        .flat_map(ports_of)
        .collect();
    assert_eq!(edge, [5]);
    let unused: Vec<u32> = report
        .findings_for("port.unused")
        .flat_map(ports_of)
        .collect();
    assert_eq!(unused, [6]);
}

// ── Topology ────────────────────────────────────────────────────────

#[test]
fn passthrough_ap_and_garbage_are_skipped() {
    let snap = snapshot(
        json!([
            core_switch(vec![iot(1)]),
            { "mac": "aa:bb:cc:00:00:09", "type": "uap", "port_table": [{ "port_idx": 1 }] },
            "not a device",
            { "name": "no mac", "port_table": [] }
        ]),
        json!([]),
    );
    let ctx = Auditor::default().context(&snap);
    assert_eq!(ctx.topology.switches.len(), 1);
    assert_eq!(ctx.topology.skipped.len(), 3);
}

#[test]
fn uplink_mismatch_reported_end_to_end() {
    let edge = json!({
        "mac": EDGE,
        "name": "Edge",
        "uplink": { "uplink_mac": CORE, "uplink_remote_port": 24, "port_idx": 1, "type": "wire" },
        "port_table": [
            port(1, true, &json!({ "forward": "customize", "tagged_vlan_mgmt": "custom",
                                   "excluded_networkconf_ids": ["net-cam"] })),
        ],
    });
    let snap = snapshot(
        json!([core_switch(vec![port(24, true, &json!({ "forward": "all" }))]), edge]),
        json!([]),
    );
    let report = Auditor::default().run(&snap);
    let trunk: Vec<&Finding> = report.findings_for("trunk.consistency").collect();
    assert_eq!(trunk.len(), 1);
    assert_eq!(trunk[0].metadata["upstream_only"], json!([40]));
    // Uplink ports are infrastructure, not edge trunks.
    assert_eq!(report.findings_for("port.edge-trunk").count(), 0);
}

// ── Firewall ────────────────────────────────────────────────────────

#[test]
fn shadowed_firewall_rule_reported() {
    let snap = Snapshot::from_value(json!({
        "firewall_rules": [
            {
                "_id": "r1", "name": "Allow web", "action": "allow", "index": 2000, "protocol": "tcp",
                "source": { "matching_target": "IP", "ips": ["192.168.1.0/24"] },
                "destination": { "matching_target": "ANY", "port": "80,443" }
            },
            {
                "_id": "r2", "name": "Block TLS", "action": "block", "index": 2001, "protocol": "tcp",
                "source": { "matching_target": "IP", "ips": ["192.168.1.50"] },
                "destination": { "matching_target": "ANY", "port": "443,8443" }
            },
            {
                "_id": "r3", "name": "Ping", "action": "allow", "index": 2002, "protocol": "icmp",
                "source": { "matching_target": "ANY" },
                "destination": { "matching_target": "ANY" }
            }
        ]
    }))
    .unwrap();
    let report = Auditor::default().run(&snap);
    let overlaps: Vec<&Finding> = report.findings_for("firewall.overlap").collect();
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].severity, Severity::Recommended);
    assert_eq!(overlaps[0].metadata["conflicting"], json!(true));
}

// ── Engine behaviour ────────────────────────────────────────────────

struct Broken;

impl Rule<AuditContext> for Broken {
    fn id(&self) -> &'static str {
        "test.broken"
    }

    fn evaluate(&self, _ctx: &AuditContext) -> Result<Vec<Finding>, AuditError> {
        Err(AuditError::rule(self.id(), "unreadable"))
    }
}

#[test]
fn failing_rule_does_not_stop_the_pass() {
    let mut engine = unifly_audit::default_rules();
    engine.register(Broken);
    let auditor = Auditor::with_engine(engine, AuditOptions::default());

    let snap = snapshot(json!([core_switch(vec![iot(1), iot(2)])]), json!([]));
    let report = auditor.run(&snap);
    assert_eq!(report.failed_rules.len(), 1);
    assert_eq!(report.failed_rules[0].rule_id, "test.broken");
    assert_eq!(report.findings_for("profile.consolidation").count(), 1);
}

#[test]
fn disabled_rule_is_not_run() {
    let mut engine: RuleEngine<AuditContext> = RuleEngine::default();
    engine.register(Broken);
    let options = AuditOptions {
        disabled_rules: BTreeSet::from(["test.broken".to_owned()]),
        ..AuditOptions::default()
    };
    let report = Auditor::with_engine(engine, options).run(&Snapshot::default());
    assert!(report.failed_rules.is_empty());
}

#[test]
fn findings_sorted_most_severe_first() {
    let snap = snapshot(
        json!([core_switch(vec![
            port(1, true, &json!({ "forward": "all" })),
            port(2, false, &json!({ "forward": "native" })),
            iot(3),
            iot(4),
        ])]),
        json!([]),
    );
    let report = Auditor::default().run(&snap);
    let severities: Vec<Severity> = report.findings.iter().map(|f| f.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
    assert!(report.score < 100);
}

#[test]
fn mac_addresses_normalize() {
    assert_eq!(MacAddress::new("AA-BB-CC-00-00-01").as_str(), CORE);
}
