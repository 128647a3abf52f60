//! Integration tests for the `unifly` CLI binary.
//!
//! These run the binary against a snapshot fixture and a throwaway config
//! directory; nothing touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `unifly` binary with env isolation.
///
/// Clears all `UNIFLY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn unifly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("unifly");
    cmd.env("HOME", "/tmp/unifly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/unifly-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("UNIFLY_CONFIG")
        .env_remove("UNIFLY_OUTPUT")
        .env_remove("UNIFLY_DEFAULTS__OUTPUT")
        .env_remove("UNIFLY_DEFAULTS__COLOR")
        .env_remove("UNIFLY_AUDIT__DISABLED_RULES")
        .env_remove("UNIFLY_AUDIT__MIN_GROUP_SIZE")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/site_snapshot.json")
}

fn fixture_arg() -> String {
    fixture().display().to_string()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = unifly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    unifly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("audit")
            .and(predicate::str::contains("topology"))
            .and(predicate::str::contains("ports"))
            .and(predicate::str::contains("firewall")),
    );
}

#[test]
fn test_version_flag() {
    unifly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("unifly"));
}

#[test]
fn test_invalid_output_format() {
    let output = unifly_cmd()
        .args(["--output", "invalid", "audit", &fixture_arg()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Completions ─────────────────────────────────────────────────────

#[test]
fn test_completions_generate() {
    for shell in ["bash", "zsh", "fish"] {
        unifly_cmd()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("unifly"));
    }
}

// ── Audit ───────────────────────────────────────────────────────────

#[test]
fn test_audit_json_report() {
    let output = unifly_cmd()
        .args(["audit", &fixture_arg(), "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report = stdout_json(&output);
    assert!(report["score"].as_u64().unwrap() < 100);
    let rules: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["rule_id"].as_str().unwrap())
        .collect();
    assert!(rules.contains(&"port.unused"));
    assert!(rules.contains(&"profile.consolidation"));
    assert!(rules.contains(&"firewall.overlap"));
    assert!(report["failed_rules"].as_array().unwrap().is_empty());
}

#[test]
fn test_audit_table_summary() {
    unifly_cmd()
        .args(["audit", &fixture_arg()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Score:")
                .and(predicate::str::contains("port.edge-trunk"))
                .and(predicate::str::contains("Office Switch")),
        );
}

#[test]
fn test_audit_reads_stdin() {
    let raw = std::fs::read_to_string(fixture()).unwrap();
    unifly_cmd()
        .args(["audit", "-", "-o", "plain"])
        .write_stdin(raw)
        .assert()
        .success()
        .stdout(predicate::str::contains("firewall.overlap"));
}

#[test]
fn test_audit_disable_rule() {
    let output = unifly_cmd()
        .args(["audit", &fixture_arg(), "--disable", "port.unused", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert!(
        report["findings"]
            .as_array()
            .unwrap()
            .iter()
            .all(|f| f["rule_id"] != "port.unused")
    );
}

#[test]
fn test_audit_unknown_rule_is_usage_error() {
    unifly_cmd()
        .args(["audit", &fixture_arg(), "--disable", "port.typo"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("port.typo"));
}

#[test]
fn test_audit_min_severity_filters_output() {
    let output = unifly_cmd()
        .args(["audit", &fixture_arg(), "--min-severity", "recommended", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert!(
        report["findings"]
            .as_array()
            .unwrap()
            .iter()
            .all(|f| f["severity"] != "informational")
    );
}

#[test]
fn test_audit_fail_on_threshold() {
    unifly_cmd()
        .args(["audit", &fixture_arg(), "--fail-on", "informational", "-q"])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_audit_missing_snapshot() {
    unifly_cmd()
        .args(["audit", "/tmp/unifly-cli-test-nonexistent/site.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_audit_invalid_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();
    unifly_cmd()
        .args(["audit", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid snapshot"));
}

// ── Read-only views ─────────────────────────────────────────────────

#[test]
fn test_rules_listing() {
    unifly_cmd().arg("rules").assert().success().stdout(
        predicate::str::contains("port.unused")
            .and(predicate::str::contains("trunk.consistency"))
            .and(predicate::str::contains("switch.settings")),
    );
}

#[test]
fn test_topology_skips_passthrough_ap() {
    unifly_cmd()
        .args(["topology", &fixture_arg(), "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("74:ac:b9:00:00:02")
                .and(predicate::str::contains("74:ac:b9:00:00:03").not()),
        );
}

#[test]
fn test_ports_for_device() {
    let output = unifly_cmd()
        .args(["ports", &fixture_arg(), "--device", "office switch", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let ports = stdout_json(&output);
    let ports = ports.as_array().unwrap();
    assert_eq!(ports.len(), 8);
    assert!(ports.iter().all(|p| p["device_mac"] == "74:ac:b9:00:00:02"));
}

#[test]
fn test_ports_unknown_device() {
    unifly_cmd()
        .args(["ports", &fixture_arg(), "--device", "basement"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("basement"));
}

#[test]
fn test_profiles_suggest() {
    let output = unifly_cmd()
        .args(["profiles", "suggest", &fixture_arg(), "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let suggestions = stdout_json(&output);
    let cameras: Vec<&Value> = suggestions
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["signature"]["native_network_id"] == "net-cam")
        .collect();
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0]["kind"], "create_new");
    assert_eq!(cameras[0]["poe_required"], true);
    let ports: Vec<u64> = cameras[0]["ports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["port"].as_u64().unwrap())
        .collect();
    assert_eq!(ports, [1, 2, 3]);
}

#[test]
fn test_profiles_list() {
    unifly_cmd()
        .args(["profiles", "list", &fixture_arg(), "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prof-off"));
}

#[test]
fn test_firewall_overlaps() {
    unifly_cmd()
        .args(["firewall", "overlaps", &fixture_arg(), "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fw-1 fw-2"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    unifly_cmd()
        .args(["--config", "/tmp/unifly-cli-test/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_no_config() {
    // A missing file is not an error; defaults are shown.
    unifly_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Min group size"));
}

#[test]
fn test_config_init_set_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    unifly_cmd()
        .args(["--config", path, "config", "init"])
        .assert()
        .success();
    unifly_cmd()
        .args(["--config", path, "config", "set", "audit.min_group_size", "4"])
        .assert()
        .success();

    let output = unifly_cmd()
        .args(["--config", path, "config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["audit"]["min_group_size"], 4);

    // Existing file: overwriting needs --yes when stdin is not a terminal.
    unifly_cmd()
        .args(["--config", path, "config", "init"])
        .assert()
        .code(2);
    unifly_cmd()
        .args(["--config", path, "--yes", "config", "init"])
        .assert()
        .success();
}

#[test]
fn test_config_set_rejects_unknown_rule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    unifly_cmd()
        .args([
            "--config",
            path.to_str().unwrap(),
            "config",
            "set",
            "audit.disabled_rules",
            "port.typo",
        ])
        .assert()
        .code(2);
    assert!(!path.exists());
}

#[test]
fn test_config_defaults_apply_to_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[defaults]\noutput = \"json\"\n\n[audit]\ndisabled_rules = [\"firewall.overlap\"]\n",
    )
    .unwrap();

    let output = unifly_cmd()
        .args(["--config", path.to_str().unwrap(), "audit", &fixture_arg()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert!(
        report["findings"]
            .as_array()
            .unwrap()
            .iter()
            .all(|f| f["rule_id"] != "firewall.overlap")
    );
}
