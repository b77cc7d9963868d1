//! Smoke tests for the `formalizer` binary's subcommands.
//!
//! Spawns the built binary via `std::process::Command` and checks its
//! exit codes and stdout shape directly.

use std::process::Command;

fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_formalizer"))
}

#[test]
fn add_node_succeeds_with_defaults() {
    let output = Command::new(binary())
        .args(["add-node", "--desc", "write report", "--topic", "work"])
        .output()
        .expect("failed to run formalizer add-node");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("added node"));
}

#[test]
fn add_node_json_format_is_valid_json() {
    let output = Command::new(binary())
        .args(["add-node", "--desc", "x", "--topic", "work", "--format", "json"])
        .output()
        .expect("failed to run formalizer add-node");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert!(parsed["node_id"].is_string());
}

#[test]
fn add_node_rejects_unknown_property() {
    let output = Command::new(binary())
        .args(["add-node", "--desc", "x", "--topic", "work", "--property", "bogus"])
        .output()
        .expect("failed to run formalizer add-node");
    assert!(!output.status.success());
}

#[test]
fn add_edge_reports_inherited_target_date() {
    let output = Command::new(binary())
        .args(["add-edge"])
        .output()
        .expect("failed to run formalizer add-edge");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("inherits effective target date"));
}

#[test]
fn eps_update_exact_scenario_runs() {
    let output = Command::new(binary())
        .args(["eps-update", "--scenario", "exact"])
        .output()
        .expect("failed to run formalizer eps-update");
    assert!(output.status.success());
}

#[test]
fn eps_update_unknown_scenario_fails() {
    let output = Command::new(binary())
        .args(["eps-update", "--scenario", "bogus"])
        .output()
        .expect("failed to run formalizer eps-update");
    assert!(!output.status.success());
}

#[test]
fn pack_produces_filled_minutes() {
    let output = Command::new(binary())
        .args(["pack", "--format", "json"])
        .output()
        .expect("failed to run formalizer pack");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert!(parsed["filled_minutes"].as_u64().unwrap() > 0);
}
