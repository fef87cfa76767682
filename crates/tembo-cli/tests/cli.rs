//! End-to-end tests for the `tembo` binary.
//!
//! Each test runs the binary as a subprocess with a small population and an
//! isolated config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const SMALL: [&str; 10] = [
    "--families",
    "2",
    "--generations",
    "3",
    "--herds",
    "3",
    "--events",
    "40",
    "--years",
    "12",
];

fn tembo(config_home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tembo"));
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd.env("HOME", config_home);
    cmd.env("TEMBO_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd.env_remove("TEMBO_TIMING");
    cmd
}

fn json_of(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap_or_else(|e| panic!("spawn failed: {e}"));
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| panic!("invalid JSON: {e}"))
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

#[test]
fn demo_collects_everything_after_breaking_all() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let report = json_of(
        tembo(dir.path())
            .args(["demo", "--format", "json", "--seed", "11"])
            .args(SMALL),
    );

    assert_eq!(report["invariants_ok"], Value::Bool(true));
    let snapshots = report["snapshots"].as_array().cloned().unwrap_or_default();
    assert_eq!(snapshots.len(), 4);

    let populated = &snapshots[1]["archive"];
    let broken = &snapshots[2]["archive"];
    let collected = &snapshots[3]["archive"];
    assert!(populated["live_elephants"].as_u64().unwrap_or(0) > 0);
    // Breaking orphans but frees nothing.
    assert_eq!(broken["live_elephants"], populated["live_elephants"]);
    assert_eq!(broken["orphaned"], populated["live_elephants"]);
    // Collection frees every orphan.
    assert_eq!(collected["live_elephants"].as_u64(), Some(0));
    assert_eq!(collected["collected_total"], populated["live_elephants"]);
}

#[test]
fn demo_family_scope_leaves_other_families() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let report = json_of(
        tembo(dir.path())
            .args(["demo", "--scope", "family", "--format", "json", "--seed", "3"])
            .args(SMALL),
    );
    assert_eq!(report["invariants_ok"], Value::Bool(true));
    let left = report["snapshots"][3]["archive"]["live_elephants"]
        .as_u64()
        .unwrap_or(0);
    assert!(left > 0, "second family should survive");
    assert_eq!(report["collection"]["still_orphaned"].as_u64(), Some(0));
}

#[test]
fn demo_pretty_output_names_every_phase() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["demo", "--format", "pretty"])
        .args(SMALL)
        .assert()
        .success()
        .stdout(predicate::str::contains("references broken"))
        .stdout(predicate::str::contains("collected"))
        .stdout(predicate::str::contains("invariants:"));
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn same_seed_exports_the_same_archive() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let a = json_of(tembo(dir.path()).args(["export", "--seed", "5"]).args(SMALL));
    let b = json_of(tembo(dir.path()).args(["export", "--seed", "5"]).args(SMALL));
    assert_eq!(a["archive"], b["archive"]);
    assert_eq!(a["seed"].as_u64(), Some(5));
}

#[test]
fn export_to_file_after_collect_is_empty_of_elephants() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("archive.json");
    tembo(dir.path())
        .args(["export", "--after-collect", "--format", "text", "--output"])
        .arg(&path)
        .args(SMALL)
        .assert()
        .success()
        .stdout(predicate::str::contains("archive.json"));

    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{e}"));
    let doc: Value = serde_json::from_str(&text).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(doc["archive"]["elephants"].as_array().map(Vec::len), Some(0));
    assert_eq!(doc["archive"]["events"].as_array().map(Vec::len), Some(40));
}

#[test]
fn events_by_year_only_returns_that_year() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let list = json_of(
        tembo(dir.path())
            .args(["events", "--year", "2010", "--limit", "1000", "--format", "json"])
            .args(SMALL),
    );
    let events = list["events"].as_array().cloned().unwrap_or_default();
    assert_eq!(list["total"].as_u64(), Some(events.len() as u64));
    assert!(events.iter().all(|e| e["year"].as_i64() == Some(2010)));
}

#[test]
fn events_near_a_point_are_sorted_by_distance() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let list = json_of(
        tembo(dir.path())
            .args(["events", "--near", "23.5", "-19.0", "--radius", "2.5"])
            .args(["--limit", "1000", "--format", "json"])
            .args(SMALL),
    );
    let distances: Vec<f64> = list["events"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e["distance"].as_f64())
        .collect();
    assert_eq!(list["total"].as_u64(), Some(distances.len() as u64));
    assert!(distances.iter().all(|d| *d <= 2.5));
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn negative_radius_is_rejected() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["events", "--near", "0", "0", "--radius", "-1", "--format", "text"])
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"));
}

#[test]
fn visits_list_years_in_order() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let report = json_of(
        tembo(dir.path())
            .args(["visits", "1", "--visits", "300", "--format", "json"])
            .args(SMALL),
    );
    let years: Vec<i64> = report["years"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|y| y["year"].as_i64())
        .collect();
    assert!(!years.is_empty());
    assert!(years.windows(2).all(|w| w[0] < w[1]));

    tembo(dir.path())
        .args(["visits", "999", "--format", "text"])
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn nearest_finds_a_source_near_the_delta() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let hit = json_of(
        tembo(dir.path())
            .args(["nearest", "--x", "23.0", "--y", "-19.3", "--year", "2003", "--format", "json"])
            .args(SMALL),
    );
    assert!(hit["distance"].as_f64().is_some_and(f64::is_finite));
    assert!(hit["name"].as_str().is_some_and(|n| !n.is_empty()));
}

#[test]
fn reversed_drought_range_fails_with_code() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["droughts", "--from", "2010", "--to", "2000", "--format", "text"])
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid range"))
        .stderr(predicate::str::contains("E4002"));
}

#[test]
fn timeline_of_unknown_elephant_is_not_found() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["timeline", "999999", "--format", "json"])
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error_code\": \"E2001\""));
}

#[test]
fn timeline_of_a_founder_has_no_ancestors() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let timeline = json_of(
        tembo(dir.path())
            .args(["timeline", "1", "--format", "json"])
            .args(SMALL),
    );
    assert!(timeline["name"].as_str().is_some_and(|n| n.starts_with("Matriarch_")));
    assert_eq!(timeline["ancestors"].as_array().map(Vec::len), Some(0));
    assert_eq!(timeline["entries"][0]["type"].as_str(), Some("born"));
}

#[test]
fn zero_alert_period_is_rejected() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["alerts", "--year", "2025", "--period", "0"])
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("anniversary period"));
}

// ---------------------------------------------------------------------------
// Ambient
// ---------------------------------------------------------------------------

#[test]
fn invalid_config_file_is_reported() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[index]\ncell_size = -1.0\n").unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["stats", "--config"])
        .arg(&path)
        .args(SMALL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cell_size"));
}

#[test]
fn oversized_population_is_rejected() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["stats", "--generations", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_generations"));
}

#[test]
fn timing_report_goes_to_stderr() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["stats", "--timing", "--format", "text"])
        .args(SMALL)
        .assert()
        .success()
        .stderr(predicate::str::contains("populate"))
        .stdout(predicate::str::contains("elephants\t"));
}

#[test]
fn completions_mention_the_binary() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("{e}"));
    tembo(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tembo"));
}
