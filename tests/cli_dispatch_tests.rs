use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_pitwall")
}

fn unique_temp_path(name: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("pitwall-{name}-{stamp}.{ext}"))
}

const SCENARIO_YAML: &str = r#"
constants:
  race_time_hours: 8
  pit_time_seconds: 52
  long_pit_time_seconds: 210
  mandatory_driver_swaps: 3
plans:
  - id: push
    name: Push
    duration: 75
  - id: semi
    name: Semi Lift
    duration: 80
  - id: full
    name: Full Lift
    duration: 90
"#;

fn write_scenario(name: &str) -> PathBuf {
    let path = unique_temp_path(name, "yaml");
    fs::write(&path, SCENARIO_YAML).expect("scenario should be written");
    path
}

#[test]
fn missing_command_prints_usage() {
    let output = Command::new(bin()).output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: pitwall"));
}

#[test]
fn plan_command_emits_json_report() {
    let scenario = write_scenario("plan");
    let output = Command::new(bin())
        .args(["plan", scenario.to_str().expect("utf8 path")])
        .output()
        .expect("plan should run");
    let _ = fs::remove_file(&scenario);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("plan should emit json");
    assert_eq!(payload["mandatory_swaps"], 3);
    assert!(!payload["combinations"]
        .as_array()
        .expect("combinations array")
        .is_empty());
}

#[test]
fn plan_command_writes_csv() {
    let scenario = write_scenario("csv");
    let output = Command::new(bin())
        .args(["plan", scenario.to_str().expect("utf8 path"), "--csv"])
        .output()
        .expect("plan should run");
    let _ = fs::remove_file(&scenario);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert!(lines
        .next()
        .unwrap_or_default()
        .starts_with("rank,id,strategy,"));
    assert!(lines.next().unwrap_or_default().starts_with("1,"));
}

#[test]
fn plan_command_without_path_is_usage_error() {
    let output = Command::new(bin())
        .arg("plan")
        .output()
        .expect("plan should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_command_passes_and_fails() {
    let good = write_scenario("valid");
    let output = Command::new(bin())
        .args(["validate", good.to_str().expect("utf8 path")])
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&good);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("validation passed"));

    let bad = unique_temp_path("invalid", "json");
    fs::write(
        &bad,
        r#"{"plans": [{"name": "A", "duration": 90}], "required_minutes": 375, "mandatory_swaps": 5}"#,
    )
    .expect("scenario should be written");
    let output = Command::new(bin())
        .args(["validate", bad.to_str().expect("utf8 path")])
        .output()
        .expect("validate should run");
    let _ = fs::remove_file(&bad);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation failed"));
}

#[test]
fn presets_save_list_and_delete() {
    let dir = unique_temp_path("presets", "d");
    let scenario = write_scenario("preset");
    let run = |args: &[&str]| {
        Command::new(bin())
            .args(args)
            .env("PITWALL_PRESETS", &dir)
            .output()
            .expect("presets should run")
    };

    let saved = run(&["presets", "save", "Spa 6h", scenario.to_str().expect("utf8 path")]);
    assert_eq!(saved.status.code(), Some(0));

    let duplicate = run(&["presets", "save", "Spa 6h", scenario.to_str().expect("utf8 path")]);
    assert_eq!(duplicate.status.code(), Some(1));

    let listed = run(&["presets", "list"]);
    assert_eq!(listed.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&listed.stdout).contains("Spa 6h\t8h race"));

    let deleted = run(&["presets", "delete", "Spa 6h"]);
    assert_eq!(deleted.status.code(), Some(0));

    let missing = run(&["presets", "show", "Spa 6h"]);
    assert_eq!(missing.status.code(), Some(1));

    let _ = fs::remove_file(&scenario);
    let _ = fs::remove_dir_all(&dir);
}
