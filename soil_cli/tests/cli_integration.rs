use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Fast loops and an ephemeral metrics port so runs finish quickly and never clash
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[calibration]
wet_raw = 8500
dry_raw = 19000

[tracking]
interval_ms = 10

[control]
interval_ms = 20
dry_threshold = 0.25
water_ms = 5

[retry]
backoff_ms = 10

[metrics]
listen = "127.0.0.1:0"
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check", "--sim"], 0, "sensor ok: raw=", "stdout")]
#[case(&["pump-test", "--sim", "--ms", "5"], 0, "pump ok: on_ms=", "stdout")]
#[case(&["run", "--sim", "--for-ms", "200"], 0, "stopped: moisture=", "stdout")]
#[case(&["pump-test", "--sim"], 2, "required", "stderr")]
#[case(&["pump-test", "--sim", "--ms", "0"], 2, "Invalid configuration", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("soil_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case("[calibration]\nwet_raw = 19000\ndry_raw = 8500\n", "wet_raw")]
#[case("[control]\ndry_threshold = 1.5\n", "dry_threshold")]
#[case("[logging]\nrotation = \"weekly\"\n", "weekly")]
#[case("[tracking]\ninterval_ms = \"fast\"\n", "fast")]
fn invalid_config_exits_2(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();

    Command::cargo_bin("soil_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .arg("--sim")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("soil_cli")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check")
        .arg("--sim")
        .assert()
        .code(2);
}

#[test]
fn missing_default_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("soil_cli")
        .unwrap()
        .current_dir(dir.path())
        .arg("self-check")
        .arg("--sim")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensor ok"))
        .stderr(predicate::str::contains("using built-in defaults"));
}

#[test]
fn startup_pump_test_runs_before_loops() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut text = fs::read_to_string(&cfg).unwrap();
    text.push_str("\n[startup]\npump_test_ms = 5\n");
    fs::write(&cfg, text).unwrap();

    Command::cargo_bin("soil_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--sim")
        .arg("--for-ms")
        .arg("100")
        .assert()
        .success()
        .stderr(predicate::str::contains("startup pump test ok"))
        .stdout(predicate::str::contains("stopped:"));
}
