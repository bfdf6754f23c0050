use rstest::rstest;
use soil_config::{load_file, load_toml};
use std::io::Write;

const FULL: &str = r#"
[calibration]
wet_raw = 8500
dry_raw = 19000

[tracking]
interval_ms = 1000

[control]
interval_ms = 60000
dry_threshold = 0.25
water_ms = 5000

[retry]
backoff_ms = 5000

[sensor]
i2c_bus = 1
address = 0x48
retries = 5
conversion_timeout_ms = 20

[pump]
pin = 9
active_low = true

[startup]
pump_test_ms = 1000

[metrics]
listen = "0.0.0.0:5000"

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.startup.pump_test_ms, 1000);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[rstest]
#[case("[calibration]\nwet_raw = 19000\ndry_raw = 8500\n", "must be < calibration.dry_raw")]
#[case("[calibration]\nwet_raw = 12000\ndry_raw = 12000\n", "must be < calibration.dry_raw")]
#[case("[tracking]\ninterval_ms = 0\n", "tracking.interval_ms must be > 0")]
#[case("[control]\ninterval_ms = 0\n", "control.interval_ms must be > 0")]
#[case("[control]\ndry_threshold = 1.5\n", "dry_threshold must be in [0.0, 1.0]")]
#[case("[control]\ndry_threshold = -0.1\n", "dry_threshold must be in [0.0, 1.0]")]
#[case("[control]\ndry_threshold = nan\n", "dry_threshold must be in [0.0, 1.0]")]
#[case("[control]\nwater_ms = 0\n", "control.water_ms must be > 0")]
#[case("[retry]\nbackoff_ms = 0\n", "retry.backoff_ms must be > 0")]
#[case("[sensor]\nretries = 0\n", "sensor.retries must be >= 1")]
#[case("[sensor]\naddress = 0x80\n", "7-bit")]
#[case("[metrics]\nlisten = \"not-an-addr\"\n", "not a socket address")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn threshold_bounds_are_inclusive() {
    for t in ["0.0", "1.0"] {
        let cfg = load_toml(&format!("[control]\ndry_threshold = {t}\n")).expect("parse");
        cfg.validate().expect("bounds are valid");
    }
}

#[test]
fn load_file_reads_and_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("soil.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "[pump]\npin = 17\nactive_low = false").unwrap();
    let cfg = load_file(&path).expect("load");
    assert_eq!(cfg.pump.pin, 17);
    assert!(!cfg.pump.active_low);

    let missing = dir.path().join("nope.toml");
    let err = load_file(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("nope.toml"));
}
