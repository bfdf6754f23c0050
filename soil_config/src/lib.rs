#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the soil moisture controller.
//!
//! - `Config` and its sections are deserialized from TOML; every section has
//!   defaults so an empty document is a usable config.
//! - `Config::validate` rejects anything the controller cannot run with. It is
//!   called once at startup, before any hardware is touched.
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Raw reference points of the capacitive probe.
///
/// The probe reads lower the wetter the soil is, so `wet_raw < dry_raw`.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Raw value with the probe in saturated soil
    pub wet_raw: i32,
    /// Raw value with the probe in bone-dry soil
    pub dry_raw: i32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            wet_raw: 8500,
            dry_raw: 19000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TrackingCfg {
    /// Gauge refresh period (ms)
    pub interval_ms: u64,
}

impl Default for TrackingCfg {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ControlCfg {
    /// Irrigation decision period (ms)
    pub interval_ms: u64,
    /// Water when the normalized moisture is strictly below this, in [0.0, 1.0]
    pub dry_threshold: f64,
    /// Pump on-time per watering (ms)
    pub water_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            dry_threshold: 0.25,
            water_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RetryCfg {
    /// Pause after a failed sensor read before trying again (ms)
    pub backoff_ms: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self { backoff_ms: 5000 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SensorCfg {
    /// Linux I2C bus number (/dev/i2c-N)
    pub i2c_bus: u8,
    /// 7-bit ADS1115 address
    pub address: u16,
    /// Attempts per read before the driver gives up
    pub retries: u32,
    /// Max time to wait for a single-shot conversion to finish
    pub conversion_timeout_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x48,
            retries: 5,
            conversion_timeout_ms: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PumpCfg {
    /// BCM pin driving the pump relay
    pub pin: u8,
    /// Relay closes when the pin is driven low
    pub active_low: bool,
}

impl Default for PumpCfg {
    fn default() -> Self {
        Self {
            pin: 9,
            active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct StartupCfg {
    /// Pulse the pump this long at startup to prove the wiring (0 disables)
    pub pump_test_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsCfg {
    /// Scrape endpoint bind address
    pub listen: String,
}

impl Default for MetricsCfg {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
        }
    }
}

impl MetricsCfg {
    pub fn socket_addr(&self) -> eyre::Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| eyre::eyre!("metrics.listen {:?} is not a socket address: {e}", self.listen))
    }
}

/// Log file rotation policy.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Never,
    Daily,
    Hourly,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub calibration: CalibrationCfg,
    pub tracking: TrackingCfg,
    pub control: ControlCfg,
    pub retry: RetryCfg,
    pub sensor: SensorCfg,
    pub pump: PumpCfg,
    pub startup: StartupCfg,
    pub metrics: MetricsCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. Validation is left to the caller.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Calibration
        if self.calibration.wet_raw >= self.calibration.dry_raw {
            eyre::bail!(
                "calibration.wet_raw ({}) must be < calibration.dry_raw ({})",
                self.calibration.wet_raw,
                self.calibration.dry_raw
            );
        }

        // Tracking
        if self.tracking.interval_ms == 0 {
            eyre::bail!("tracking.interval_ms must be > 0");
        }

        // Control
        if self.control.interval_ms == 0 {
            eyre::bail!("control.interval_ms must be > 0");
        }
        if !self.control.dry_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.control.dry_threshold)
        {
            eyre::bail!("control.dry_threshold must be in [0.0, 1.0]");
        }
        if self.control.water_ms == 0 {
            eyre::bail!("control.water_ms must be > 0");
        }
        if self.control.water_ms > 10 * 60 * 1000 {
            eyre::bail!("control.water_ms is unreasonably large (>10min)");
        }

        // Retry
        if self.retry.backoff_ms == 0 {
            eyre::bail!("retry.backoff_ms must be > 0");
        }

        // Sensor
        if self.sensor.retries == 0 {
            eyre::bail!("sensor.retries must be >= 1");
        }
        if self.sensor.conversion_timeout_ms == 0 {
            eyre::bail!("sensor.conversion_timeout_ms must be >= 1");
        }
        if self.sensor.address > 0x7f {
            eyre::bail!("sensor.address must be a 7-bit I2C address");
        }

        // Metrics
        self.metrics.socket_addr()?;

        Ok(())
    }
}
