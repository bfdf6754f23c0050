//! Conversions bridging `soil_config` types to `soil_core` types.

use std::time::Duration;

use crate::builder::ControllerSettings;
use crate::calibration::Calibration;
use crate::control::WateringPolicy;
use crate::error::BuildError;

// ── Calibration ──────────────────────────────────────────────────────────────

impl TryFrom<&soil_config::CalibrationCfg> for Calibration {
    type Error = BuildError;
    fn try_from(c: &soil_config::CalibrationCfg) -> Result<Self, Self::Error> {
        Calibration::new(c.wet_raw, c.dry_raw)
    }
}

// ── WateringPolicy ───────────────────────────────────────────────────────────

impl From<&soil_config::ControlCfg> for WateringPolicy {
    fn from(c: &soil_config::ControlCfg) -> Self {
        Self {
            dry_threshold: c.dry_threshold,
            water_duration: Duration::from_millis(c.water_ms),
        }
    }
}

// ── ControllerSettings ───────────────────────────────────────────────────────

impl TryFrom<&soil_config::Config> for ControllerSettings {
    type Error = BuildError;
    fn try_from(c: &soil_config::Config) -> Result<Self, Self::Error> {
        let settings = Self {
            calibration: (&c.calibration).try_into()?,
            tracking_interval: Duration::from_millis(c.tracking.interval_ms),
            control_interval: Duration::from_millis(c.control.interval_ms),
            policy: (&c.control).into(),
            backoff: Duration::from_millis(c.retry.backoff_ms),
        };
        settings.validate()?;
        Ok(settings)
    }
}
