//! Builder wiring one sensor, one pump and one metrics sink into the two loops.
//!
//! All validation happens in `try_build()`, before any loop exists, so a bad
//! setting can never surface mid-run.

use std::sync::Arc;
use std::time::Duration;

use soil_traits::clock::{Clock, MonotonicClock};
use soil_traits::{MetricsSink, MoistureSensor, Pump};

use crate::calibration::Calibration;
use crate::control::{ControlLoop, WateringPolicy};
use crate::error::BuildError;
use crate::gate::SensorGate;
use crate::metrics::SoilMetrics;
use crate::schedule::DEFAULT_BACKOFF;
use crate::tracking::TrackingLoop;

pub type DynSensor = Box<dyn MoistureSensor + Send>;
pub type DynPump = Box<dyn Pump + Send>;
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Every tunable of the controller, as validated at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub calibration: Calibration,
    pub tracking_interval: Duration,
    pub control_interval: Duration,
    pub policy: WateringPolicy,
    pub backoff: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            tracking_interval: Duration::from_secs(1),
            control_interval: Duration::from_secs(60),
            policy: WateringPolicy::default(),
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl ControllerSettings {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.tracking_interval.is_zero() {
            return Err(BuildError::InvalidConfig("tracking interval must be > 0"));
        }
        if self.control_interval.is_zero() {
            return Err(BuildError::InvalidConfig("control interval must be > 0"));
        }
        let t = self.policy.dry_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(BuildError::InvalidConfig(
                "dry threshold must be in [0.0, 1.0]",
            ));
        }
        if self.policy.water_duration.is_zero() {
            return Err(BuildError::InvalidConfig("water duration must be > 0"));
        }
        if self.backoff.is_zero() {
            return Err(BuildError::InvalidConfig("read backoff must be > 0"));
        }
        Ok(())
    }
}

/// Both loops, sharing one gate and one metrics sink.
pub struct Controller {
    pub tracking: TrackingLoop<DynSensor, SharedClock>,
    pub control: ControlLoop<DynSensor, DynPump, SharedClock>,
    gate: Arc<SensorGate<DynSensor>>,
    metrics: Arc<dyn MetricsSink>,
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// The shared sensor gate (e.g. for a one-off self-check read).
    pub fn gate(&self) -> &Arc<SensorGate<DynSensor>> {
        &self.gate
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("calibration", self.gate.calibration())
            .field("policy", self.control.policy())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ControllerBuilder {
    sensor: Option<DynSensor>,
    pump: Option<DynPump>,
    metrics: Option<Arc<dyn MetricsSink>>,
    clock: Option<SharedClock>,
    settings: ControllerSettings,
}

impl ControllerBuilder {
    pub fn with_sensor(mut self, sensor: impl MoistureSensor + Send + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn with_pump(mut self, pump: impl Pump + Send + 'static) -> Self {
        self.pump = Some(Box::new(pump));
        self
    }

    /// Defaults to a fresh `SoilMetrics` when not set.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Defaults to `MonotonicClock` when not set.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.settings.calibration = calibration;
        self
    }

    pub fn with_tracking_interval(mut self, interval: Duration) -> Self {
        self.settings.tracking_interval = interval;
        self
    }

    pub fn with_control_interval(mut self, interval: Duration) -> Self {
        self.settings.control_interval = interval;
        self
    }

    pub fn with_dry_threshold(mut self, threshold: f64) -> Self {
        self.settings.policy.dry_threshold = threshold;
        self
    }

    pub fn with_water_duration(mut self, duration: Duration) -> Self {
        self.settings.policy.water_duration = duration;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.settings.backoff = backoff;
        self
    }

    pub fn try_build(self) -> Result<Controller, BuildError> {
        let sensor = self.sensor.ok_or(BuildError::MissingSensor)?;
        let pump = self.pump.ok_or(BuildError::MissingPump)?;
        let s = self.settings;
        s.validate()?;

        let metrics: Arc<dyn MetricsSink> = self
            .metrics
            .unwrap_or_else(|| Arc::new(SoilMetrics::new()));
        let clock: SharedClock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let gate = Arc::new(SensorGate::new(sensor, s.calibration));

        let tracking = TrackingLoop::new(
            gate.clone(),
            metrics.clone(),
            clock.clone(),
            s.tracking_interval,
            s.backoff,
        );
        let control = ControlLoop::new(
            gate.clone(),
            pump,
            metrics.clone(),
            clock,
            s.control_interval,
            s.backoff,
            s.policy,
        );
        tracing::debug!(
            wet_raw = s.calibration.wet_raw(),
            dry_raw = s.calibration.dry_raw(),
            "controller built"
        );

        Ok(Controller {
            tracking,
            control,
            gate,
            metrics,
        })
    }
}
