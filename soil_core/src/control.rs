//! Slow loop: observe moisture and water when the soil is too dry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use soil_traits::{Clock, MetricsSink, MoistureSensor, Pump};

use crate::actuator::ActuatorController;
use crate::calibration::MoistureLevel;
use crate::error::Result;
use crate::gate::SensorGate;
use crate::schedule::{Ticker, sleep_interruptible, sleep_until_interruptible};
use crate::util::duration_ms;

/// Threshold and on-time of the irrigation rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WateringPolicy {
    /// Water when moisture is strictly below this.
    pub dry_threshold: f64,
    pub water_duration: Duration,
}

impl Default for WateringPolicy {
    fn default() -> Self {
        Self {
            dry_threshold: 0.25,
            water_duration: Duration::from_secs(5),
        }
    }
}

impl WateringPolicy {
    #[inline]
    pub fn should_water(&self, level: MoistureLevel) -> bool {
        level.value() < self.dry_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlOutcome {
    /// Pump ran; the counter was credited with the configured duration.
    Watered {
        level: MoistureLevel,
        on_time: Duration,
    },
    /// Wet enough; nothing to do this tick.
    Skipped(MoistureLevel),
    /// Read failed; the backoff has already been slept.
    ReadFailed,
}

pub struct ControlLoop<S, P: Pump, C: Clock> {
    gate: Arc<SensorGate<S>>,
    actuator: ActuatorController<P, C>,
    metrics: Arc<dyn MetricsSink>,
    clock: C,
    interval: Duration,
    backoff: Duration,
    policy: WateringPolicy,
}

impl<S: MoistureSensor, P: Pump, C: Clock + Clone> ControlLoop<S, P, C> {
    pub fn new(
        gate: Arc<SensorGate<S>>,
        pump: P,
        metrics: Arc<dyn MetricsSink>,
        clock: C,
        interval: Duration,
        backoff: Duration,
        policy: WateringPolicy,
    ) -> Self {
        Self {
            gate,
            actuator: ActuatorController::new(pump, clock.clone()),
            metrics,
            clock,
            interval,
            backoff,
            policy,
        }
    }

    pub fn policy(&self) -> &WateringPolicy {
        &self.policy
    }

    pub fn actuator(&self) -> &ActuatorController<P, C> {
        &self.actuator
    }

    /// One iteration: read, decide, maybe water.
    ///
    /// Only actuation failures are returned as errors; they are fatal.
    pub fn tick(&mut self, shutdown: &AtomicBool) -> Result<ControlOutcome> {
        // the gate lock is released before any watering starts
        let read = self.gate.read_moisture();
        match read {
            Ok(level) if self.policy.should_water(level) => {
                tracing::info!(
                    level = level.value(),
                    threshold = self.policy.dry_threshold,
                    "soil below dry threshold; watering"
                );
                let on_time = self.actuator.run_pump(self.policy.water_duration)?;
                self.metrics
                    .add_pump_uptime_ms(duration_ms(self.policy.water_duration));
                Ok(ControlOutcome::Watered { level, on_time })
            }
            Ok(level) => {
                tracing::debug!(
                    level = level.value(),
                    threshold = self.policy.dry_threshold,
                    "soil wet enough"
                );
                Ok(ControlOutcome::Skipped(level))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backoff_ms = duration_ms(self.backoff),
                    "control read failed; backing off"
                );
                sleep_interruptible(&self.clock, self.backoff, shutdown);
                Ok(ControlOutcome::ReadFailed)
            }
        }
    }

    /// Run until `shutdown` is raised or actuation fails.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let mut ticker = Ticker::new(self.clock.now(), self.interval);
        let mut retrying = false;
        tracing::info!(
            interval_ms = duration_ms(self.interval),
            threshold = self.policy.dry_threshold,
            water_ms = duration_ms(self.policy.water_duration),
            "control loop started"
        );

        while !shutdown.load(Ordering::Relaxed) {
            if !retrying {
                let deadline = ticker.next_tick(self.clock.now());
                if !sleep_until_interruptible(&self.clock, deadline, shutdown) {
                    break;
                }
            }
            match self.tick(shutdown)? {
                ControlOutcome::ReadFailed => retrying = true,
                ControlOutcome::Watered { .. } | ControlOutcome::Skipped(_) => {
                    if retrying {
                        ticker.resync(self.clock.now());
                    }
                    retrying = false;
                }
            }
        }

        tracing::info!(
            pump_uptime_ms = self.actuator.cumulative_uptime_ms(),
            "control loop stopped"
        );
        Ok(())
    }
}
