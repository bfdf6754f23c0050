//! Fast loop: observe moisture and publish it to the gauge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use soil_traits::{Clock, MetricsSink, MoistureSensor};

use crate::calibration::MoistureLevel;
use crate::error::Result;
use crate::gate::SensorGate;
use crate::schedule::{Ticker, sleep_interruptible, sleep_until_interruptible};
use crate::util::duration_ms;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackOutcome {
    /// Gauge updated with this level.
    Published(MoistureLevel),
    /// Read failed; the backoff has already been slept.
    ReadFailed,
}

pub struct TrackingLoop<S, C> {
    gate: Arc<SensorGate<S>>,
    metrics: Arc<dyn MetricsSink>,
    clock: C,
    interval: Duration,
    backoff: Duration,
}

impl<S: MoistureSensor, C: Clock> TrackingLoop<S, C> {
    pub fn new(
        gate: Arc<SensorGate<S>>,
        metrics: Arc<dyn MetricsSink>,
        clock: C,
        interval: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            gate,
            metrics,
            clock,
            interval,
            backoff,
        }
    }

    /// One iteration: read, then publish or back off.
    pub fn tick(&self, shutdown: &AtomicBool) -> TrackOutcome {
        match self.gate.read_moisture() {
            Ok(level) => {
                self.metrics.set_soil_moisture(level.value());
                tracing::debug!(level = level.value(), "moisture published");
                TrackOutcome::Published(level)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backoff_ms = duration_ms(self.backoff),
                    "tracking read failed; backing off"
                );
                sleep_interruptible(&self.clock, self.backoff, shutdown);
                TrackOutcome::ReadFailed
            }
        }
    }

    /// Run until `shutdown` is raised.
    ///
    /// A failed read is retried right after its backoff rather than on the
    /// next aligned tick; once a retry succeeds, aligned ticks resume.
    pub fn run(&self, shutdown: &AtomicBool) -> Result<()> {
        let mut ticker = Ticker::new(self.clock.now(), self.interval);
        let mut retrying = false;
        tracing::info!(interval_ms = duration_ms(self.interval), "tracking loop started");

        while !shutdown.load(Ordering::Relaxed) {
            if !retrying {
                let deadline = ticker.next_tick(self.clock.now());
                if !sleep_until_interruptible(&self.clock, deadline, shutdown) {
                    break;
                }
            }
            match self.tick(shutdown) {
                TrackOutcome::Published(_) => {
                    if retrying {
                        ticker.resync(self.clock.now());
                    }
                    retrying = false;
                }
                TrackOutcome::ReadFailed => retrying = true,
            }
        }

        tracing::info!("tracking loop stopped");
        Ok(())
    }
}
