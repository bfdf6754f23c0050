//! Pump ownership and timed watering.

use std::time::Duration;

use soil_traits::{Clock, Pump};

use crate::error::SoilError;
use crate::util::duration_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Watering,
}

/// Sole owner of the pump relay.
///
/// `run_pump` blocks the calling thread for the whole watering, so two
/// waterings can never overlap. Pin-write failures are fatal to the caller:
/// a pump we cannot switch off must not be silently ignored.
pub struct ActuatorController<P: Pump, C: Clock> {
    pump: P,
    clock: C,
    state: PumpState,
    uptime: Duration,
}

impl<P: Pump, C: Clock> ActuatorController<P, C> {
    pub fn new(pump: P, clock: C) -> Self {
        Self {
            pump,
            clock,
            state: PumpState::Idle,
            uptime: Duration::ZERO,
        }
    }

    /// Switch the pump on, hold for `duration`, switch it off.
    ///
    /// Returns the measured on-time. Does not report to any metrics sink.
    pub fn run_pump(&mut self, duration: Duration) -> Result<Duration, SoilError> {
        let start = self.clock.now();
        if let Err(e) = self.pump.set_active(true) {
            tracing::error!(error = %e, "pump activation failed");
            // the relay may have latched anyway
            if let Err(off) = self.pump.set_active(false) {
                tracing::error!(error = %off, "switching pump off after failed activation also failed");
            }
            return Err(SoilError::Actuation(format!("activate pump: {e}")));
        }
        self.state = PumpState::Watering;
        tracing::info!(duration_ms = duration_ms(duration), "pump on");

        self.clock.sleep(duration);

        if let Err(e) = self.pump.set_active(false) {
            tracing::error!(error = %e, "pump deactivation failed; pump may still be running");
            return Err(SoilError::Actuation(format!("deactivate pump: {e}")));
        }
        self.state = PumpState::Idle;
        let elapsed = self.clock.now().saturating_duration_since(start);
        self.uptime = self.uptime.saturating_add(elapsed);
        tracing::info!(elapsed_ms = duration_ms(elapsed), "pump off");
        Ok(elapsed)
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn cumulative_uptime(&self) -> Duration {
        self.uptime
    }

    pub fn cumulative_uptime_ms(&self) -> u64 {
        duration_ms(self.uptime)
    }
}

impl<P: Pump, C: Clock> Drop for ActuatorController<P, C> {
    fn drop(&mut self) {
        if let Err(e) = self.pump.set_active(false) {
            tracing::warn!(error = %e, "failed to switch pump off on shutdown");
        }
    }
}
