//! Serialized access to the single physical sensor channel.
//!
//! Both loops read through one `SensorGate`. The mutex is held for exactly one
//! read-and-normalize cycle and never across actuation or metrics updates.

use std::sync::{Mutex, MutexGuard, PoisonError};

use soil_traits::{MoistureSensor, RawSample};

use crate::calibration::{Calibration, MoistureLevel};
use crate::error::SoilError;
use crate::hw_error::map_hw_error;

pub struct SensorGate<S> {
    sensor: Mutex<S>,
    calibration: Calibration,
}

impl<S: MoistureSensor> SensorGate<S> {
    pub fn new(sensor: S, calibration: Calibration) -> Self {
        Self {
            sensor: Mutex::new(sensor),
            calibration,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    // A holder that panicked mid-read leaves no partial state behind, so the
    // sensor is reused as-is.
    fn lock(&self) -> MutexGuard<'_, S> {
        self.sensor.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("sensor lock poisoned by a panicked reader; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// One raw read under the lock.
    pub fn read_raw(&self) -> Result<RawSample, SoilError> {
        let mut sensor = self.lock();
        sensor.read().map_err(|e| map_hw_error(&*e))
    }

    /// One read-and-normalize cycle under the lock.
    ///
    /// The sensor's own retry budget applies; the gate surfaces its terminal
    /// failure without retrying again.
    pub fn read_moisture(&self) -> Result<MoistureLevel, SoilError> {
        let mut sensor = self.lock();
        let raw = sensor.read().map_err(|e| map_hw_error(&*e))?;
        let level = self.calibration.normalize(raw);
        tracing::trace!(raw, level = level.value(), "moisture read");
        Ok(level)
    }
}
