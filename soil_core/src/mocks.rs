//! Test and helper doubles for soil_core.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use soil_traits::{MoistureSensor, Pump, RawSample};

/// A sensor that always errors on read; useful for exercising backoff paths.
pub struct NoopSensor;

impl MoistureSensor for NoopSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// Replays a fixed script of read results.
///
/// Once the script runs dry every read fails with "script exhausted", and the
/// optional stop flag is raised so a running loop winds down.
pub struct ScriptedSensor {
    script: VecDeque<Result<RawSample, String>>,
    reads: Arc<Mutex<usize>>,
    stop_when_done: Option<Arc<AtomicBool>>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Result<RawSample, String>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reads: Arc::new(Mutex::new(0)),
            stop_when_done: None,
        }
    }

    /// Raise `flag` when the script is exhausted.
    pub fn stop_when_done(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_when_done = Some(flag);
        self
    }

    /// Shared counter of read calls, readable after the sensor is moved away.
    pub fn read_counter(&self) -> Arc<Mutex<usize>> {
        self.reads.clone()
    }
}

impl MoistureSensor for ScriptedSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        *self.reads.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        match self.script.pop_front() {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(msg)) => Err(msg.into()),
            None => {
                if let Some(flag) = &self.stop_when_done {
                    flag.store(true, Ordering::SeqCst);
                }
                Err("script exhausted".into())
            }
        }
    }
}

/// Records every pin write; optionally fails activation or deactivation.
#[derive(Clone, Default)]
pub struct RecordingPump {
    writes: Arc<Mutex<Vec<bool>>>,
    fail_on: Option<bool>,
    fail_all: bool,
}

impl RecordingPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write of `level` (true = activate, false = deactivate).
    pub fn failing_on(mut self, level: bool) -> Self {
        self.fail_on = Some(level);
        self
    }

    /// Fail every write in both directions.
    pub fn failing_always(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn writes(&self) -> Vec<bool> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of off→on transitions seen so far.
    pub fn activations(&self) -> usize {
        self.writes().iter().filter(|&&on| on).count()
    }
}

impl Pump for RecordingPump {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(on);
        if self.fail_all || self.fail_on == Some(on) {
            return Err(format!("pin write {on} failed").into());
        }
        Ok(())
    }
}
