use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `is_ready` until it reports true, an error, or the timeout expires.
/// Sleeps in small intervals to avoid CPU spinning.
pub fn wait_until_ready(
    mut is_ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !is_ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::ConversionTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Run `op` up to `attempts` times, returning the first success.
///
/// `op` receives the 1-based attempt number. When every attempt fails the
/// last error is wrapped in `HwError::RetriesExhausted`.
pub fn with_retries<T>(attempts: u32, mut op: impl FnMut(u32) -> Result<T>) -> Result<T> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %e, "sensor read failed, retrying");
                attempt += 1;
            }
            Err(e) => {
                return Err(HwError::RetriesExhausted {
                    attempts,
                    last: Box::new(e),
                });
            }
        }
    }
}
