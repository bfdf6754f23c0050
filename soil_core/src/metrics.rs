//! In-process metrics registry for the scrape endpoint.
//!
//! Two series only: the `soil_moisture` gauge (last write wins) and the
//! `pump_uptime_milliseconds` counter (only grows). Both are lock-free so the
//! scrape thread never contends with the loops.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use soil_traits::MetricsSink;

pub const SOIL_MOISTURE: &str = "soil_moisture";
pub const PUMP_UPTIME_MS: &str = "pump_uptime_milliseconds";

#[derive(Debug)]
pub struct SoilMetrics {
    moisture_bits: AtomicU64,
    uptime_ms: AtomicU64,
}

impl Default for SoilMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilMetrics {
    /// Gauge starts as NaN until the first successful read.
    pub fn new() -> Self {
        Self {
            moisture_bits: AtomicU64::new(f64::NAN.to_bits()),
            uptime_ms: AtomicU64::new(0),
        }
    }

    pub fn soil_moisture(&self) -> f64 {
        f64::from_bits(self.moisture_bits.load(Ordering::Relaxed))
    }

    pub fn pump_uptime_ms(&self) -> u64 {
        self.uptime_ms.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of both series.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(320);
        let _ = writeln!(
            out,
            "# HELP {SOIL_MOISTURE} Normalized soil moisture (0 = dry, 1 = saturated)."
        );
        let _ = writeln!(out, "# TYPE {SOIL_MOISTURE} gauge");
        let _ = writeln!(out, "{SOIL_MOISTURE} {}", self.soil_moisture());
        let _ = writeln!(
            out,
            "# HELP {PUMP_UPTIME_MS} Total pump on-time in milliseconds."
        );
        let _ = writeln!(out, "# TYPE {PUMP_UPTIME_MS} counter");
        let _ = writeln!(out, "{PUMP_UPTIME_MS} {}", self.pump_uptime_ms());
        out
    }
}

impl MetricsSink for SoilMetrics {
    fn set_soil_moisture(&self, level: f64) {
        self.moisture_bits.store(level.to_bits(), Ordering::Relaxed);
    }

    fn add_pump_uptime_ms(&self, ms: u64) {
        // saturating, so the counter can never wrap back down
        let _ = self
            .uptime_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_add(ms))
            });
    }
}
