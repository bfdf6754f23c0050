//! Raw-to-moisture normalization.
//!
//! Capacitive probes read *lower* the wetter the soil is. A raw sample is
//! mapped linearly between the two calibration points and inverted, so the
//! result reads as "how wet": 1.0 at `wet_raw` (saturated), 0.0 at `dry_raw`.

use crate::error::BuildError;
use soil_traits::RawSample;

/// Normalized wetness fraction, always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MoistureLevel(f64);

impl MoistureLevel {
    pub const DRY: Self = Self(0.0);
    pub const SATURATED: Self = Self(1.0);

    /// Clamp an arbitrary fraction into range. NaN maps to `DRY`.
    pub fn clamped(v: f64) -> Self {
        if v.is_nan() {
            return Self::DRY;
        }
        Self(v.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for MoistureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Raw reference points of the probe, validated once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    wet_raw: RawSample,
    dry_raw: RawSample,
}

impl Calibration {
    /// Both points must differ and the wet point must read lower than the dry one.
    pub fn new(wet_raw: RawSample, dry_raw: RawSample) -> Result<Self, BuildError> {
        if wet_raw >= dry_raw {
            return Err(BuildError::InvalidConfig(
                "calibration wet_raw must be below dry_raw",
            ));
        }
        Ok(Self { wet_raw, dry_raw })
    }

    pub fn wet_raw(&self) -> RawSample {
        self.wet_raw
    }

    pub fn dry_raw(&self) -> RawSample {
        self.dry_raw
    }

    /// Map a raw sample to a moisture level. Total and pure.
    pub fn normalize(&self, raw: RawSample) -> MoistureLevel {
        let span = f64::from(self.dry_raw) - f64::from(self.wet_raw);
        let frac = (f64::from(raw) - f64::from(self.wet_raw)) / span;
        MoistureLevel(1.0 - frac.clamp(0.0, 1.0))
    }

    /// Raw sample that normalizes to `level` (rounded to the nearest count).
    #[allow(clippy::cast_possible_truncation)]
    pub fn raw_for(&self, level: MoistureLevel) -> RawSample {
        let span = f64::from(self.dry_raw) - f64::from(self.wet_raw);
        let raw = f64::from(self.wet_raw) + (1.0 - level.value()) * span;
        // within [wet_raw, dry_raw], so the cast cannot truncate
        raw.round() as RawSample
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            wet_raw: 8500,
            dry_raw: 19000,
        }
    }
}

/// Free-function form of [`Calibration::normalize`].
#[inline]
pub fn normalize(raw: RawSample, calibration: &Calibration) -> MoistureLevel {
    calibration.normalize(raw)
}
