//! Maps `Box<dyn Error>` from trait boundaries to typed `SoilError`.
//!
//! The traits in `soil_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `soil_hardware::HwError` downcasting.

use crate::error::SoilError;

/// Map a sensor-side error to a typed `SoilError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SoilError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<soil_hardware::error::HwError>() {
            return if hw.is_timeout() {
                SoilError::Timeout
            } else {
                SoilError::SensorRead(hw.to_string())
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        SoilError::Timeout
    } else {
        SoilError::SensorRead(s)
    }
}
