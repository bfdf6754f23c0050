//! Sensor and pump backends.
//!
//! The simulated backend is always available. The `hardware` feature adds an
//! ADS1115 moisture probe on Linux I2C and a GPIO relay pump, both via rppal.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod ads1115;
pub mod error;
pub mod util;

use error::HwError;
use soil_traits::{MoistureSensor, Pump, RawSample};
use std::sync::{Arc, Mutex, PoisonError};

/// Raw drift towards dry per simulated read.
const SIM_DRY_STEP: i32 = 40;
/// Raw drop per simulated read while the pump is running.
const SIM_WET_STEP: i32 = 150;
/// Raw drop once a watering finishes and the water soaks in.
const SIM_SOAK: i32 = 3000;

#[derive(Debug)]
struct SoilState {
    raw: i32,
    pump_on: bool,
    wet_raw: i32,
    dry_raw: i32,
}

/// Shared simulated soil bed; the sensor observes it and the pump waters it.
#[derive(Debug, Clone)]
pub struct SimulatedSoil {
    state: Arc<Mutex<SoilState>>,
}

impl SimulatedSoil {
    /// Soil bounded by the given calibration points, starting at `start_raw`.
    pub fn new(wet_raw: i32, dry_raw: i32, start_raw: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SoilState {
                raw: start_raw.clamp(wet_raw, dry_raw),
                pump_on: false,
                wet_raw,
                dry_raw,
            })),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SoilState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn raw(&self) -> i32 {
        self.with_state(|s| s.raw)
    }

    pub fn pump_on(&self) -> bool {
        self.with_state(|s| s.pump_on)
    }

    pub fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor {
            soil: self.clone(),
            fail: false,
        }
    }

    pub fn pump(&self) -> SimulatedPump {
        SimulatedPump { soil: self.clone() }
    }
}

/// Simulated capacitive probe.
pub struct SimulatedSensor {
    soil: SimulatedSoil,
    fail: bool,
}

impl SimulatedSensor {
    /// Make every read fail, as a disconnected probe would.
    pub fn failing(mut self, fail: bool) -> Self {
        self.fail = fail;
        self
    }
}

impl MoistureSensor for SimulatedSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail {
            return Err(Box::new(HwError::RetriesExhausted {
                attempts: 5,
                last: Box::new(HwError::Simulated),
            }));
        }
        let raw = self.soil.with_state(|s| {
            let step = if s.pump_on { -SIM_WET_STEP } else { SIM_DRY_STEP };
            s.raw = s.raw.saturating_add(step).clamp(s.wet_raw, s.dry_raw);
            s.raw
        });
        tracing::debug!(raw, "simulated moisture sample");
        Ok(raw)
    }
}

/// Simulated pump relay.
pub struct SimulatedPump {
    soil: SimulatedSoil,
}

impl Pump for SimulatedPump {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.soil.with_state(|s| {
            if s.pump_on && !on {
                s.raw = s.raw.saturating_sub(SIM_SOAK).clamp(s.wet_raw, s.dry_raw);
            }
            s.pump_on = on;
        });
        tracing::debug!(on, "simulated pump");
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware {
    use std::time::Duration;

    use rppal::gpio::{Gpio, Level, OutputPin};
    use soil_traits::{MoistureSensor, Pump, RawSample};

    use crate::ads1115::Ads1115;
    use crate::error::HwError;
    use crate::util::with_retries;

    /// Capacitive probe wired to AIN0 of an ADS1115.
    pub struct Ads1115Sensor {
        adc: Ads1115,
        retries: u32,
    }

    impl Ads1115Sensor {
        pub fn new(
            bus: u8,
            address: u16,
            retries: u32,
            conversion_timeout: Duration,
        ) -> Result<Self, HwError> {
            let adc = Ads1115::open(bus, address, conversion_timeout)?;
            tracing::info!(bus, address, retries, "ads1115 ready");
            Ok(Self { adc, retries })
        }
    }

    impl MoistureSensor for Ads1115Sensor {
        fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
            let raw = with_retries(self.retries, |_| self.adc.read_single())?;
            tracing::debug!(raw, "moisture sample");
            Ok(RawSample::from(raw))
        }
    }

    /// Pump relay on a single GPIO line.
    pub struct GpioPump {
        pin: OutputPin,
        active_low: bool,
    }

    impl GpioPump {
        /// Claims the pin and drives it to the inactive level straight away.
        pub fn new(pin: u8, active_low: bool) -> Result<Self, HwError> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let line = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?;
            let out = if active_low {
                line.into_output_high()
            } else {
                line.into_output_low()
            };
            tracing::info!(pin, active_low, "pump relay ready");
            Ok(Self {
                pin: out,
                active_low,
            })
        }
    }

    impl Pump for GpioPump {
        fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let level = if on != self.active_low {
                Level::High
            } else {
                Level::Low
            };
            self.pin.write(level);
            Ok(())
        }
    }
}
