pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Raw ADC reading straight from the moisture probe.
pub type RawSample = i32;

/// Capacitive moisture probe behind an ADC channel.
///
/// `read` is expected to retry internally up to the driver's attempt budget
/// and only report the terminal failure.
pub trait MoistureSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>>;
}

/// Water pump relay. `set_active` is an idempotent pin-state write.
pub trait Pump {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Destination for the two exported series.
///
/// The gauge is last-write-wins; the counter only ever grows.
pub trait MetricsSink: Send + Sync {
    fn set_soil_moisture(&self, level: f64);
    fn add_pump_uptime_ms(&self, ms: u64);
}

impl<T: MoistureSensor + ?Sized> MoistureSensor for Box<T> {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: Pump + ?Sized> Pump for Box<T> {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_active(on)
    }
}

impl<T: Pump + ?Sized> Pump for &mut T {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_active(on)
    }
}
