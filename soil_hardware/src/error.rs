use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("ads1115 conversion timeout")]
    ConversionTimeout,
    #[error("sensor read failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<HwError>,
    },
    #[error("simulated sensor failure")]
    Simulated,
}

impl HwError {
    /// True when the terminal cause is the device not answering in time.
    pub fn is_timeout(&self) -> bool {
        match self {
            HwError::ConversionTimeout => true,
            HwError::RetriesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
