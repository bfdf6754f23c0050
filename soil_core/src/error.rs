use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SoilError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("initialization failed: {0}")]
    Init(String),
    #[error("sensor read failed: {0}")]
    SensorRead(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("pump actuation failed: {0}")]
    Actuation(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing moisture sensor")]
    MissingSensor,
    #[error("missing pump")]
    MissingPump,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
