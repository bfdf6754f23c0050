#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Soil moisture control core (hardware-agnostic).
//!
//! All hardware goes through `soil_traits::MoistureSensor` and
//! `soil_traits::Pump`; metrics go through `soil_traits::MetricsSink`.
//!
//! ## Architecture
//!
//! - **Normalization**: raw sample → [0,1] wetness (`calibration` module)
//! - **Sensor arbitration**: one mutex-guarded gate shared by both loops (`gate`)
//! - **Actuation**: blocking timed watering, cumulative on-time (`actuator`)
//! - **Tracking**: fast loop feeding the moisture gauge (`tracking`)
//! - **Control**: slow loop watering below the dry threshold (`control`)
//! - **Scheduling**: drift-free ticks and interruptible backoff (`schedule`)
//!
//! ## Ownership
//!
//! The pump and the uptime counter belong to the control loop alone; the
//! gauge belongs to the tracking loop alone. Only the sensor is shared, and
//! only for the span of a single read.

pub mod actuator;
pub mod builder;
pub mod calibration;
pub mod control;
pub mod conversions;
pub mod error;
pub mod gate;
pub mod hw_error;
pub mod metrics;
pub mod mocks;
pub mod runner;
pub mod schedule;
pub mod tracking;
pub mod util;

pub use actuator::{ActuatorController, PumpState};
pub use builder::{Controller, ControllerBuilder, ControllerSettings};
pub use calibration::{Calibration, MoistureLevel, normalize};
pub use control::{ControlLoop, ControlOutcome, WateringPolicy};
pub use error::{BuildError, SoilError};
pub use gate::SensorGate;
pub use metrics::SoilMetrics;
pub use tracking::{TrackOutcome, TrackingLoop};
