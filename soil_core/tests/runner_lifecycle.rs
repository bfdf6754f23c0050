use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use soil_core::mocks::RecordingPump;
use soil_core::{Calibration, Controller, MoistureLevel, SoilError, SoilMetrics, runner};
use soil_traits::{MoistureSensor, RawSample};

/// Always reports the same level.
struct FixedSensor(RawSample);

impl MoistureSensor for FixedSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

fn fixed(level: f64) -> FixedSensor {
    FixedSensor(Calibration::default().raw_for(MoistureLevel::clamped(level)))
}

#[test]
fn wet_soil_runs_until_shutdown() {
    let metrics = Arc::new(SoilMetrics::new());
    let pump = RecordingPump::new();
    let controller = Controller::builder()
        .with_sensor(fixed(0.8))
        .with_pump(pump.clone())
        .with_metrics(metrics.clone())
        .with_tracking_interval(Duration::from_millis(5))
        .with_control_interval(Duration::from_millis(5))
        .try_build()
        .unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let running = runner::spawn(controller, shutdown.clone()).unwrap();
    assert_eq!(running.wait_exit(Some(Duration::from_millis(50))), None);
    running.join().unwrap();

    assert!(shutdown.load(Ordering::SeqCst));
    assert!((metrics.soil_moisture() - 0.8).abs() < 1e-3);
    assert_eq!(metrics.pump_uptime_ms(), 0);
    // only the drop-time safety off
    assert_eq!(pump.activations(), 0);
}

#[test]
fn dry_soil_waters_and_counts_uptime() {
    let metrics = Arc::new(SoilMetrics::new());
    let controller = Controller::builder()
        .with_sensor(fixed(0.1))
        .with_pump(RecordingPump::new())
        .with_metrics(metrics.clone())
        .with_tracking_interval(Duration::from_millis(5))
        .with_control_interval(Duration::from_millis(5))
        .with_water_duration(Duration::from_millis(2))
        .try_build()
        .unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let running = runner::spawn(controller, shutdown).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    running.join().unwrap();

    let uptime = metrics.pump_uptime_ms();
    assert!(uptime >= 2, "uptime {uptime}");
    assert_eq!(uptime % 2, 0);
}

#[test]
fn actuation_failure_stops_both_loops() {
    let controller = Controller::builder()
        .with_sensor(fixed(0.0))
        .with_pump(RecordingPump::new().failing_on(true))
        .with_tracking_interval(Duration::from_secs(1))
        .with_control_interval(Duration::from_millis(5))
        .try_build()
        .unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let running = runner::spawn(controller, shutdown.clone()).unwrap();

    assert_eq!(
        running.wait_exit(Some(Duration::from_secs(5))),
        Some("soil-control")
    );
    assert!(shutdown.load(Ordering::SeqCst));

    let err = running.join().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SoilError>(),
        Some(SoilError::Actuation(_))
    ));
}

/// Panics when read from the tracking thread, reads wet soil anywhere else.
struct TrackingPanicSensor;

impl MoistureSensor for TrackingPanicSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        if std::thread::current().name() == Some("soil-tracking") {
            panic!("driver bug");
        }
        Ok(Calibration::default().raw_for(MoistureLevel::clamped(0.8)))
    }
}

#[test]
fn panicking_loop_stops_controller_and_reports_exit() {
    let controller = Controller::builder()
        .with_sensor(TrackingPanicSensor)
        .with_pump(RecordingPump::new())
        .with_tracking_interval(Duration::from_millis(5))
        .with_control_interval(Duration::from_secs(1))
        .try_build()
        .unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let running = runner::spawn(controller, shutdown.clone()).unwrap();

    assert_eq!(
        running.wait_exit(Some(Duration::from_secs(2))),
        Some("soil-tracking")
    );
    assert!(shutdown.load(Ordering::SeqCst));

    let err = running.join().unwrap_err();
    match err.downcast_ref::<SoilError>() {
        Some(SoilError::State(msg)) => assert!(msg.contains("soil-tracking panicked")),
        other => panic!("unexpected error: {other:?}"),
    }
}
