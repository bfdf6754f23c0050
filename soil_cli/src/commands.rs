//! Command bodies: backend assembly, self-check, pump test, and the main run.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::{Report, Result, WrapErr};
use soil_config::Config;
use soil_core::builder::{DynPump, DynSensor};
use soil_core::util::duration_ms;
use soil_core::{
    ActuatorController, Calibration, Controller, ControllerSettings, SensorGate, SoilError,
    SoilMetrics, runner,
};
use soil_hardware::SimulatedSoil;
use soil_traits::MonotonicClock;

use crate::exposition;

/// Env knob for tests: `1` makes every simulated read fail.
const SIM_FAIL_ENV: &str = "SOIL_TEST_SIM_FAIL";

/// What `run` reports once both loops have stopped.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub moisture: f64,
    pub pump_uptime_ms: u64,
}

/// Open the sensor and pump: simulated when `sim`, real hardware otherwise.
pub fn open_backend(cfg: &Config, sim: bool) -> Result<(DynSensor, DynPump)> {
    if sim {
        return Ok(simulated(cfg));
    }
    open_hardware(cfg)
}

fn simulated(cfg: &Config) -> (DynSensor, DynPump) {
    let wet = cfg.calibration.wet_raw;
    let dry = cfg.calibration.dry_raw;
    let mid = i32::try_from((i64::from(wet) + i64::from(dry)) / 2).unwrap_or(wet);
    let soil = SimulatedSoil::new(wet, dry, mid);
    let fail = std::env::var(SIM_FAIL_ENV).is_ok_and(|v| v == "1");
    if fail {
        tracing::warn!("{SIM_FAIL_ENV}=1: simulated reads will fail");
    }
    tracing::info!(start_raw = mid, "using simulated sensor and pump");
    (Box::new(soil.sensor().failing(fail)), Box::new(soil.pump()))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_hardware(cfg: &Config) -> Result<(DynSensor, DynPump)> {
    use soil_hardware::hardware::{Ads1115Sensor, GpioPump};

    let s = &cfg.sensor;
    let sensor = Ads1115Sensor::new(
        s.i2c_bus,
        s.address,
        s.retries,
        Duration::from_millis(s.conversion_timeout_ms),
    )
    .map_err(|e| Report::new(SoilError::Init(format!("open ads1115: {e}"))))?;
    let pump = GpioPump::new(cfg.pump.pin, cfg.pump.active_low)
        .map_err(|e| Report::new(SoilError::Init(format!("open pump pin: {e}"))))?;
    Ok((Box::new(sensor), Box::new(pump)))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_hardware(cfg: &Config) -> Result<(DynSensor, DynPump)> {
    tracing::warn!("built without the `hardware` feature; falling back to simulation");
    Ok(simulated(cfg))
}

/// One pump pulse outside the control loop. Not counted as irrigation.
pub fn pulse_pump(pump: &mut DynPump, duration: Duration) -> Result<Duration> {
    let mut actuator = ActuatorController::new(pump, MonotonicClock::new());
    let on_time = actuator
        .run_pump(duration)
        .wrap_err("pump self-test failed")?;
    Ok(on_time)
}

/// Read the sensor once through a gate. Returns `(raw, moisture)`.
pub fn self_check(cfg: &Config, sim: bool) -> Result<(i32, f64)> {
    let calibration = Calibration::try_from(&cfg.calibration)?;
    let (sensor, _pump) = open_backend(cfg, sim)?;
    let gate = SensorGate::new(sensor, calibration);
    let raw = gate.read_raw()?;
    let level = gate.calibration().normalize(raw);
    tracing::info!(raw, level = level.value(), "self-check read");
    Ok((raw, level.value()))
}

pub fn pump_test(cfg: &Config, sim: bool, ms: u64) -> Result<Duration> {
    if ms == 0 {
        return Err(Report::new(SoilError::Config(
            "--ms must be > 0".to_string(),
        )));
    }
    let (_sensor, mut pump) = open_backend(cfg, sim)?;
    pulse_pump(&mut pump, Duration::from_millis(ms))
}

/// Start both loops and block until shutdown, `for_ms`, or a fatal error.
pub fn run(
    cfg: &Config,
    sim: bool,
    for_ms: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let settings = ControllerSettings::try_from(cfg)?;
    let (sensor, mut pump) = open_backend(cfg, sim)?;

    if cfg.startup.pump_test_ms > 0 {
        let on = pulse_pump(&mut pump, Duration::from_millis(cfg.startup.pump_test_ms))?;
        tracing::info!(on_ms = duration_ms(on), "startup pump test ok");
    }

    let metrics = Arc::new(SoilMetrics::new());
    let addr = cfg
        .metrics
        .socket_addr()
        .map_err(|e| Report::new(SoilError::Config(format!("{e:#}"))))?;
    let bound = exposition::spawn(addr, metrics.clone())?;
    tracing::info!(%bound, "metrics endpoint listening");

    let controller = Controller::builder()
        .with_sensor(sensor)
        .with_pump(pump)
        .with_metrics(metrics.clone())
        .with_settings(settings)
        .try_build()?;
    tracing::debug!(?controller, "controller ready");

    let running = runner::spawn(controller, shutdown)?;
    let exited = running.wait_exit(for_ms.map(Duration::from_millis));
    if let Some(name) = exited {
        tracing::info!(thread = name, "loop exited; stopping");
    }
    running.join()?;

    Ok(RunSummary {
        moisture: metrics.soil_moisture(),
        pump_uptime_ms: metrics.pump_uptime_ms(),
    })
}
