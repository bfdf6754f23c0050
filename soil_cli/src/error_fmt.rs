//! Human-readable error descriptions and structured JSON error formatting.

use soil_core::error::{BuildError, SoilError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No moisture sensor was provided to the controller.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingPump => {
                "What happened: No pump was provided to the controller.\nLikely causes: The relay pin failed to initialize or was not wired into the builder.\nHow to fix: Ensure the pump is created successfully and passed via with_pump(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/soil.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SoilError>() {
        return match se {
            SoilError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A typo, an unknown key value, or an out-of-range setting in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            SoilError::Init(msg) => format!(
                "What happened: Failed to initialize hardware ({msg}).\nLikely causes: Wrong I2C bus/address or pump pin, missing permissions, or the port is already in use.\nHow to fix: Check [sensor], [pump] and [metrics] in the config; ensure the process may access I2C and GPIO."
            ),
            SoilError::Timeout => {
                "What happened: Moisture sensor conversion timed out.\nLikely causes: ADS1115 not powered, wrong address, or conversion timeout configured too low.\nHow to fix: Verify wiring and consider increasing sensor.conversion_timeout_ms in the config.".to_string()
            }
            SoilError::SensorRead(msg) => format!(
                "What happened: The moisture sensor could not be read ({msg}).\nLikely causes: Loose probe cable, I2C bus errors, or a disconnected ADC.\nHow to fix: Check the probe and ADC wiring, then rerun self-check."
            ),
            SoilError::Actuation(msg) => format!(
                "What happened: The pump could not be switched ({msg}).\nLikely causes: Relay pin lost, GPIO permissions revoked, or a wiring fault.\nHow to fix: Check the relay and the [pump] pin; make sure the pump is off before restarting."
            ),
            // Fallback to generic for other domain errors
            SoilError::State(_) => format!(
                "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config 2, init 3, actuation 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<SoilError>() {
        Some(SoilError::Config(_)) => 2,
        Some(SoilError::Init(_)) => 3,
        Some(SoilError::Actuation(_)) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<SoilError>() {
        Some(SoilError::Config(_)) => "Config",
        Some(SoilError::Init(_)) => "Init",
        Some(SoilError::SensorRead(_)) => "SensorRead",
        Some(SoilError::Timeout) => "Timeout",
        Some(SoilError::Actuation(_)) => "Actuation",
        Some(SoilError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
