mod cli;
mod commands;
mod error_fmt;
mod exposition;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Report, Result};
use soil_config::{Config, Rotation};
use soil_core::SoilError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let _ = color_eyre::install();

    let (cfg, fell_back) = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &cfg)?;
    if fell_back {
        tracing::warn!(path = DEFAULT_CONFIG, "config file not found; using built-in defaults");
    }

    match cli.cmd {
        Commands::Run { sim, for_ms } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }

            let summary = commands::run(&cfg, sim, for_ms, shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "moisture": summary.moisture,
                        "pump_uptime_ms": summary.pump_uptime_ms,
                    })
                );
            } else {
                println!(
                    "stopped: moisture={:.3} pump_uptime_ms={}",
                    summary.moisture, summary.pump_uptime_ms
                );
            }
        }
        Commands::SelfCheck { sim } => {
            let (raw, moisture) = commands::self_check(&cfg, sim)?;
            if cli.json {
                println!("{}", serde_json::json!({ "raw": raw, "moisture": moisture }));
            } else {
                println!("sensor ok: raw={raw} moisture={moisture:.3}");
            }
        }
        Commands::PumpTest { sim, ms } => {
            let on = commands::pump_test(&cfg, sim, ms)?;
            let on_ms = soil_core::util::duration_ms(on);
            if cli.json {
                println!("{}", serde_json::json!({ "pump_on_ms": on_ms }));
            } else {
                println!("pump ok: on_ms={on_ms}");
            }
        }
    }
    Ok(())
}

/// Load and validate the config. The flag is true when the default path was
/// missing and built-in defaults were used instead.
fn load_config(explicit: Option<&Path>) -> Result<(Config, bool)> {
    let (path, fell_back) = match explicit {
        Some(p) => (Some(p), false),
        None if Path::new(DEFAULT_CONFIG).exists() => (Some(Path::new(DEFAULT_CONFIG)), false),
        None => (None, true),
    };
    let cfg = match path {
        Some(p) => soil_config::load_file(p).map_err(config_error)?,
        None => Config::default(),
    };
    cfg.validate().map_err(config_error)?;
    Ok((cfg, fell_back))
}

fn config_error(e: Report) -> Report {
    Report::new(SoilError::Config(format!("{e:#}")))
}

fn init_tracing(cli: &Cli, cfg: &Config) -> Result<()> {
    // RUST_LOG wins, then --log-level, then logging.level
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Report::new(SoilError::Config(format!("log level {level:?}: {e}"))))?,
    };

    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                Report::new(SoilError::Config(format!(
                    "logging.file {file:?} has no file name"
                )))
            })?;
            let appender = match cfg.logging.rotation {
                Rotation::Never => tracing_appender::rolling::never(dir, name),
                Rotation::Daily => tracing_appender::rolling::daily(dir, name),
                Rotation::Hourly => tracing_appender::rolling::hourly(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
    Ok(())
}
