//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "etc/soil.toml";

#[derive(Parser, Debug)]
#[command(name = "soil", version, about = "Soil moisture controller")]
pub struct Cli {
    /// Path to config TOML (defaults to etc/soil.toml; built-in defaults if absent)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the tracking and control loops until Ctrl-C
    Run {
        /// Use the simulated sensor and pump
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Stop on its own after this many milliseconds
        #[arg(long, value_name = "MS")]
        for_ms: Option<u64>,
    },
    /// One gated sensor read (hardware presence / sim ok)
    SelfCheck {
        /// Use the simulated sensor
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
    },
    /// Run the pump once for a fixed time
    PumpTest {
        /// Use the simulated pump
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Pulse length in milliseconds
        #[arg(long, value_name = "MS")]
        ms: u64,
    },
}
