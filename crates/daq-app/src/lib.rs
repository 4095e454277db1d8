//! ADC Stream host application
//!
//! `simulate` runs the device pipeline on the host with a synthetic
//! converter, writing frames to stdout and reading rate commands from stdin.
//! `monitor` talks to a real device over its serial port.

pub mod config;
pub mod monitor;
pub mod simulate;

pub use config::{AppConfig, LogFormat, LoggingConfig, MonitorOutput, SimulationConfig};
pub use monitor::{run_monitor, MonitorReport, StreamStats};
pub use simulate::{run_simulation, spawn_stdin_reader, SimulationReport};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging to stderr; stdout carries the frame stream
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level: Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
    .context("failed to set tracing subscriber")
}
