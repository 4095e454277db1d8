//! ADC Stream - Main Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use command_parser::SampleRate;
use daq_app::{init_logging, run_monitor, run_simulation, spawn_stdin_reader, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "adc-stream", version)]
#[command(about = "Continuous 12-bit sample streaming over a serial link", long_about = None)]
struct Cli {
    /// Configuration file (default: adc-stream.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the device pipeline on this host: frames on stdout, rate commands on stdin
    Simulate {
        /// Initial sample rate in samples per second
        #[arg(long)]
        rate: Option<SampleRate>,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Decode the frame stream of a connected device
    Monitor {
        /// Serial device path
        #[arg(long)]
        device: Option<String>,

        /// Rate command to send after opening
        #[arg(long)]
        rate: Option<SampleRate>,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== ADC Stream v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Simulate { rate, duration } => {
            if let Some(rate) = rate {
                config.simulate.initial_rate = rate;
            }
            if duration.is_some() {
                config.simulate.duration_secs = duration;
            }

            let simulation = config.simulate;
            let report = tokio::task::spawn_blocking(move || {
                let inbound = spawn_stdin_reader();
                run_simulation(&simulation, std::io::stdout().lock(), inbound)
            })
            .await
            .context("simulation task failed")??;

            info!("Simulation finished: {}", serde_json::to_string(&report)?);
        }
        Commands::Monitor {
            device,
            rate,
            frames,
        } => {
            if let Some(device) = device {
                config.monitor.device = device;
            }
            if let Some(rate) = rate {
                config.monitor.initial_rate = Some(rate);
            }
            if frames.is_some() {
                config.monitor.max_frames = frames;
            }

            let report = run_monitor(&config.monitor, config.monitor_output, std::io::stdout()).await?;
            info!("Monitor finished: {}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}
