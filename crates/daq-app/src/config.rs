//! Application configuration
//!
//! Layered with the `config` crate: struct defaults, then an optional TOML
//! file, then `ADC_STREAM__*` environment variables.

use acquisition::{AcquisitionConfig, SineSourceConfig};
use anyhow::{Context, Result};
use command_parser::SampleRate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use usb_transport::MonitorConfig;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "adc-stream.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "ADC_STREAM_CONFIG";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Device simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Sample rate at start, as after a device reset
    pub initial_rate: SampleRate,
    /// Stop after this many seconds; run until stdin closes if unset
    pub duration_secs: Option<f64>,
    /// Interval between USB transmit polls, in microseconds
    pub tx_poll_us: u64,
    /// Interval between statistics log lines, in milliseconds
    pub stats_interval_ms: u64,
    pub source: SineSourceConfig,
    pub acquisition: AcquisitionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_rate: SampleRate::DEFAULT,
            duration_secs: None,
            tx_poll_us: 1000,
            stats_interval_ms: 1000,
            source: SineSourceConfig::default(),
            acquisition: AcquisitionConfig::default(),
        }
    }
}

/// What the monitor prints for each decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorOutput {
    /// One JSON object of samples per frame on stdout
    #[default]
    Json,
    /// Only periodic statistics in the log
    Summary,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub simulate: SimulationConfig,
    pub monitor: MonitorConfig,
    pub monitor_output: MonitorOutput,
}

impl AppConfig {
    /// Load configuration from `path` (or the default locations) and the
    /// environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let (file, required) = match (path, env_path.as_deref()) {
            (Some(path), _) => (path.to_string_lossy().into_owned(), true),
            (None, Some(env)) => (env.to_string(), true),
            (None, None) => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(required))
            .add_source(
                config::Environment::with_prefix("ADC_STREAM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {file}"))?;

        settings
            .try_deserialize()
            .context("invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.simulate.initial_rate, SampleRate::DEFAULT);
        assert_eq!(config.simulate.acquisition.band_low, 100);
        assert_eq!(config.monitor_output, MonitorOutput::Json);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("adc-stream-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
monitor_output = "summary"

[logging]
level = "debug"

[simulate]
initial_rate = 8000
duration_secs = 0.5

[simulate.source]
period_samples = 100

[monitor]
device = "/dev/ttyUSB1"
initial_rate = 24000
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.simulate.initial_rate.hz(), 8000);
        assert_eq!(config.simulate.duration_secs, Some(0.5));
        assert_eq!(config.simulate.source.period_samples, 100);
        assert_eq!(config.simulate.source.offset, 2048);
        assert_eq!(config.monitor.device, "/dev/ttyUSB1");
        assert_eq!(config.monitor.initial_rate.map(SampleRate::hz), Some(24000));
        assert_eq!(config.monitor_output, MonitorOutput::Summary);
    }

    #[test]
    fn test_rejects_invalid_rate() {
        let path = std::env::temp_dir().join(format!("adc-stream-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[simulate]\ninitial_rate = 500\n").unwrap();
        let result = AppConfig::load(Some(&path));
        assert!(result.is_err());

        std::fs::write(&path, "[monitor]\ninitial_rate = 100000\n").unwrap();
        let result = AppConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
