//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr (or the configured file) so stdout carries only the
//! summary line and the JSON report.

use crate::config::{ConfigError, ConfigResult, LogFormat, LoggingConfig};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. `verbosity` bumps the level the
/// way repeated `-v` flags do.
pub fn init(config: &LoggingConfig, verbosity: u8) -> ConfigResult<()> {
    let level = match verbosity {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ConfigError::validation("logging.level", e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::validation("logging.file", e.to_string()))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match config.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                LogFormat::Compact => builder.compact().try_init(),
            }
        }
        None => {
            let builder = builder.with_writer(std::io::stderr);
            match config.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                LogFormat::Compact => builder.compact().try_init(),
            }
        }
    };

    installed.map_err(|e| ConfigError::validation("logging", e.to_string()))
}
