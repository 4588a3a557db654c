//! Configuration module for unity-hil.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `UNITY_HIL_CONFIG` environment variable (explicit path)
//! 2. `./unity-hil.toml` (current directory)
//! 3. `~/.config/unity-hil/config.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\unity-hil\config.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `UNITY_HIL_<SECTION>_<KEY>`
//!
//! Examples:
//! - `UNITY_HIL_DUT_TARGET=qemu`
//! - `UNITY_HIL_SERIAL_PORT=/dev/ttyUSB0`
//! - `UNITY_HIL_PROCEDURE_MENU_ATTEMPTS=3`
//!
//! `ESPPORT` / `ESPBAUD` are also read for the serial console.
//!
//! # Example
//!
//! ```rust,no_run
//! use unity_hil::config::ConfigLoader;
//!
//! let config = ConfigLoader::load()?.into_config();
//! println!("Target: {}", config.dut.target);
//! println!("Summary timeout: {:?}", config.procedure.summary_timeout());
//! # Ok::<(), unity_hil::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{
    Config, DutConfig, LogFormat, LoggingConfig, ProcedureConfig, ProcessConfig, ProtocolConfig,
    SerialConfig,
};
