//! Configuration schema definitions.
//!
//! Every section has serde defaults, so a config file only needs the keys it
//! wants to change. The defaults reproduce the stock ESP-IDF Unity menu
//! procedure.

use super::error::{ConfigError, ConfigResult};
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device under test selection
    pub dut: DutConfig,
    /// Serial console for hardware targets
    pub serial: SerialConfig,
    /// Spawned console for emulator / host targets
    pub process: ProcessConfig,
    /// Procedure timing
    pub procedure: ProcedureConfig,
    /// Console text protocol
    pub protocol: ProtocolConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Render the resolved configuration, as `--print-config` shows it.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the runner cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud == 0 {
            return Err(ConfigError::validation("serial.baud", "must be positive"));
        }
        if self.dut.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "dut.poll_interval_ms",
                "must be positive",
            ));
        }
        for (key, value) in [
            ("protocol.boot_marker", &self.protocol.boot_marker),
            ("protocol.menu_prompt", &self.protocol.menu_prompt),
            ("protocol.menu_banner", &self.protocol.menu_banner),
            ("protocol.fallback_prompt", &self.protocol.fallback_prompt),
            ("protocol.run_all", &self.protocol.run_all),
        ] {
            if value.is_empty() {
                return Err(ConfigError::validation(key, "must not be empty"));
            }
        }

        let summary = crate::unity::summary_regex(&self.protocol.summary_pattern)
            .map_err(|e| ConfigError::validation("protocol.summary_pattern", e.to_string()))?;
        // Group 0 is the whole match.
        if summary.captures_len() != 4 {
            return Err(ConfigError::validation(
                "protocol.summary_pattern",
                "needs exactly three capture groups (tests, failures, ignored)",
            ));
        }
        Ok(())
    }
}

/// Device under test section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DutConfig {
    /// Target label: esp32, esp32s3, esp32c3, qemu, linux
    pub target: Target,
    /// Mirror console output to this file
    pub transcript: Option<PathBuf>,
    /// Sleep between empty console reads in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for DutConfig {
    fn default() -> Self {
        Self {
            target: Target::default(),
            transcript: None,
            poll_interval_ms: 10,
        }
    }
}

impl DutConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path, e.g. /dev/ttyUSB0 or COM3 (or an alias)
    pub port: Option<String>,
    /// Console baud rate
    pub baud: u32,
    /// Per-read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 115200,
            read_timeout_ms: 50,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Process console section (qemu / linux targets).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Program to spawn
    pub command: Option<String>,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

/// Procedure timing section. All values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcedureConfig {
    /// Wait for the boot marker
    pub boot_timeout_ms: u64,
    /// Wait for the "press ENTER" prompt
    pub menu_prompt_timeout_ms: u64,
    /// Menu trigger attempts before falling back
    pub menu_attempts: u32,
    /// Pause after each trigger write
    pub menu_retry_delay_ms: u64,
    /// Wait for the menu banner on each attempt
    pub menu_timeout_ms: u64,
    /// Wait for the fallback prompt
    pub fallback_timeout_ms: u64,
    /// Wait for the Unity summary line
    pub summary_timeout_ms: u64,
}

impl Default for ProcedureConfig {
    fn default() -> Self {
        Self {
            boot_timeout_ms: 30_000,
            menu_prompt_timeout_ms: 30_000,
            menu_attempts: 5,
            menu_retry_delay_ms: 1_000,
            menu_timeout_ms: 5_000,
            fallback_timeout_ms: 10_000,
            summary_timeout_ms: 30_000,
        }
    }
}

impl ProcedureConfig {
    pub fn boot_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_timeout_ms)
    }

    pub fn menu_prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.menu_prompt_timeout_ms)
    }

    pub fn menu_retry_delay(&self) -> Duration {
        Duration::from_millis(self.menu_retry_delay_ms)
    }

    pub fn menu_timeout(&self) -> Duration {
        Duration::from_millis(self.menu_timeout_ms)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_millis(self.summary_timeout_ms)
    }
}

/// Console text protocol of the Unity menu runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Printed when the application entry point is reached
    pub boot_marker: String,
    /// Printed when the menu is ready to be requested
    pub menu_prompt: String,
    /// Substring of the menu listing
    pub menu_banner: String,
    /// Prompt waited for on the fallback path
    pub fallback_prompt: String,
    /// Sent on each menu attempt
    pub menu_trigger: String,
    /// Sent on the fallback path
    pub fallback_trigger: String,
    /// Selection that runs every registered test
    pub run_all: String,
    /// Summary line regex with tests / failures / ignored groups
    pub summary_pattern: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            boot_marker: "Calling app_main()".to_string(),
            menu_prompt: "Press ENTER to see the list of tests.".to_string(),
            menu_banner: "the test menu, pick your combo".to_string(),
            fallback_prompt: "Enter test name or number".to_string(),
            menu_trigger: "\r\n".to_string(),
            fallback_trigger: "\n".to_string(),
            run_all: "*".to_string(),
            summary_pattern: crate::unity::SUMMARY_PATTERN.to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log file path (stderr when unset)
    pub file: Option<PathBuf>,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
