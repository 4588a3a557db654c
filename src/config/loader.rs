//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "UNITY_HIL";

/// Config file name in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "unity-hil.toml";

/// Config file name inside the user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "UNITY_HIL_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `UNITY_HIL_CONFIG` environment variable (explicit path)
    /// 2. `./unity-hil.toml` (current directory)
    /// 3. `~/.config/unity-hil/config.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\unity-hil\config.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join("unity-hil").join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|val| (name, val))
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(name, format!("Invalid {what}: {val:?}")))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `UNITY_HIL_<SECTION>_<KEY>`
/// For example:
/// - `UNITY_HIL_DUT_TARGET=qemu`
/// - `UNITY_HIL_SERIAL_PORT=/dev/ttyUSB0`
/// - `UNITY_HIL_PROCEDURE_SUMMARY_TIMEOUT_MS=60000`
///
/// `ESPPORT` and `ESPBAUD` are honoured as fallbacks for the serial port, the
/// same variables `idf.py` reads.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // DUT
    if let Some((name, val)) = env_var("DUT_TARGET") {
        config.dut.target = val
            .parse()
            .map_err(|e: String| ConfigError::env_parse(name, e))?;
    }
    if let Some((_, val)) = env_var("DUT_TRANSCRIPT") {
        config.dut.transcript = Some(PathBuf::from(val));
    }

    // Serial
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    } else if let Ok(val) = std::env::var("ESPPORT") {
        config.serial.port = Some(val);
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = parse_env(&name, &val, "baud rate")?;
    } else if let Ok(val) = std::env::var("ESPBAUD") {
        config.serial.baud = parse_env("ESPBAUD", &val, "baud rate")?;
    }

    // Process
    if let Some((_, val)) = env_var("PROCESS_COMMAND") {
        config.process.command = Some(val);
    }

    // Procedure timing
    let timing = &mut config.procedure;
    for (key, slot) in [
        ("PROCEDURE_BOOT_TIMEOUT_MS", &mut timing.boot_timeout_ms),
        (
            "PROCEDURE_MENU_PROMPT_TIMEOUT_MS",
            &mut timing.menu_prompt_timeout_ms,
        ),
        ("PROCEDURE_MENU_TIMEOUT_MS", &mut timing.menu_timeout_ms),
        (
            "PROCEDURE_MENU_RETRY_DELAY_MS",
            &mut timing.menu_retry_delay_ms,
        ),
        (
            "PROCEDURE_FALLBACK_TIMEOUT_MS",
            &mut timing.fallback_timeout_ms,
        ),
        (
            "PROCEDURE_SUMMARY_TIMEOUT_MS",
            &mut timing.summary_timeout_ms,
        ),
    ] {
        if let Some((name, val)) = env_var(key) {
            *slot = parse_env(&name, &val, "timeout")?;
        }
    }
    if let Some((name, val)) = env_var("PROCEDURE_MENU_ATTEMPTS") {
        timing.menu_attempts = parse_env(&name, &val, "attempt count")?;
    }

    // Logging
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((name, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = match val.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => return Err(ConfigError::env_parse(name, "expected json, pretty or compact")),
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_no_env_keeps_defaults() {
        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.procedure.menu_attempts, 5);
        assert_eq!(config.serial.baud, 115200);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("UNITY_HIL_DUT_TARGET", "linux");
        env::set_var("UNITY_HIL_PROCEDURE_BOOT_TIMEOUT_MS", "1234");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.dut.target, Target::Linux);
        assert_eq!(config.procedure.boot_timeout_ms, 1234);

        env::remove_var("UNITY_HIL_DUT_TARGET");
        env::remove_var("UNITY_HIL_PROCEDURE_BOOT_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_espport_fallback() {
        env::set_var("ESPPORT", "/dev/ttyACM0");
        env::set_var("ESPBAUD", "921600");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.serial.baud, 921600);

        env::remove_var("ESPPORT");
        env::remove_var("ESPBAUD");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("UNITY_HIL_SERIAL_BAUD", "fast");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(err.to_string().contains("UNITY_HIL_SERIAL_BAUD"));

        env::remove_var("UNITY_HIL_SERIAL_BAUD");
    }
}
