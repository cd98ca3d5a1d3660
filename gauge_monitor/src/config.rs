/*!
Configuration management for the gauge monitor application.
*/

use anyhow::{Context, Result};
use force_gauge::protocol::{DEFAULT_BAUD_RATE, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            serial: SerialConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Load configuration from a TOML file, or use defaults if it does not
    /// exist. A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::new());
        }
        Self::load_from_file(path)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device of the USB/RS-232 adapter
    pub port: String,

    /// Baud rate set on the gauge
    pub baud_rate: u32,

    /// Per-byte read timeout; bounds how long a stop request can wait
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: 100,
        }
    }
}

/// How readings are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Monitor loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between printed readings
    pub poll_interval_ms: u64,

    /// Output format
    pub output: OutputFormat,

    /// Readings older than this are flagged as stale
    pub stale_after_ms: u64,

    /// Print force in newtons instead of the gauge's own unit
    pub newtons: bool,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            output: OutputFormat::Text,
            stale_after_ms: 1000,
            newtons: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_roundtrip() {
        let mut original_config = AppConfig::new();
        original_config.serial.port = "/dev/ttyUSB3".to_string();
        original_config.monitor.output = OutputFormat::Json;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path();

        // Save and load
        original_config.save_to_file(temp_path).unwrap();
        let loaded_config = AppConfig::load_from_file(temp_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::new();

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(100));
        assert_eq!(config.monitor.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.monitor.output, OutputFormat::Text);
        assert!(!config.monitor.newtons);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [serial]
            port = "COM4"

            [monitor]
            output = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "COM4");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.monitor.output, OutputFormat::Json);
        assert_eq!(config.monitor.stale_after_ms, 1000);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::new());
    }

    #[test]
    fn test_load_or_default_rejects_malformed_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "[serial]\nport = \"/dev/ttyACM7\"\nbaud_rate = \"19200\"\n",
        )
        .unwrap();

        let err = AppConfig::load_or_default(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[serial]\nport = \"/dev/ttyACM7\"\n").unwrap();

        let config = AppConfig::load_or_default(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM7");
        assert_eq!(config.serial.baud_rate, 9600);
    }
}
