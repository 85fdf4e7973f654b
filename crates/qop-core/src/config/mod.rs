//! Configuration management for qop.
//!
//! This module handles loading, saving, and managing qop configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/qop/config.toml` |
//! | macOS | `~/Library/Application Support/Qop/config.toml` |
//! | Windows | `%APPDATA%\Qop\config.toml` |
//!
//! Every section and field is optional in the file; missing values fall
//! back to defaults, so a config containing only `[sender]` overrides is
//! valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Extensions recognized as source files when no explicit filter is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "rs", "c", "h", "cpp", "hpp", "js", "ts", "java", "go", "rb", "sh", "toml", "json",
    "yaml", "yml", "md", "txt",
];

/// Main configuration struct for qop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sender settings
    pub sender: SenderConfig,
    /// Receiver settings
    pub receiver: ReceiverConfig,
}

/// Sender configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Maximum number of source lines carried by one QR code
    pub lines_per_code: usize,
    /// How long each code stays on screen before the next one
    #[serde(with = "humantime_serde")]
    pub dwell: Duration,
    /// File extensions to transfer; an empty list transfers every file
    pub extensions: Vec<String>,
    /// Pixel size of generated PNG codes
    pub png_size: u32,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            lines_per_code: crate::DEFAULT_LINES_PER_CODE,
            dwell: Duration::from_millis(crate::DEFAULT_DWELL_MS),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            png_size: 300,
        }
    }
}

/// Receiver configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Inactivity duration after which the current file is flushed
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Polling cadence of the capture loop
    #[serde(with = "humantime_serde")]
    pub scan_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(crate::DEFAULT_IDLE_TIMEOUT_SECS),
            scan_interval: Duration::from_millis(crate::DEFAULT_SCAN_INTERVAL_MS),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| crate::error::Error::ConfigError(format!("failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigError(format!("failed to parse config: {e}")))
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::Error::ConfigError(format!("failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::Error::ConfigError(format!("failed to serialize config: {e}"))
        })?;

        std::fs::write(&path, content)
            .map_err(|e| crate::error::Error::ConfigError(format!("failed to write config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "qop", "Qop")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis();
        if millis % 1000 == 0 {
            serializer.serialize_str(&format!("{}s", millis / 1000))
        } else {
            serializer.serialize_str(&format!("{millis}ms"))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom("invalid duration format"))
    }

    fn parse(s: &str) -> Option<Duration> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            return ms.trim().parse().ok().map(Duration::from_millis);
        }
        if let Some(secs) = s.strip_suffix('s') {
            return secs.trim().parse().ok().map(Duration::from_secs);
        }
        if let Some(mins) = s.strip_suffix('m') {
            return mins.trim().parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.sender.lines_per_code, crate::DEFAULT_LINES_PER_CODE);
        assert_eq!(config.sender.dwell, Duration::from_millis(1500));
        assert_eq!(config.receiver.idle_timeout, Duration::from_secs(5));
        assert!(config.sender.extensions.contains(&"py".to_string()));
    }

    #[test]
    fn test_config_serialization_has_sections() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("serialize");
        assert!(toml_str.contains("[sender]"), "should have [sender] section");
        assert!(
            toml_str.contains("[receiver]"),
            "should have [receiver] section"
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let mut original = Config::default();
        original.sender.lines_per_code = 3;
        original.sender.dwell = Duration::from_millis(300);
        original.receiver.idle_timeout = Duration::from_secs(12);

        let content = toml::to_string_pretty(&original).expect("serialize");
        let loaded: Config = toml::from_str(&content).expect("parse");

        assert_eq!(loaded.sender.lines_per_code, 3);
        assert_eq!(loaded.sender.dwell, Duration::from_millis(300));
        assert_eq!(loaded.receiver.idle_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_config_deserialization_partial() {
        let partial_toml = r#"
[sender]
lines_per_code = 5
"#;

        let config: Config = toml::from_str(partial_toml).expect("parse partial config");

        assert_eq!(config.sender.lines_per_code, 5);
        assert_eq!(config.sender.dwell, Duration::from_millis(1500));
        assert_eq!(
            config.receiver.scan_interval,
            Duration::from_millis(crate::DEFAULT_SCAN_INTERVAL_MS)
        );
    }

    #[test]
    fn test_duration_formats() {
        let toml_str = r#"
[receiver]
idle_timeout = "2m"
scan_interval = "250ms"
"#;
        let config: Config = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.receiver.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.receiver.scan_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let toml_str = r#"
[receiver]
idle_timeout = "soon"
"#;
        let result: std::result::Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(
            path.ends_with("config.toml"),
            "config path should end with config.toml"
        );
    }
}
