//! Configuration for the EmpathAI sensor engine.
//!
//! A configuration is resolved once, validated, and then frozen inside the
//! engine. Invalid values are rejected, never clamped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Trailing span over which samples are retained
    #[serde(rename = "signal_window_ms", with = "duration_ms")]
    pub signal_window: Duration,

    /// Period between analysis ticks
    #[serde(rename = "analysis_interval_ms", with = "duration_ms")]
    pub analysis_interval: Duration,

    /// Minimum spacing between accepted pointer events
    #[serde(rename = "pointer_throttle_ms", with = "duration_ms")]
    pub pointer_throttle: Duration,

    /// Minimum confidence for a classification to be emitted
    pub confidence_threshold: f64,

    /// Which input sources to capture
    pub sources: SourceConfig,

    /// Log per-tick analysis details
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signal_window: Duration::from_millis(3000),
            analysis_interval: Duration::from_millis(1000),
            pointer_throttle: Duration::from_millis(50),
            confidence_threshold: 0.3,
            sources: SourceConfig::default(),
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Check every option, naming the first offending one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, value) in [
            ("signal_window_ms", self.signal_window),
            ("analysis_interval_ms", self.analysis_interval),
            ("pointer_throttle_ms", self.pointer_throttle),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidDuration { option });
            }
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ConfidenceOutOfRange(self.confidence_threshold));
        }

        if self.sources.microphone {
            return Err(ConfigError::UnsupportedSource("microphone"));
        }
        if self.sources.camera {
            return Err(ConfigError::UnsupportedSource("camera"));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing options take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Load configuration from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("empath-sensor")
            .join("config.json")
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration for which input sources to capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub keyboard: bool,
    pub mouse: bool,
    /// Reserved; enabling it fails validation
    pub microphone: bool,
    /// Reserved; enabling it fails validation
    pub camera: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
            microphone: false,
            camera: false,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            keyboard: sources.iter().any(|s| s == "keyboard" || s == "all"),
            mouse: sources.iter().any(|s| s == "mouse" || s == "all"),
            microphone: sources.iter().any(|s| s == "microphone"),
            camera: sources.iter().any(|s| s == "camera"),
        }
    }

    /// Check if at least one implemented source is enabled.
    pub fn any_enabled(&self) -> bool {
        self.keyboard || self.mouse
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Option `{option}` must be a positive duration")]
    InvalidDuration { option: &'static str },

    #[error("Option `confidence_threshold` must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("Source `{0}` is not supported")]
    UnsupportedSource(&'static str),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Serde support for Duration as integer milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.signal_window, Duration::from_millis(3000));
        assert_eq!(config.analysis_interval, Duration::from_millis(1000));
        assert_eq!(config.pointer_throttle, Duration::from_millis(50));
        assert_eq!(config.confidence_threshold, 0.3);
        assert!(config.sources.keyboard);
        assert!(config.sources.mouse);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_source_config_parsing() {
        let config = SourceConfig::from_csv("keyboard,mouse");
        assert!(config.keyboard);
        assert!(config.mouse);

        let config = SourceConfig::from_csv("keyboard");
        assert!(config.keyboard);
        assert!(!config.mouse);

        let config = SourceConfig::from_csv("all");
        assert!(config.any_enabled());

        let config = SourceConfig::from_csv("none");
        assert!(!config.any_enabled());
    }

    #[test]
    fn test_zero_duration_names_option() {
        let config = EngineConfig {
            pointer_throttle: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                option: "pointer_throttle_ms"
            })
        );
    }

    #[test]
    fn test_confidence_out_of_range() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let config = EngineConfig {
                confidence_threshold: bad,
                ..EngineConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ConfidenceOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_modalities_fail_fast() {
        let json = r#"{"sources": {"camera": true}}"#;
        assert_eq!(
            EngineConfig::from_json(json),
            Err(ConfigError::UnsupportedSource("camera"))
        );
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"signal_window_ms": 5000, "debug": true}"#)
            .unwrap();
        assert_eq!(config.signal_window, Duration::from_millis(5000));
        assert_eq!(config.analysis_interval, Duration::from_millis(1000));
        assert!(config.debug);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = EngineConfig::from_json(r#"{"signal_windw_ms": 5000}"#).unwrap_err();
        match err {
            ConfigError::Parse(msg) => assert!(msg.contains("signal_windw_ms")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_round_trip_keeps_millis() {
        let config = EngineConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"pointer_throttle_ms\": 50"));
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
