//! Counter configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`CounterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables shared by the normalizer, tracker and crossing counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Case-insensitive substring a raw label must contain to be kept.
    pub subject_label: String,
    /// Detections scoring below this are discarded during normalization.
    pub min_confidence: f32,
    /// Maximum normalized centroid distance for a detection to keep a track id.
    pub match_threshold: f32,
    /// Normalized y of the counting line.
    pub midline: f32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            subject_label: "person".to_string(),
            min_confidence: 0.0,
            match_threshold: 0.12,
            midline: 0.5,
        }
    }
}

impl CounterConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded counter config");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subject_label.trim().is_empty() {
            return Err(invalid("subject_label", "must not be empty"));
        }
        if !self.min_confidence.is_finite() {
            return Err(invalid("min_confidence", "must be finite"));
        }
        if !self.match_threshold.is_finite() || self.match_threshold < 0.0 {
            return Err(invalid(
                "match_threshold",
                format!("must be a non-negative number, got {}", self.match_threshold),
            ));
        }
        if !(self.midline > 0.0 && self.midline < 1.0) {
            return Err(invalid(
                "midline",
                format!("must lie strictly between 0 and 1, got {}", self.midline),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CounterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.match_threshold, 0.12);
        assert_eq!(config.midline, 0.5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CounterConfig::from_json_str(r#"{ "subject_label": "car" }"#).unwrap();
        assert_eq!(config.subject_label, "car");
        assert_eq!(config.match_threshold, 0.12);
    }

    #[test]
    fn test_rejects_bad_midline() {
        let err = CounterConfig::from_json_str(r#"{ "midline": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "midline", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = CounterConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.json");
        let config = CounterConfig {
            subject_label: "Pedestrian".to_string(),
            min_confidence: 0.3,
            ..CounterConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(CounterConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = CounterConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
