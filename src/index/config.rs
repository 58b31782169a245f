//! Index store configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use super::visibility::VisibilityMode;
use crate::observability::{Event, Logger, Severity};

/// Ordered index store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// What scans observe of concurrent writes (default: copy_on_write)
    #[serde(default)]
    pub visibility: VisibilityMode,

    /// Removed entries remembered for cursor resumption (default: 4096)
    #[serde(default = "default_retired_cursor_capacity")]
    pub retired_cursor_capacity: usize,

    /// Page size used when the caller does not pass one (default: 1000)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_retired_cursor_capacity() -> usize {
    4096
}

fn default_page_size() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            visibility: VisibilityMode::default(),
            retired_cursor_capacity: default_retired_cursor_capacity(),
            default_page_size: default_page_size(),
            log_level: default_log_level(),
        }
    }
}

impl IndexConfig {
    /// Default configuration with the given visibility
    pub fn with_visibility(visibility: VisibilityMode) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: &Path) -> IndexResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            IndexError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&contents)?;

        let path = path.display().to_string();
        config.logger()?.log_event(
            Event::ConfigLoaded,
            &[
                ("path", path.as_str()),
                ("visibility", config.visibility.as_str()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> IndexResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| IndexError::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the store cannot run with
    pub fn validate(&self) -> IndexResult<()> {
        if self.default_page_size == 0 {
            return Err(IndexError::Config(
                "default_page_size must be greater than zero".to_string(),
            ));
        }
        if self.retired_cursor_capacity == 0 {
            return Err(IndexError::Config(
                "retired_cursor_capacity must be greater than zero".to_string(),
            ));
        }
        self.log_severity()?;
        Ok(())
    }

    /// Logger filtering at the configured level
    pub fn logger(&self) -> IndexResult<Logger> {
        Ok(Logger::new(self.log_severity()?))
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> IndexResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            IndexError::Config(format!("unknown log_level '{}'", self.log_level))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.visibility, VisibilityMode::CopyOnWrite);
        assert_eq!(config.retired_cursor_capacity, 4096);
        assert_eq!(config.default_page_size, 1000);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = IndexConfig::from_json_str("{}").unwrap();
        assert_eq!(config, IndexConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"visibility": "in_place", "default_page_size": 25, "log_level": "WARN"}}"#
        )
        .unwrap();

        let config = IndexConfig::load(file.path()).unwrap();
        assert_eq!(config.visibility, VisibilityMode::InPlace);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.retired_cursor_capacity, 4096);
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
        assert_eq!(config.logger().unwrap().min_severity(), Severity::Warn);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_CONFIG_INVALID");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_validation_rejects_zeros_and_unknown_level() {
        assert!(IndexConfig::from_json_str(r#"{"default_page_size": 0}"#).is_err());
        assert!(IndexConfig::from_json_str(r#"{"retired_cursor_capacity": 0}"#).is_err());
        assert!(IndexConfig::from_json_str(r#"{"log_level": "loud"}"#).is_err());
        assert!(IndexConfig::from_json_str(r#"{"visibility": "sometimes"}"#).is_err());
        assert!(IndexConfig::from_json_str("not json").is_err());
    }
}
