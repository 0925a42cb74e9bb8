//! Configuration for the user-data manager

use crate::validator::FoundValidation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Download filenames for every export shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFilenames {
    pub backup: String,
    pub plots: String,
    pub pins: String,
    pub found: String,
}

impl Default for ExportFilenames {
    fn default() -> Self {
        Self {
            backup: "sr2_interactivemap_backup.json".to_string(),
            plots: "plot_plans.json".to_string(),
            pins: "user_pins.json".to_string(),
            found: "found_data.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDataConfig {
    pub filenames: ExportFilenames,
    pub found_validation: FoundValidation,
    /// Reload the application after an import that wrote anything
    pub reload_after_import: bool,
}

impl Default for UserDataConfig {
    fn default() -> Self {
        Self {
            filenames: ExportFilenames::default(),
            found_validation: FoundValidation::Strict,
            reload_after_import: true,
        }
    }
}

impl UserDataConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("backup", &self.filenames.backup),
            ("plots", &self.filenames.plots),
            ("pins", &self.filenames.pins),
            ("found", &self.filenames.found),
        ];

        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Export filename for {field} cannot be empty"
                )));
            }
            if !name.ends_with(".json") {
                return Err(ConfigError::Validation(format!(
                    "Export filename for {field} must end with .json, got {name}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UserDataConfig::default();
        assert_eq!(config.filenames.backup, "sr2_interactivemap_backup.json");
        assert_eq!(config.found_validation, FoundValidation::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = UserDataConfig::from_json(r#"{"found_validation": "lenient"}"#).unwrap();
        assert_eq!(config.found_validation, FoundValidation::Lenient);
        assert_eq!(config.filenames.pins, "user_pins.json");
        assert!(config.reload_after_import);
    }

    #[test]
    fn test_rejects_bad_filename() {
        let err = UserDataConfig::from_json(r#"{"filenames": {"backup": "backup.txt"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = UserDataConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
