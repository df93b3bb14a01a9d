use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
/// Projected cycles must reach at least this far on each side of the recorded one.
pub const DEFAULT_PROJECTION_DAYS: i64 = 31;
pub const MAX_PROJECTION_DAYS: i64 = 3660;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("config directory not found")]
    NoConfigDir,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalculatorSettings {
    pub default_cycle_length: i64,
    pub default_period_length: i64,
    pub projection_days: i64,
    pub log_level: String,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            default_cycle_length: DEFAULT_CYCLE_LENGTH,
            default_period_length: DEFAULT_PERIOD_LENGTH,
            projection_days: DEFAULT_PROJECTION_DAYS,
            log_level: "info".into(),
        }
    }
}

impl CalculatorSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!(
                "event=settings_load module=settings status=default path={}",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&raw)?;
        log::info!(
            "event=settings_load module=settings status=ok path={}",
            path.display()
        );
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.default_cycle_length <= 0 {
            return Err(SettingsError::Invalid {
                field: "default_cycle_length",
                reason: format!("must be positive, got {}", self.default_cycle_length),
            });
        }
        if self.default_period_length <= 0 {
            return Err(SettingsError::Invalid {
                field: "default_period_length",
                reason: format!("must be positive, got {}", self.default_period_length),
            });
        }
        if !(1..=MAX_PROJECTION_DAYS).contains(&self.projection_days) {
            return Err(SettingsError::Invalid {
                field: "projection_days",
                reason: format!(
                    "must be between 1 and {MAX_PROJECTION_DAYS}, got {}",
                    self.projection_days
                ),
            });
        }
        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(SettingsError::Invalid {
                field: "log_level",
                reason: format!("expected trace|debug|info|warn|error, got `{}`", self.log_level),
            });
        }
        Ok(())
    }
}

/// Get the path to the settings file under the platform config directory.
pub fn default_path() -> Result<PathBuf, SettingsError> {
    let dir = dirs::config_dir()
        .ok_or(SettingsError::NoConfigDir)?
        .join("fitfemme");
    Ok(dir.join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_store_defaults() {
        let settings = CalculatorSettings::default();
        assert_eq!(settings.default_cycle_length, 28);
        assert_eq!(settings.default_period_length, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings = CalculatorSettings::from_json_str(r#"{"default_cycle_length": 30}"#).unwrap();
        assert_eq!(settings.default_cycle_length, 30);
        assert_eq!(settings.default_period_length, 5);
        assert_eq!(settings.projection_days, DEFAULT_PROJECTION_DAYS);
    }

    #[test]
    fn rejects_non_positive_lengths() {
        let err = CalculatorSettings::from_json_str(r#"{"default_period_length": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "default_period_length",
                ..
            }
        ));
    }

    #[test]
    fn rejects_projection_beyond_ten_years() {
        let err = CalculatorSettings::from_json_str(r#"{"projection_days": 9223372036854775807}"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "projection_days", .. }));
        assert!(CalculatorSettings::from_json_str(r#"{"projection_days": 3660}"#).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = CalculatorSettings::from_json_str(r#"{"log_level": "loud"}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "log_level", .. }));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CalculatorSettings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, CalculatorSettings::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = CalculatorSettings {
            default_cycle_length: 32,
            log_level: "debug".into(),
            ..CalculatorSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(CalculatorSettings::load(&path).unwrap(), settings);
    }
}
