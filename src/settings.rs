use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Confidence level for suggestions on freshly imported rows.
    #[serde(default = "default_category_confidence")]
    pub category_confidence: f64,
    /// Confidence level when re-suggesting for rows already in the ledger.
    #[serde(default = "default_strict_category_confidence")]
    pub strict_category_confidence: f64,
    #[serde(default = "default_tag_confidence")]
    pub tag_confidence: f64,
    #[serde(default = "default_tag_relative_threshold")]
    pub tag_relative_threshold: f64,
}

fn default_category_confidence() -> f64 {
    2.0
}

fn default_strict_category_confidence() -> f64 {
    4.0
}

fn default_tag_confidence() -> f64 {
    6.0
}

fn default_tag_relative_threshold() -> f64 {
    6.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            category_confidence: default_category_confidence(),
            strict_category_confidence: default_strict_category_confidence(),
            tag_confidence: default_tag_confidence(),
            tag_relative_threshold: default_tag_relative_threshold(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let levels = [
            ("category_confidence", self.category_confidence),
            ("strict_category_confidence", self.strict_category_confidence),
            ("tag_confidence", self.tag_confidence),
            ("tag_relative_threshold", self.tag_relative_threshold),
        ];
        for (name, value) in levels {
            check_level(name, value)?;
        }
        Ok(())
    }
}

/// Confidence levels and thresholds are odds ratios: finite and at least 1.
pub fn check_level(name: &str, value: f64) -> Result<()> {
    if value >= 1.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::Settings(format!("{name} must be >= 1, got {value}")))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("betteraccounting")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Settings stored at `path`; missing or invalid files yield the defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    match serde_json::from_str::<Settings>(&content) {
        Ok(s) if s.validate().is_ok() => s,
        _ => {
            log::warn!("ignoring invalid settings file {}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("betteraccounting").join("settings.json");
        let settings = Settings {
            category_confidence: 3.0,
            tag_relative_threshold: 8.0,
            ..Settings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            strict_category_confidence: 0.0,
            ..Settings::default()
        };
        assert!(matches!(
            save_settings_to(&path, &settings),
            Err(Error::Settings(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_load_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());

        std::fs::write(&path, r#"{"tag_confidence": 0.5}"#).unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.category_confidence, 2.0);
        assert_eq!(s.strict_category_confidence, 4.0);
        assert_eq!(s.tag_confidence, 6.0);
        assert_eq!(s.tag_relative_threshold, 6.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_check_level() {
        assert!(check_level("confidence", 1.0).is_ok());
        assert!(check_level("confidence", 4.0).is_ok());
        assert!(check_level("confidence", 0.99).is_err());
        assert!(check_level("confidence", f64::NAN).is_err());
        assert!(check_level("confidence", f64::INFINITY).is_err());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let s: Settings = serde_json::from_str(r#"{"tag_confidence": 8.0}"#).unwrap();
        assert_eq!(s.tag_confidence, 8.0);
        assert_eq!(s.category_confidence, 2.0);
    }

    #[test]
    fn test_validate_rejects_levels_below_one() {
        let s = Settings {
            tag_relative_threshold: 0.5,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(Error::Settings(_))));
        let s = Settings {
            category_confidence: f64::NAN,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }
}
