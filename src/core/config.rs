/*
 * Persists the user's view preferences (sort order, last filter text, whether to
 * measure storage footprints) between runs. Preferences are stored as pretty JSON
 * in the application's local configuration directory, located through
 * `path_utils`. A missing preferences file simply yields the defaults.
 *
 * The `ConfigManagerOperations` trait keeps callers independent of the storage
 * location so tests and front-ends can substitute their own implementation.
 */
use crate::core::models::SortCriterion;
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

const VIEW_PREFERENCES_FILENAME: &str = "view_preferences.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub sort_criterion: SortCriterion,
    pub filter_text: String,
    pub measure_footprints: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        ViewPreferences {
            sort_criterion: SortCriterion::Name,
            filter_text: String::new(),
            measure_footprints: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine directory for configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ConfigManagerOperations: Send + Sync {
    fn load_view_preferences(&self, app_name: &str) -> Result<ViewPreferences>;
    fn save_view_preferences(&self, app_name: &str, preferences: &ViewPreferences) -> Result<()>;
}

/*
 * File-backed preferences store. By default it resolves the per-user config
 * directory for the given app name; `with_config_dir` pins it to a fixed
 * directory instead.
 */
pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        CoreConfigManager {
            config_dir_override: Some(config_dir.into()),
        }
    }

    fn preferences_path(&self, app_name: &str) -> Result<PathBuf> {
        let config_dir = match &self.config_dir_override {
            Some(dir) => dir.clone(),
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoProjectDirectory)?,
        };
        Ok(config_dir.join(VIEW_PREFERENCES_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn read_preferences(file_path: &Path) -> Result<ViewPreferences> {
    let file = File::open(file_path)?;
    let preferences = serde_json::from_reader(BufReader::new(file))?;
    Ok(preferences)
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_view_preferences(&self, app_name: &str) -> Result<ViewPreferences> {
        let file_path = self.preferences_path(app_name)?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: No preferences at {file_path:?}, using defaults.");
            return Ok(ViewPreferences::default());
        }
        let preferences = read_preferences(&file_path)?;
        log::debug!("CoreConfigManager: Loaded {preferences:?} from {file_path:?}.");
        Ok(preferences)
    }

    fn save_view_preferences(&self, app_name: &str, preferences: &ViewPreferences) -> Result<()> {
        let file_path = self.preferences_path(app_name)?;
        let file = File::create(&file_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), preferences)?;
        log::debug!("CoreConfigManager: Saved {preferences:?} to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_without_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path());
        let preferences = manager.load_view_preferences("AnyApp").unwrap();
        assert_eq!(preferences, ViewPreferences::default());
    }

    #[test]
    fn test_save_then_load_and_overwrite() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path());
        let first = ViewPreferences {
            sort_criterion: SortCriterion::Size,
            filter_text: "google".to_string(),
            measure_footprints: false,
        };
        manager.save_view_preferences("AnyApp", &first).unwrap();
        assert_eq!(manager.load_view_preferences("AnyApp").unwrap(), first);

        let second = ViewPreferences {
            sort_criterion: SortCriterion::Date,
            ..first.clone()
        };
        manager.save_view_preferences("AnyApp", &second).unwrap();
        assert_eq!(manager.load_view_preferences("AnyApp").unwrap(), second);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(VIEW_PREFERENCES_FILENAME),
            r#"{"sort_criterion": "Type"}"#,
        )
        .unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path());
        let preferences = manager.load_view_preferences("AnyApp").unwrap();
        assert_eq!(preferences.sort_criterion, SortCriterion::Type);
        assert!(preferences.filter_text.is_empty());
        assert!(preferences.measure_footprints);
    }

    #[test]
    fn test_corrupt_file_is_a_format_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(VIEW_PREFERENCES_FILENAME), "garbage").unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path());
        match manager.load_view_preferences("AnyApp") {
            Err(ConfigError::Serde(_)) => {}
            other => panic!("Expected Serde error, got {other:?}"),
        }
    }
}
