use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::database::{SortOrder, TaskQuery};
use crate::format::{DateFormat, FormatError, TimeZoneSetting, DEFAULT_PATTERN};
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
    /// Empty means the profile's data directory
    #[serde(default)]
    pub database_path: String,
    /// strftime pattern for creation dates
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// `local`, `utc` or a fixed offset such as `+02:00`
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub hide_completed: bool,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    /// Profile whose data directory backs an empty `database_path`
    #[serde(skip)]
    profile: utils::Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_rename")]
    pub rename: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_delete_completed")]
    pub delete_completed: String,
    #[serde(default = "default_undo")]
    pub undo: String,
    #[serde(default = "default_toggle_completed")]
    pub toggle_completed: String,
    #[serde(default = "default_toggle_important")]
    pub toggle_important: String,
    #[serde(default = "default_toggle_hide_completed")]
    pub toggle_hide_completed: String,
    #[serde(default = "default_cycle_sort")]
    pub cycle_sort: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: Some(CURRENT_CONFIG_VERSION),
            database_path: String::new(),
            date_format: default_date_format(),
            timezone: default_timezone(),
            sort_order: SortOrder::default(),
            hide_completed: false,
            key_bindings: KeyBindings::default(),
            profile: utils::Profile::default(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            rename: default_rename(),
            delete: default_delete(),
            delete_completed: default_delete_completed(),
            undo: default_undo(),
            toggle_completed: default_toggle_completed(),
            toggle_important: default_toggle_important(),
            toggle_hide_completed: default_toggle_hide_completed(),
            cycle_sort: default_cycle_sort(),
            search: default_search(),
            list_up: default_list_up(),
            list_down: default_list_down(),
        }
    }
}

impl KeyBindings {
    /// Every binding with its action name, for validation and help text
    pub fn entries(&self) -> [(&'static str, &str); 13] {
        [
            ("quit", self.quit.as_str()),
            ("new", self.new.as_str()),
            ("rename", self.rename.as_str()),
            ("delete", self.delete.as_str()),
            ("delete_completed", self.delete_completed.as_str()),
            ("undo", self.undo.as_str()),
            ("toggle_completed", self.toggle_completed.as_str()),
            ("toggle_important", self.toggle_important.as_str()),
            ("toggle_hide_completed", self.toggle_hide_completed.as_str()),
            ("cycle_sort", self.cycle_sort.as_str()),
            ("search", self.search.as_str()),
            ("list_up", self.list_up.as_str()),
            ("list_down", self.list_down.as_str()),
        ]
    }
}

// Default value functions
fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

fn default_date_format() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_rename() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_delete_completed() -> String {
    "Ctrl+d".to_string()
}

fn default_undo() -> String {
    "u".to_string()
}

fn default_toggle_completed() -> String {
    "Space".to_string()
}

fn default_toggle_important() -> String {
    "i".to_string()
}

fn default_toggle_hide_completed() -> String {
    "h".to_string()
}

fn default_cycle_sort() -> String {
    "s".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid date settings: {0}")]
    DateFormatError(#[from] FormatError),
    #[error("Invalid key binding for '{action}': {message}")]
    KeyBindingError { action: String, message: String },
}

impl Config {
    /// Load configuration from the profile's config file, or create it with defaults
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from a specific file, writing defaults there if it is missing
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            debug!(path = %config_path.display(), "loaded config");
            toml::from_str::<Config>(&contents)?
        } else {
            let mut config = Config::default();
            if let Err(e) = config.save_to_path(config_path) {
                warn!(path = %config_path.display(), error = %e, "failed to write default config");
                return Err(e);
            }
            config
        };

        config.profile = profile;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, creating its directory if needed
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("tasks.db").to_string_lossy().to_string()
        } else {
            format!("~/.local/share/{}/tasks.db", profile.app_name())
        }
    }

    /// Get the expanded database path (with ~ expansion).
    /// An empty setting resolves to the profile's data directory.
    pub fn get_database_path(&self) -> PathBuf {
        if self.database_path.trim().is_empty() {
            utils::expand_path(&Self::default_database_path_for_profile(self.profile))
        } else {
            utils::expand_path(&self.database_path)
        }
    }

    /// The configured creation-date format
    pub fn date_format(&self) -> Result<DateFormat, ConfigError> {
        let zone = TimeZoneSetting::parse(&self.timezone)?;
        Ok(DateFormat::new(self.date_format.clone(), zone)?)
    }

    /// Listing defaults used when no flags override them
    pub fn default_query(&self) -> TaskQuery {
        TaskQuery {
            search: String::new(),
            sort_order: self.sort_order,
            hide_completed: self.hide_completed,
        }
    }

    /// Check date settings and key bindings before anything uses them
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.date_format()?;
        for (action, binding) in self.key_bindings.entries() {
            utils::parse_key_binding(binding).map_err(|message| ConfigError::KeyBindingError {
                action: action.to_string(),
                message,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Profile;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from_path(&path, Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.sort_order, SortOrder::ByName);
        assert!(!config.hide_completed);
        assert!(config.database_path.is_empty());
        assert!(config.get_database_path().ends_with("tasks.db"));
        assert_eq!(config.key_bindings, KeyBindings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/todo.db\"\nsort_order = \"by_date_created\"\nhide_completed = true\n\n[key_bindings]\nquit = \"x\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path, Profile::Dev).unwrap();
        assert_eq!(config.get_database_path(), PathBuf::from("/tmp/todo.db"));
        assert_eq!(config.sort_order, SortOrder::ByDateCreated);
        assert!(config.hide_completed);
        assert_eq!(config.key_bindings.quit, "x");
        assert_eq!(config.key_bindings.new, "n");
        assert_eq!(config.date_format, DEFAULT_PATTERN);

        let query = config.default_query();
        assert_eq!(query.sort_order, SortOrder::ByDateCreated);
        assert!(query.hide_completed);
    }

    #[test]
    fn saved_config_loads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config {
            database_path: "/tmp/other.db".to_string(),
            timezone: "+01:00".to_string(),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path, Profile::Dev).unwrap();
        assert_eq!(loaded, Config { profile: Profile::Dev, ..config });
    }

    #[test]
    fn saving_preferences_keeps_profile_default_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from_path(&path, Profile::Dev).unwrap();
        config.hide_completed = true;
        config.save_to_path(&path).unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("database_path = \"\""), "{on_disk}");

        let dev = Config::load_from_path(&path, Profile::Dev).unwrap();
        let prod = Config::load_from_path(&path, Profile::Prod).unwrap();
        assert!(dev.hide_completed);
        assert_ne!(dev.get_database_path(), prod.get_database_path());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "timezone = \"mars\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, Profile::Dev),
            Err(ConfigError::DateFormatError(FormatError::InvalidTimeZone(_)))
        ));

        fs::write(&path, "[key_bindings]\ndelete = \"Hyper+x\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, Profile::Dev),
            Err(ConfigError::KeyBindingError { .. })
        ));

        fs::write(&path, "hide_completed = \"yes\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, Profile::Dev),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn date_format_uses_configured_zone() {
        let config = Config {
            date_format: "%H:%M".to_string(),
            timezone: "utc".to_string(),
            ..Config::default()
        };
        let format = config.date_format().unwrap();
        assert_eq!(format.zone(), TimeZoneSetting::Utc);
        assert_eq!(format.format_millis(1_704_467_045_000), "15:04");
    }
}
