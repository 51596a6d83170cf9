use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::assets::DEFAULT_IMAGE_TYPES;
use crate::domain::Season;
use crate::errors::ConfigError;

const DEFAULT_DIR_NAME: &str = ".trip_composer";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const OUTBOX_DIR: &str = "outbox";
const TMP_SUFFIX: &str = "tmp";

/// Returns the application data directory, defaulting to `~/.trip_composer`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("TRIP_COMPOSER_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Operator preferences that shape the wizard's rules and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_require_tickets")]
    pub require_tickets: bool,
    #[serde(default = "Config::default_image_types")]
    pub allowed_image_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_season: Option<Season>,
    #[serde(default = "Config::default_days")]
    pub default_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Where accepted submissions are written. Defaults to `<home>/outbox`.
    pub outbox_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            require_tickets: Self::default_require_tickets(),
            allowed_image_types: Self::default_image_types(),
            default_season: None,
            default_days: Self::default_days(),
            outbox_dir: None,
        }
    }
}

impl Config {
    pub fn default_require_tickets() -> bool {
        true
    }

    pub fn default_image_types() -> Vec<String> {
        DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect()
    }

    pub fn default_days() -> u32 {
        1
    }

    pub fn resolve_outbox_dir(&self, base: &Path) -> PathBuf {
        self.outbox_dir
            .clone()
            .unwrap_or_else(|| base.join(OUTBOX_DIR))
    }
}

/// Loads and stores [`Config`] as JSON under `<base>/config/config.json`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;
        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            base,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.config_path);
        write_atomic(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &self.config_path)?;
        Ok(())
    }

    pub fn outbox_dir(&self, config: &Config) -> PathBuf {
        config.resolve_outbox_dir(&self.base)
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(config.require_tickets);
        assert_eq!(config.allowed_image_types.len(), 4);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = Config {
            require_tickets: false,
            default_season: Some(Season::Winter),
            default_days: 3,
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert!(!tmp_path(manager.config_path()).exists());
    }

    #[test]
    fn partial_files_fall_back_to_field_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), r#"{"default_days": 5}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.default_days, 5);
        assert!(config.require_tickets);
    }

    #[test]
    fn outbox_defaults_under_base() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        assert_eq!(
            manager.outbox_dir(&Config::default()),
            temp.path().join("outbox")
        );
    }

    #[test]
    fn invalid_json_is_a_serde_error() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), "{not json").unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Serde(_))));
    }
}
