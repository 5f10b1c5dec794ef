use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::location::TargetingType;

pub const DATA_DIR_ENV: &str = "ADCAMP_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Optional `config.json`; every field may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    log_filter: Option<String>,
    default_targeting: Option<TargetingType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_filter: String,
    pub default_targeting: TargetingType,
}

impl AppConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("adcamp").join("config.json"))
    }

    /// Resolution order for the data directory: flag, environment,
    /// config file, platform data dir.
    pub fn load(
        config_path: Option<&Path>,
        data_dir_flag: Option<PathBuf>,
    ) -> Result<AppConfig, ConfigError> {
        let file = match config_path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };

        let data_dir = data_dir_flag
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or(file.data_dir)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("adcamp")
            });

        Ok(AppConfig {
            data_dir,
            log_filter: file.log_filter.unwrap_or_else(|| String::from("warn")),
            default_targeting: file.default_targeting.unwrap_or_default(),
        })
    }
}

/// A missing file is not an error, a malformed one is
fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn write_config(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("adcamp-config-{}.json", Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_flag_wins_over_file() {
        let path = write_config(r#"{"data_dir": "/from/file", "log_filter": "debug"}"#);

        let config = AppConfig::load(Some(&path), Some(PathBuf::from("/from/flag"))).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.store_path(), PathBuf::from("/from/flag/store.json"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("adcamp-missing-{}.json", Uuid::new_v4()));

        let config = AppConfig::load(Some(&path), Some(PathBuf::from("/data"))).unwrap();

        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.default_targeting, TargetingType::Local);
    }

    #[test]
    fn test_default_targeting_from_file() {
        let path = write_config(r#"{"default_targeting": "regional"}"#);

        let config = AppConfig::load(Some(&path), Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(config.default_targeting, TargetingType::Regional);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let path = write_config(r#"{"colour": "blue"}"#);

        let result = AppConfig::load(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        std::fs::remove_file(&path).unwrap();
    }
}
