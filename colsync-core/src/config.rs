//! Global colsync configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ColSyncError, ColSyncResult};
use crate::identity::DEFAULT_APP_LABEL;
use crate::store::{Limits, default_root_path};

fn default_app_label() -> String {
    DEFAULT_APP_LABEL.to_string()
}

/// Global configuration at ~/.config/colsync/config.toml
///
/// Each value can be overridden with a `COLSYNC_`-prefixed environment
/// variable, e.g. `COLSYNC_DECSYNC_DIR`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColSyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decsync_dir: Option<PathBuf>,

    #[serde(default = "default_app_label")]
    pub app_label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_collections: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value_len: Option<usize>,
}

impl Default for ColSyncConfig {
    fn default() -> Self {
        ColSyncConfig {
            decsync_dir: None,
            app_label: default_app_label(),
            max_collections: None,
            max_value_len: None,
        }
    }
}

impl ColSyncConfig {
    pub fn config_path() -> ColSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ColSyncError::Config("Could not determine config directory".into()))?
            .join("colsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented default file first if
    /// there is none.
    pub fn load() -> ColSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> ColSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("COLSYNC").try_parsing(true))
            .build()
            .map_err(|e| ColSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ColSyncError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ColSyncResult<()> {
        let contents = format!(
            "\
# colsync configuration

# DecSync directory shared with your other devices
# (defaults to $DECSYNC_DIR, then {}):
# decsync_dir = \"~/decsync\"

# Label used in the application identity written to DecSync:
# app_label = \"{}\"

# Cap the number of collections listed and the length of values read,
# like older DecSync frontends did:
# max_collections = 256
# max_value_len = 256
",
            default_root_path().display(),
            DEFAULT_APP_LABEL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ColSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ColSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The configured DecSync directory with `~` expanded, or the default one.
    pub fn decsync_dir(&self) -> PathBuf {
        match &self.decsync_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned()),
            None => default_root_path(),
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_collections: self.max_collections,
            max_value_len: self.max_value_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_file_loads_as_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("colsync/config.toml");

        ColSyncConfig::create_default_config(&path).unwrap();
        let config = ColSyncConfig::load_from(&path).unwrap();

        assert_eq!(config.app_label, DEFAULT_APP_LABEL);
        assert_eq!(config.limits(), Limits::default());
    }

    #[test]
    fn reads_values_and_expands_tilde() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "decsync_dir = \"~/sync/decsync\"\napp_label = \"laptop\"\nmax_collections = 256\n",
        )
        .unwrap();

        let config = ColSyncConfig::load_from(&path).unwrap();
        assert_eq!(config.app_label, "laptop");
        assert_eq!(
            config.limits(),
            Limits {
                max_collections: Some(256),
                max_value_len: None,
            }
        );

        let dir = config.decsync_dir();
        assert!(dir.ends_with("sync/decsync"));
        assert!(!dir.starts_with("~"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = ColSyncConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.decsync_dir, None);
    }
}
