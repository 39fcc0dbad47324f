//! Local configuration of one DecSync-backed source.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ColSyncError, ColSyncResult};

/// What the local application persists for a source: which DecSync directory
/// and collection it is bound to, the name it shows for that collection, the
/// identity it writes as, and the color it displays (unused for address
/// books).
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decsync_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Name of the selected collection when it was last selected or renamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SourceConfig {
    /// Load a source file, or an empty config if it does not exist yet.
    pub fn load(path: &Path) -> ColSyncResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: SourceConfig =
                toml::from_str(&content).map_err(|e| ColSyncError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> ColSyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ColSyncError::Config(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// The DecSync directory, if set and non-empty.
    pub fn dir(&self) -> Option<&Path> {
        self.decsync_dir
            .as_deref()
            .filter(|d| !d.as_os_str().is_empty())
    }

    /// The selected collection, if set and non-empty.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref().filter(|c| !c.is_empty())
    }

    /// A source can be confirmed once it names both a directory and a collection.
    pub fn is_complete(&self) -> bool {
        self.dir().is_some() && self.collection().is_some()
    }
}
