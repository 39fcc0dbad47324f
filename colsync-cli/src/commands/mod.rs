pub mod check;
pub mod create;
pub mod delete;
pub mod link;
pub mod list;
pub mod rename;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use colsync_core::config::ColSyncConfig;
use colsync_core::store::DirStore;
use colsync_core::{Directory, InfoStore, SyncType};

/// The filesystem store every command works against.
pub static STORE: DirStore = DirStore;

pub struct Context {
    pub config: ColSyncConfig,
    /// DecSync directory given with `--dir`, if any.
    pub dir_override: Option<PathBuf>,
}

impl Context {
    pub fn new(config: ColSyncConfig, dir_override: Option<PathBuf>) -> Self {
        Context {
            config,
            dir_override,
        }
    }

    /// The DecSync directory to operate on.
    pub fn root(&self) -> PathBuf {
        self.dir_override
            .clone()
            .unwrap_or_else(|| self.config.decsync_dir())
    }

    pub fn info(&self, sync_type: SyncType) -> InfoStore<'static> {
        InfoStore::new(&STORE, self.root(), sync_type).with_limits(self.config.limits())
    }

    /// Opens the directory for `sync_type`, failing on an incompatible root.
    pub fn directory(&self, sync_type: SyncType) -> Result<Directory<'static>> {
        let root = self.root();
        Directory::open(self.info(sync_type))
            .with_context(|| format!("Cannot use DecSync directory {}", root.display()))
    }
}

/// Looks up the display name of a visible collection.
pub fn require_collection(directory: &Directory, sync_type: SyncType, id: &str) -> Result<String> {
    match directory.find(id)? {
        Some(name) => Ok(name),
        None => anyhow::bail!(
            "No {} with id '{}'. List them with:\n  colsync list {}",
            sync_type.title(),
            id,
            sync_type
        ),
    }
}
