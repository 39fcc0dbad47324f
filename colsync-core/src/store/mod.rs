//! The synchronization store contract.
//!
//! colsync never merges data itself. It talks to a DecSync-style store through
//! [`SyncStore`]: a root-level compatibility check, a listing of raw collection
//! identifiers, reads of single `info` entries, and scoped write sessions that
//! attribute every write to an application identity. Replication between
//! devices and convergence of concurrent writers are the store's business.
//!
//! Keys and values cross this boundary as JSON text.

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ColSyncResult;
use crate::sync_type::SyncType;

/// Environment variable overriding the default DecSync directory.
pub const DECSYNC_DIR_ENV: &str = "DECSYNC_DIR";

/// Result of validating a root's compatibility marker (`.decsync-info`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus {
    Ok,
    InvalidMarker,
    UnsupportedVersion,
    Unknown(i32),
}

impl RootStatus {
    /// Maps the integer codes used by DecSync libraries.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => RootStatus::Ok,
            1 => RootStatus::InvalidMarker,
            2 => RootStatus::UnsupportedVersion,
            other => RootStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RootStatus::Ok => 0,
            RootStatus::InvalidMarker => 1,
            RootStatus::UnsupportedVersion => 2,
            RootStatus::Unknown(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RootStatus::Ok)
    }
}

impl fmt::Display for RootStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RootStatus::Ok => f.write_str("OK"),
            RootStatus::InvalidMarker => f.write_str("Invalid .decsync-info"),
            RootStatus::UnsupportedVersion => f.write_str("Unsupported DecSync version"),
            RootStatus::Unknown(_) => f.write_str("Unknown error"),
        }
    }
}

/// Caps applied to what is read back from a store.
///
/// Older DecSync frontends read into fixed buffers of 256 collections and
/// 256 bytes per value, silently truncating anything longer. Both caps are
/// off by default; [`Limits::legacy`] restores them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of raw collection identifiers taken from a listing.
    pub max_collections: Option<usize>,
    /// Maximum length in bytes of a raw JSON value read from the store.
    pub max_value_len: Option<usize>,
}

impl Limits {
    pub const LEGACY_CAPACITY: usize = 256;

    pub fn legacy() -> Self {
        Limits {
            max_collections: Some(Self::LEGACY_CAPACITY),
            max_value_len: Some(Self::LEGACY_CAPACITY),
        }
    }

    /// Truncates a raw value to `max_value_len` bytes, on a char boundary.
    pub(crate) fn clip_value(&self, mut value: String) -> String {
        if let Some(max) = self.max_value_len
            && value.len() > max
        {
            let mut end = max;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            value.truncate(end);
        }
        value
    }
}

/// A DecSync-style synchronization store.
///
/// Every call blocks until the store answers; implementations may be backed
/// by the filesystem or the network.
pub trait SyncStore {
    /// Validates the compatibility marker of `root`.
    fn check_root(&self, root: &Path) -> RootStatus;

    /// Collection identifiers stored under `root` for `sync_type`, in store order.
    /// Soft-deleted collections are included.
    fn list_raw_identifiers(&self, root: &Path, sync_type: SyncType) -> ColSyncResult<Vec<String>>;

    /// Reads the current value of an `info` entry. Returns `None` when the key
    /// was never written.
    fn read_entry(
        &self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        key: &str,
    ) -> ColSyncResult<Option<String>>;

    /// Opens a write session attributed to `app_id`. The session is released
    /// when dropped.
    fn open_session<'a>(
        &'a self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        app_id: &str,
    ) -> ColSyncResult<Box<dyn WriteSession + 'a>>;
}

/// A scoped write handle for one collection and one application identity.
pub trait WriteSession {
    fn write_entry(&mut self, path: &[&str], key: &str, value: &str) -> ColSyncResult<()>;

    /// Releases the session, reporting any error flushing it.
    fn close(self: Box<Self>) -> ColSyncResult<()> {
        Ok(())
    }
}

/// The DecSync directory used when none is configured: `$DECSYNC_DIR`, or
/// `decsync` inside the user's data directory.
pub fn default_root_path() -> PathBuf {
    if let Some(dir) = std::env::var_os(DECSYNC_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("decsync")
}
