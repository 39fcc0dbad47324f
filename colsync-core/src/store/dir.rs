//! Filesystem store using the DecSync v1 directory layout.
//!
//! ```text
//! <root>/
//! ├── .decsync-info                     {"version": 1}
//! └── <sync type>/
//!     └── <collection>/
//!         └── new-entries/
//!             └── <app id>/
//!                 └── info              one [datetime, key, value] per line
//! ```
//!
//! Writes append a line to the writer's own file. Reads scan the files of all
//! app ids and keep the entry with the newest datetime. Datetimes are compared
//! as instants, so writers that omit the zone or the fraction still order
//! correctly against ours. A datetime without a zone is read as UTC.
//!
//! Collection ids and app ids become directory names and must be a single
//! plain path component.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{ColSyncError, ColSyncResult};
use crate::store::{RootStatus, SyncStore, WriteSession};
use crate::sync_type::SyncType;

const DECSYNC_INFO: &str = ".decsync-info";
const SUPPORTED_VERSION: i64 = 1;
const ENTRIES_DIR: &str = "new-entries";
const INFO_PATH: &str = "info";

#[derive(Debug, Clone, Copy, Default)]
pub struct DirStore;

impl DirStore {
    pub fn new() -> Self {
        DirStore
    }

    fn collection_path(root: &Path, sync_type: SyncType, collection: &str) -> ColSyncResult<PathBuf> {
        check_component(collection)?;
        Ok(root.join(sync_type.as_str()).join(collection))
    }

    fn ensure_marker(root: &Path) -> ColSyncResult<()> {
        let path = root.join(DECSYNC_INFO);
        if path.exists() {
            return Ok(());
        }

        fs::create_dir_all(root).map_err(|e| store_error(root, e))?;
        let marker = serde_json::json!({ "version": SUPPORTED_VERSION });
        fs::write(&path, marker.to_string()).map_err(|e| store_error(&path, e))?;
        tracing::debug!(root = %root.display(), "created .decsync-info");
        Ok(())
    }
}

fn store_error(path: &Path, e: std::io::Error) -> ColSyncError {
    ColSyncError::StoreAccess(format!("{}: {e}", path.display()))
}

/// Rejects ids that would not map to exactly one directory below their parent.
fn check_component(id: &str) -> ColSyncResult<()> {
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\', '\0']) {
        return Err(ColSyncError::InvalidId(id.to_string()));
    }
    Ok(())
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn parse_json(text: &str) -> ColSyncResult<Value> {
    serde_json::from_str(text).map_err(|e| ColSyncError::Serialization(e.to_string()))
}

/// Returns `(datetime, key, value)` for a well-formed entry line.
fn parse_line(line: &str) -> Option<(NaiveDateTime, Value, Value)> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(line) else {
        return None;
    };
    let [Value::String(datetime), key, value] = <[Value; 3]>::try_from(items).ok()? else {
        return None;
    };
    Some((parse_datetime(&datetime)?, key, value))
}

impl SyncStore for DirStore {
    fn check_root(&self, root: &Path) -> RootStatus {
        let path = root.join(DECSYNC_INFO);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            // A fresh directory gets its marker on first write
            Err(e) if e.kind() == ErrorKind::NotFound => return RootStatus::Ok,
            Err(e) => {
                tracing::debug!(path = %path.display(), %e, "could not read .decsync-info");
                return RootStatus::Unknown(-1);
            }
        };

        let Ok(Value::Object(info)) = serde_json::from_str::<Value>(&content) else {
            return RootStatus::InvalidMarker;
        };

        match info.get("version").and_then(Value::as_i64) {
            Some(SUPPORTED_VERSION) => RootStatus::Ok,
            Some(_) => RootStatus::UnsupportedVersion,
            None => RootStatus::InvalidMarker,
        }
    }

    fn list_raw_identifiers(&self, root: &Path, sync_type: SyncType) -> ColSyncResult<Vec<String>> {
        let dir = root.join(sync_type.as_str());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_error(&dir, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| store_error(&dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && !name.starts_with('.')
            {
                ids.push(name.to_string());
            }
        }
        Ok(ids)
    }

    fn read_entry(
        &self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        key: &str,
    ) -> ColSyncResult<Option<String>> {
        let key = parse_json(key)?;
        let entries_dir = Self::collection_path(root, sync_type, collection)?.join(ENTRIES_DIR);
        let app_dirs = match fs::read_dir(&entries_dir) {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(&entries_dir, e)),
        };

        let mut newest: Option<(NaiveDateTime, Value)> = None;
        for app_dir in app_dirs {
            let app_dir = app_dir.map_err(|e| store_error(&entries_dir, e))?;
            let path = app_dir.path().join(INFO_PATH);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(store_error(&path, e)),
            };

            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let Some((datetime, line_key, value)) = parse_line(line) else {
                    tracing::debug!(path = %path.display(), "skipping malformed entry line");
                    continue;
                };
                if line_key != key {
                    continue;
                }
                if newest.as_ref().is_none_or(|(current, _)| datetime >= *current) {
                    newest = Some((datetime, value));
                }
            }
        }

        Ok(newest.map(|(_, value)| value.to_string()))
    }

    fn open_session<'a>(
        &'a self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        app_id: &str,
    ) -> ColSyncResult<Box<dyn WriteSession + 'a>> {
        check_component(app_id)?;
        let dir = Self::collection_path(root, sync_type, collection)?
            .join(ENTRIES_DIR)
            .join(app_id);

        Self::ensure_marker(root)?;
        fs::create_dir_all(&dir).map_err(|e| store_error(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "opened write session");

        Ok(Box::new(DirSession { dir }))
    }
}

struct DirSession {
    dir: PathBuf,
}

impl WriteSession for DirSession {
    fn write_entry(&mut self, path: &[&str], key: &str, value: &str) -> ColSyncResult<()> {
        let Some((file, parents)) = path.split_last() else {
            return Err(ColSyncError::StoreAccess("entry path must not be empty".into()));
        };
        let dir = parents.iter().fold(self.dir.clone(), |dir, p| dir.join(p));
        fs::create_dir_all(&dir).map_err(|e| store_error(&dir, e))?;

        let datetime = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let line = serde_json::json!([datetime, parse_json(key)?, parse_json(value)?]);

        let file_path = dir.join(file);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| store_error(&file_path, e))?;
        writeln!(file, "{line}").map_err(|e| store_error(&file_path, e))?;
        Ok(())
    }
}
