//! In-process store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ColSyncError, ColSyncResult};
use crate::store::{RootStatus, SyncStore, WriteSession};
use crate::sync_type::SyncType;

type CollectionKey = (PathBuf, SyncType, String);

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    app_id: String,
}

#[derive(Default)]
struct State {
    root_status: HashMap<PathBuf, RootStatus>,
    /// Collection ids per (root, sync type) in order of first write.
    collections: HashMap<(PathBuf, SyncType), Vec<String>>,
    /// Latest value per (collection, path, key).
    entries: HashMap<(CollectionKey, Vec<String>, String), StoredValue>,
}

/// A store held entirely in memory.
///
/// Each write replaces the previous value of its entry, so the most recent
/// write wins no matter which application identity made it. The store counts writes and
/// open sessions, and can be told to fail, which makes it a convenient test
/// double for code built on [`SyncStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<State>,
    writes: Cell<usize>,
    open_sessions: Cell<usize>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the compatibility check result for `root`.
    pub fn set_root_status(&self, root: &Path, status: RootStatus) {
        self.state
            .borrow_mut()
            .root_status
            .insert(root.to_path_buf(), status);
    }

    /// Stores a raw `info` value as another device would, bypassing sessions
    /// and the write counter. `value` is not validated.
    pub fn insert_raw(
        &self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        key: &str,
        value: &str,
        app_id: &str,
    ) {
        self.state.borrow_mut().put(
            (root.to_path_buf(), sync_type, collection.to_string()),
            vec!["info".to_string()],
            key,
            value,
            app_id,
        );
    }

    /// Number of entries written through sessions.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Number of sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.get()
    }

    /// The application identity behind the current value of an `info` entry.
    pub fn writer_of(
        &self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        key: &str,
    ) -> Option<String> {
        let state = self.state.borrow();
        state
            .entries
            .get(&(
                (root.to_path_buf(), sync_type, collection.to_string()),
                vec!["info".to_string()],
                key.to_string(),
            ))
            .map(|stored| stored.app_id.clone())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_reads(&self) -> ColSyncResult<()> {
        if self.fail_reads.get() {
            return Err(ColSyncError::StoreAccess("store is unreachable".into()));
        }
        Ok(())
    }
}

impl State {
    fn put(&mut self, collection: CollectionKey, path: Vec<String>, key: &str, value: &str, app_id: &str) {
        let (root, sync_type, id) = &collection;
        let ids = self
            .collections
            .entry((root.clone(), *sync_type))
            .or_default();
        if !ids.contains(id) {
            ids.push(id.clone());
        }

        self.entries.insert(
            (collection, path, key.to_string()),
            StoredValue {
                value: value.to_string(),
                app_id: app_id.to_string(),
            },
        );
    }
}

impl SyncStore for MemoryStore {
    fn check_root(&self, root: &Path) -> RootStatus {
        self.state
            .borrow()
            .root_status
            .get(root)
            .copied()
            .unwrap_or(RootStatus::Ok)
    }

    fn list_raw_identifiers(&self, root: &Path, sync_type: SyncType) -> ColSyncResult<Vec<String>> {
        self.check_reads()?;
        let state = self.state.borrow();
        Ok(state
            .collections
            .get(&(root.to_path_buf(), sync_type))
            .cloned()
            .unwrap_or_default())
    }

    fn read_entry(
        &self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        key: &str,
    ) -> ColSyncResult<Option<String>> {
        self.check_reads()?;
        let state = self.state.borrow();
        let stored = state.entries.get(&(
            (root.to_path_buf(), sync_type, collection.to_string()),
            vec!["info".to_string()],
            key.to_string(),
        ));
        Ok(stored.map(|s| s.value.clone()))
    }

    fn open_session<'a>(
        &'a self,
        root: &Path,
        sync_type: SyncType,
        collection: &str,
        app_id: &str,
    ) -> ColSyncResult<Box<dyn WriteSession + 'a>> {
        self.open_sessions.set(self.open_sessions.get() + 1);
        Ok(Box::new(MemorySession {
            store: self,
            collection: (root.to_path_buf(), sync_type, collection.to_string()),
            app_id: app_id.to_string(),
        }))
    }
}

struct MemorySession<'a> {
    store: &'a MemoryStore,
    collection: CollectionKey,
    app_id: String,
}

impl WriteSession for MemorySession<'_> {
    fn write_entry(&mut self, path: &[&str], key: &str, value: &str) -> ColSyncResult<()> {
        if self.store.fail_writes.get() {
            return Err(ColSyncError::StoreAccess("store rejected the write".into()));
        }

        self.store.state.borrow_mut().put(
            self.collection.clone(),
            path.iter().map(|s| s.to_string()).collect(),
            key,
            value,
            &self.app_id,
        );
        self.store.writes.set(self.store.writes.get() + 1);
        Ok(())
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        self.store
            .open_sessions
            .set(self.store.open_sessions.get() - 1);
    }
}
