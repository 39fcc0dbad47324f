//! Reading and writing a collection's `info` entries.
//!
//! Each collection carries a handful of attributes (`name`, `color`,
//! `deleted`) stored as JSON under the `info` path. A collection whose
//! `deleted` attribute is `true` is invisible: every read returns `None`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ColSyncResult;
use crate::identity::{DEFAULT_APP_LABEL, derive_app_id};
use crate::store::{Limits, SyncStore};
use crate::sync_type::SyncType;

const INFO_PATH: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Name,
    Color,
    Deleted,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Color => "color",
            Attribute::Deleted => "deleted",
        }
    }

    /// The JSON-encoded entry key.
    fn key(&self) -> String {
        Value::from(self.as_str()).to_string()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the `info` entries of the collections under one root and sync type.
pub struct InfoStore<'a> {
    store: &'a dyn SyncStore,
    root: PathBuf,
    sync_type: SyncType,
    app_id: String,
    limits: Limits,
}

impl<'a> InfoStore<'a> {
    /// Writes are attributed to `<hostname>-colsync` until an identity is
    /// supplied with [`InfoStore::with_app_id`].
    pub fn new(store: &'a dyn SyncStore, root: impl Into<PathBuf>, sync_type: SyncType) -> Self {
        InfoStore {
            store,
            root: root.into(),
            sync_type,
            app_id: derive_app_id(DEFAULT_APP_LABEL),
            limits: Limits::default(),
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &'a dyn SyncStore {
        self.store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sync_type(&self) -> SyncType {
        self.sync_type
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Reads an attribute of `collection`.
    ///
    /// Returns `None` if the collection is deleted, whatever the attribute and
    /// fallback. Otherwise returns the stored value, or `fallback` when the
    /// attribute is unset, `null`, or not valid JSON. String values are
    /// returned unquoted, other JSON values as their JSON text.
    pub fn get(
        &self,
        collection: &str,
        attribute: Attribute,
        fallback: Option<&str>,
    ) -> ColSyncResult<Option<String>> {
        if self.is_deleted(collection)? {
            return Ok(None);
        }

        let value = match self.read(collection, attribute)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(value.or_else(|| fallback.map(str::to_string)))
    }

    /// Whether `collection` has been soft-deleted. Anything but a JSON `true`
    /// counts as not deleted.
    pub fn is_deleted(&self, collection: &str) -> ColSyncResult<bool> {
        Ok(matches!(
            self.read(collection, Attribute::Deleted)?,
            Some(Value::Bool(true))
        ))
    }

    /// Writes an attribute of `collection` as this store's application identity.
    pub fn set(&self, collection: &str, attribute: Attribute, value: &Value) -> ColSyncResult<()> {
        let mut session =
            self.store
                .open_session(&self.root, self.sync_type, collection, &self.app_id)?;
        session.write_entry(&[INFO_PATH], &attribute.key(), &value.to_string())?;
        session.close()?;

        tracing::debug!(
            sync_type = %self.sync_type,
            collection,
            %attribute,
            %value,
            app_id = %self.app_id,
            "wrote info entry"
        );
        Ok(())
    }

    fn read(&self, collection: &str, attribute: Attribute) -> ColSyncResult<Option<Value>> {
        let Some(raw) =
            self.store
                .read_entry(&self.root, self.sync_type, collection, &attribute.key())?
        else {
            return Ok(None);
        };

        let raw = self.limits.clip_value(raw);
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(collection, %attribute, %e, "ignoring malformed info value");
                Ok(None)
            }
        }
    }
}
