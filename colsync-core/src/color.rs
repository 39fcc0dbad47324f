//! Keeping a source's display color in step with its collection's `color`.
//!
//! Loading falls back to the color the source had before any collection was
//! picked, so an empty store never wipes a user's color. Committing compares
//! against the stored value without that fallback: a color that is only
//! local gets written even if it equals the original.

use serde_json::Value;

use crate::error::ColSyncResult;
use crate::info::{Attribute, InfoStore};
use crate::source::SourceConfig;
use crate::sync_type::SyncType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSync {
    sync_type: SyncType,
    original_color: Option<String>,
}

impl ColorSync {
    /// Remembers the color `source` has right now as the original color.
    pub fn new(sync_type: SyncType, source: &SourceConfig) -> Self {
        let original_color = if sync_type.mirrors_color() {
            source.color.clone()
        } else {
            None
        };

        ColorSync {
            sync_type,
            original_color,
        }
    }

    pub fn original_color(&self) -> Option<&str> {
        self.original_color.as_deref()
    }

    /// Sets `source.color` from the selected collection, or to the original
    /// color when no collection is selected or it has no color.
    ///
    /// `info` must be bound to the source's directory. A failed read is logged
    /// and treated as an unset color.
    pub fn apply_stored_color(&self, info: &InfoStore<'_>, source: &mut SourceConfig) {
        if !self.sync_type.mirrors_color() {
            return;
        }

        let color = match (source.dir(), source.collection()) {
            (Some(_), Some(collection)) => {
                match info.get(collection, Attribute::Color, self.original_color()) {
                    Ok(color) => color,
                    Err(e) => {
                        tracing::warn!(collection, %e, "could not read collection color");
                        self.original_color.clone()
                    }
                }
            }
            _ => self.original_color.clone(),
        };

        source.color = color;
    }

    /// Writes `source.color` to the selected collection if it differs from
    /// the stored color. Returns whether a write happened.
    pub fn commit_color(&self, info: &InfoStore<'_>, source: &SourceConfig) -> ColSyncResult<bool> {
        if !self.sync_type.mirrors_color() {
            return Ok(false);
        }
        let Some(collection) = source.collection() else {
            return Ok(false);
        };

        let stored = info.get(collection, Attribute::Color, None)?;
        if stored == source.color {
            return Ok(false);
        }

        let value = source.color.clone().map_or(Value::Null, Value::String);
        info.set(collection, Attribute::Color, &value)?;
        Ok(true)
    }
}
