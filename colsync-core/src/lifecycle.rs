//! Creating, renaming and deleting collections.
//!
//! New identifiers are `colID` followed by five random digits. Nothing is
//! reserved and existing identifiers are not checked, so two `create` calls
//! under the same root and sync type can collide (roughly one in 100 000).

use rand::Rng;
use serde_json::json;

use crate::directory::Directory;
use crate::error::{ColSyncError, ColSyncResult};
use crate::info::Attribute;

const ID_PREFIX: &str = "colID";
const ID_RANGE: u32 = 100_000;

pub fn new_collection_id<R: Rng>(rng: &mut R) -> String {
    format!("{ID_PREFIX}{:05}", rng.gen_range(0..ID_RANGE))
}

impl Directory<'_> {
    /// Creates a collection named `display_name` and returns its identifier.
    pub fn create(&self, display_name: &str) -> ColSyncResult<String> {
        self.create_with_rng(display_name, &mut rand::thread_rng())
    }

    pub fn create_with_rng<R: Rng>(&self, display_name: &str, rng: &mut R) -> ColSyncResult<String> {
        if display_name.is_empty() {
            return Err(ColSyncError::InvalidName);
        }

        let id = new_collection_id(rng);
        self.info().set(&id, Attribute::Name, &json!(display_name))?;

        tracing::info!(sync_type = %self.info().sync_type(), %id, display_name, "created collection");
        Ok(id)
    }

    /// Renames `collection` from `current_name` to `new_name`.
    ///
    /// `current_name` is the name the caller displays; nothing is written when
    /// `new_name` equals it or is empty. Returns whether a write happened.
    /// Fails with `CollectionNotFound` for an identifier the store has never
    /// seen.
    pub fn rename(&self, collection: &str, current_name: &str, new_name: &str) -> ColSyncResult<bool> {
        if new_name.is_empty() || new_name == current_name {
            return Ok(false);
        }
        self.require(collection)?;

        self.info().set(collection, Attribute::Name, &json!(new_name))?;
        tracing::info!(collection, new_name, "renamed collection");
        Ok(true)
    }

    /// Marks `collection` as deleted. Its data stays in the store but it is
    /// hidden from every read and listing from now on.
    pub fn delete(&self, collection: &str) -> ColSyncResult<()> {
        self.require(collection)?;
        self.info().set(collection, Attribute::Deleted, &json!(true))?;
        tracing::info!(collection, "deleted collection");
        Ok(())
    }

    fn require(&self, collection: &str) -> ColSyncResult<()> {
        if self.contains(collection)? {
            Ok(())
        } else {
            Err(ColSyncError::CollectionNotFound(collection.to_string()))
        }
    }
}
