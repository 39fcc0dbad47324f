//! Discovery of the collections under a DecSync directory.

use std::path::Path;
use std::vec::IntoIter;

use crate::error::{ColSyncError, ColSyncResult};
use crate::info::{Attribute, InfoStore};
use crate::store::{RootStatus, SyncStore};

/// A visible collection: its identifier and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub id: String,
    pub name: String,
}

/// The collections of one sync type under a root whose compatibility marker
/// has been checked.
///
/// Listing is only possible through a `Directory`, and a `Directory` only
/// exists for a compatible root.
pub struct Directory<'a> {
    info: InfoStore<'a>,
}

impl<'a> Directory<'a> {
    /// Raw compatibility check for callers that only want to report it.
    pub fn check(store: &dyn SyncStore, root: &Path) -> RootStatus {
        store.check_root(root)
    }

    /// Validates the root's compatibility marker and opens the directory.
    pub fn open(info: InfoStore<'a>) -> ColSyncResult<Self> {
        let status = Self::check(info.store(), info.root());
        if !status.is_ok() {
            tracing::warn!(root = %info.root().display(), %status, "incompatible DecSync directory");
            return Err(ColSyncError::RootIncompatible(status));
        }

        Ok(Directory { info })
    }

    pub fn info(&self) -> &InfoStore<'a> {
        &self.info
    }

    /// Lists visible collections in store order.
    ///
    /// Identifiers are read when this is called; names are resolved lazily
    /// as the iterator advances. Deleted collections and collections with an
    /// empty name are skipped. When the store reports more identifiers than
    /// `Limits::max_collections`, the rest are dropped silently.
    pub fn list(&self) -> ColSyncResult<Collections<'_, 'a>> {
        let mut ids = self
            .info
            .store()
            .list_raw_identifiers(self.info.root(), self.info.sync_type())?;

        if let Some(max) = self.info.limits().max_collections
            && ids.len() > max
        {
            tracing::debug!(found = ids.len(), max, "truncating collection listing");
            ids.truncate(max);
        }

        Ok(Collections {
            info: &self.info,
            ids: ids.into_iter(),
        })
    }

    /// Whether the store has any entries for `collection`, deleted or not.
    pub fn contains(&self, collection: &str) -> ColSyncResult<bool> {
        let ids = self
            .info
            .store()
            .list_raw_identifiers(self.info.root(), self.info.sync_type())?;
        Ok(ids.iter().any(|id| id == collection))
    }

    /// The display name of one collection, or `None` if it is deleted or was
    /// never created. Falls back to the identifier when no name was ever set.
    pub fn find(&self, collection: &str) -> ColSyncResult<Option<String>> {
        if !self.contains(collection)? {
            return Ok(None);
        }
        self.info.get(collection, Attribute::Name, Some(collection))
    }
}

/// Iterator returned by [`Directory::list`].
pub struct Collections<'d, 'a> {
    info: &'d InfoStore<'a>,
    ids: IntoIter<String>,
}

impl Iterator for Collections<'_, '_> {
    type Item = ColSyncResult<CollectionEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        for id in self.ids.by_ref() {
            match self.info.get(&id, Attribute::Name, Some(&id)) {
                Ok(Some(name)) if !name.is_empty() => {
                    return Some(Ok(CollectionEntry { id, name }));
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Limits, MemoryStore};
    use crate::sync_type::SyncType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ROOT: &str = "/decsync";

    fn entry(id: &str, name: &str) -> CollectionEntry {
        CollectionEntry {
            id: id.into(),
            name: name.into(),
        }
    }

    fn list(directory: &Directory) -> Vec<CollectionEntry> {
        directory
            .list()
            .unwrap()
            .collect::<ColSyncResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn deleted_collections_are_not_listed() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        info.set("colID00042", Attribute::Name, &json!("Work")).unwrap();
        info.set("colID00099", Attribute::Name, &json!("Old")).unwrap();
        info.set("colID00099", Attribute::Deleted, &json!(true)).unwrap();

        let directory = Directory::open(info).unwrap();
        assert_eq!(list(&directory), vec![entry("colID00042", "Work")]);
    }

    #[test]
    fn deletion_after_listing_started_is_seen_by_next_listing() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Tasks);
        info.set("colID00001", Attribute::Name, &json!("Chores")).unwrap();
        let directory = Directory::open(info).unwrap();

        assert_eq!(list(&directory), vec![entry("colID00001", "Chores")]);

        directory
            .info()
            .set("colID00001", Attribute::Deleted, &json!(true))
            .unwrap();
        assert_eq!(list(&directory), vec![]);
    }

    #[test]
    fn preserves_store_order_and_skips_empty_names() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Memos);
        info.set("colID00300", Attribute::Name, &json!("Zebra")).unwrap();
        info.set("colID00100", Attribute::Name, &json!("")).unwrap();
        info.set("colID00200", Attribute::Name, &json!("Apple")).unwrap();

        let directory = Directory::open(info).unwrap();
        assert_eq!(
            list(&directory),
            vec![entry("colID00300", "Zebra"), entry("colID00200", "Apple")]
        );
    }

    #[test]
    fn unnamed_collection_is_listed_by_id() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        info.set("shared", Attribute::Color, &json!("#336699")).unwrap();

        let directory = Directory::open(info).unwrap();
        assert_eq!(list(&directory), vec![entry("shared", "shared")]);
        assert_eq!(directory.find("shared").unwrap().as_deref(), Some("shared"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        info.set("colID00042", Attribute::Name, &json!("Work")).unwrap();
        let directory = Directory::open(info).unwrap();

        assert!(directory.contains("colID00042").unwrap());
        assert!(!directory.contains("colID0042").unwrap());
        assert_eq!(directory.find("colID0042").unwrap(), None);
        assert_eq!(
            store.list_raw_identifiers(Path::new(ROOT), SyncType::Calendars).unwrap(),
            vec!["colID00042".to_string()]
        );
    }

    #[test]
    fn incompatible_root_refuses_to_open() {
        let store = MemoryStore::new();
        store.set_root_status(Path::new(ROOT), RootStatus::UnsupportedVersion);

        let result = Directory::open(InfoStore::new(&store, ROOT, SyncType::Calendars));
        assert!(matches!(
            result,
            Err(ColSyncError::RootIncompatible(RootStatus::UnsupportedVersion))
        ));
        assert_eq!(
            Directory::check(&store, Path::new(ROOT)),
            RootStatus::UnsupportedVersion
        );
    }

    #[test]
    fn listing_is_truncated_at_the_configured_cap() {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        for n in 0..(Limits::LEGACY_CAPACITY + 4) {
            info.set(&format!("colID{n:05}"), Attribute::Name, &json!(format!("Calendar {n}")))
                .unwrap();
        }

        let capped = Directory::open(info.with_limits(Limits::legacy())).unwrap();
        let listed = list(&capped);
        assert_eq!(listed.len(), Limits::LEGACY_CAPACITY);
        assert_eq!(listed.last().unwrap().id, "colID00255");

        let unbounded = Directory::open(InfoStore::new(&store, ROOT, SyncType::Calendars)).unwrap();
        assert_eq!(list(&unbounded).len(), Limits::LEGACY_CAPACITY + 4);
    }

    #[test]
    fn read_errors_are_reported() {
        let store = MemoryStore::new();
        let directory = Directory::open(InfoStore::new(&store, ROOT, SyncType::Calendars)).unwrap();
        store.fail_reads(true);
        assert!(matches!(directory.list(), Err(ColSyncError::StoreAccess(_))));
    }
}
