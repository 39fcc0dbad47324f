//! Configuration sessions for sources being set up or edited.
//!
//! A session holds everything needed while a source is being configured:
//! its pending [`SourceConfig`] and the color it had when the session began.
//! Sessions are keyed by source uid and driven by plain method calls when the
//! user picks a directory, picks, creates, renames or deletes a collection,
//! or confirms.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::color::ColorSync;
use crate::directory::Directory;
use crate::error::{ColSyncError, ColSyncResult};
use crate::identity::{derive_app_id, ensure_identity};
use crate::info::InfoStore;
use crate::source::SourceConfig;
use crate::store::{Limits, SyncStore};
use crate::sync_type::SyncType;

pub struct ConfigSession {
    sync_type: SyncType,
    colors: ColorSync,
    source: SourceConfig,
    is_new: bool,
}

impl ConfigSession {
    pub fn sync_type(&self) -> SyncType {
        self.sync_type
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Name of the selected collection, as last resolved from the store.
    pub fn display_name(&self) -> Option<&str> {
        self.source.display_name.as_deref()
    }

    /// Whether the source had no directory when the session began. Only new
    /// sources may change their directory.
    pub fn is_new(&self) -> bool {
        self.is_new
    }
}

/// Shared by all sessions: the store and how to talk to it.
struct Backend<'s> {
    store: &'s dyn SyncStore,
    app_label: String,
    limits: Limits,
}

impl<'s> Backend<'s> {
    fn info(&self, sync_type: SyncType, source: &SourceConfig) -> InfoStore<'s> {
        let root = source.decsync_dir.clone().unwrap_or_default();
        let app_id = match source.app_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => derive_app_id(&self.app_label),
        };

        InfoStore::new(self.store, root, sync_type)
            .with_app_id(app_id)
            .with_limits(self.limits)
    }

    fn refresh_color(&self, session: &mut ConfigSession) {
        let info = self.info(session.sync_type, &session.source);
        session.colors.apply_stored_color(&info, &mut session.source);
    }
}

/// The configuration sessions currently in progress.
pub struct ConfigSessions<'s> {
    backend: Backend<'s>,
    sessions: HashMap<String, ConfigSession>,
}

impl<'s> ConfigSessions<'s> {
    pub fn new(store: &'s dyn SyncStore, app_label: impl Into<String>) -> Self {
        ConfigSessions {
            backend: Backend {
                store,
                app_label: app_label.into(),
                limits: Limits::default(),
            },
            sessions: HashMap::new(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.backend.limits = limits;
        self
    }

    /// Starts configuring `source`, replacing any session for the same uid.
    ///
    /// A source without a directory is new: it gets `default_root` and may
    /// later switch directories. The source's current color becomes the
    /// fallback for collections without a color.
    pub fn begin(
        &mut self,
        uid: &str,
        sync_type: SyncType,
        mut source: SourceConfig,
        default_root: PathBuf,
    ) -> &ConfigSession {
        let colors = ColorSync::new(sync_type, &source);
        let is_new = source.dir().is_none();
        if is_new {
            source.decsync_dir = Some(default_root);
        }

        let mut session = ConfigSession {
            sync_type,
            colors,
            source,
            is_new,
        };
        self.backend.refresh_color(&mut session);
        tracing::debug!(uid, %sync_type, is_new, "began configuration session");

        self.sessions.insert(uid.to_string(), session);
        &self.sessions[uid]
    }

    pub fn get(&self, uid: &str) -> Option<&ConfigSession> {
        self.sessions.get(uid)
    }

    /// Mutable access to the pending source, e.g. for a local color change.
    pub fn source_mut(&mut self, uid: &str) -> ColSyncResult<&mut SourceConfig> {
        Ok(&mut self.session_mut(uid)?.source)
    }

    /// Opens the directory of the session's source for listing and lifecycle
    /// operations. Fails if the root is incompatible.
    pub fn directory(&self, uid: &str) -> ColSyncResult<Directory<'s>> {
        let session = self
            .sessions
            .get(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        if session.source.dir().is_none() {
            return Err(ColSyncError::Incomplete(uid.to_string()));
        }

        Directory::open(self.backend.info(session.sync_type, &session.source))
    }

    /// Points a new source at another DecSync directory. The collection
    /// selection is cleared.
    pub fn set_directory(&mut self, uid: &str, dir: PathBuf) -> ColSyncResult<()> {
        let session = self
            .sessions
            .get_mut(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        if !session.is_new {
            return Err(ColSyncError::Locked(uid.to_string()));
        }

        session.source.decsync_dir = Some(dir);
        session.source.collection = None;
        session.source.display_name = None;
        self.backend.refresh_color(session);
        Ok(())
    }

    /// Binds the source to an existing collection and loads its color.
    /// Returns the collection's display name.
    pub fn select_collection(&mut self, uid: &str, collection: &str) -> ColSyncResult<String> {
        let name = self
            .directory(uid)?
            .find(collection)?
            .ok_or_else(|| ColSyncError::CollectionNotFound(collection.to_string()))?;

        let session = self
            .sessions
            .get_mut(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        session.source.collection = Some(collection.to_string());
        session.source.display_name = Some(name.clone());
        self.backend.refresh_color(session);
        Ok(name)
    }

    /// Creates a collection in the source's directory and selects it.
    pub fn create_collection(&mut self, uid: &str, display_name: &str) -> ColSyncResult<String> {
        let id = self.directory(uid)?.create(display_name)?;
        self.select_collection(uid, &id)?;
        Ok(id)
    }

    /// Renames the selected collection and returns whether a write happened.
    /// The source's display name follows the collection's name.
    pub fn rename_collection(&mut self, uid: &str, new_name: &str) -> ColSyncResult<bool> {
        let collection = self.selected(uid)?;
        let directory = self.directory(uid)?;
        let current = directory
            .find(&collection)?
            .ok_or_else(|| ColSyncError::CollectionNotFound(collection.clone()))?;

        let renamed = directory.rename(&collection, &current, new_name)?;
        let name = if renamed { new_name } else { current.as_str() };
        self.session_mut(uid)?.source.display_name = Some(name.to_string());
        Ok(renamed)
    }

    /// Deletes the selected collection and clears the selection. The source
    /// goes back to its original color.
    pub fn delete_collection(&mut self, uid: &str) -> ColSyncResult<()> {
        let collection = self.selected(uid)?;
        self.directory(uid)?.delete(&collection)?;

        let session = self
            .sessions
            .get_mut(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        session.source.collection = None;
        session.source.display_name = None;
        self.backend.refresh_color(session);
        Ok(())
    }

    /// Whether the source can be confirmed. False for unknown uids.
    pub fn is_complete(&self, uid: &str) -> bool {
        self.sessions
            .get(uid)
            .is_some_and(|session| session.source.is_complete())
    }

    /// Confirms the source: provisions its application identity if needed and
    /// pushes a changed color to the collection. Returns the source to persist.
    pub fn commit(&mut self, uid: &str) -> ColSyncResult<SourceConfig> {
        let session = self
            .sessions
            .get_mut(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        if !session.source.is_complete() {
            return Err(ColSyncError::Incomplete(uid.to_string()));
        }

        ensure_identity(&mut session.source, &self.backend.app_label);

        let info = self.backend.info(session.sync_type, &session.source);
        let wrote_color = session.colors.commit_color(&info, &session.source)?;
        tracing::debug!(uid, wrote_color, "committed configuration session");

        Ok(session.source.clone())
    }

    /// Drops the session, returning its pending source.
    pub fn end(&mut self, uid: &str) -> Option<SourceConfig> {
        self.sessions.remove(uid).map(|session| session.source)
    }

    fn selected(&self, uid: &str) -> ColSyncResult<String> {
        let session = self
            .sessions
            .get(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))?;
        session
            .source
            .collection()
            .map(str::to_string)
            .ok_or_else(|| ColSyncError::Incomplete(uid.to_string()))
    }

    fn session_mut(&mut self, uid: &str) -> ColSyncResult<&mut ConfigSession> {
        self.sessions
            .get_mut(uid)
            .ok_or_else(|| ColSyncError::SessionNotFound(uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Attribute;
    use crate::store::{MemoryStore, RootStatus};
    use serde_json::json;
    use std::path::Path;

    const ROOT: &str = "/decsync";
    const UID: &str = "source-1";

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        info.set("colID00042", Attribute::Name, &json!("Work")).unwrap();
        info.set("colID00042", Attribute::Color, &json!("#abcdef")).unwrap();
        info.set("colID00099", Attribute::Name, &json!("Old")).unwrap();
        info.set("colID00099", Attribute::Deleted, &json!(true)).unwrap();
        store
    }

    #[test]
    fn new_source_gets_default_root() {
        let store = MemoryStore::new();
        let mut sessions = ConfigSessions::new(&store, "colsync");

        let session = sessions.begin(
            UID,
            SyncType::Calendars,
            SourceConfig::default(),
            PathBuf::from(ROOT),
        );
        assert!(session.is_new());
        assert_eq!(session.source().dir(), Some(Path::new(ROOT)));
        assert!(!sessions.is_complete(UID));
        assert!(!sessions.is_complete("unknown"));
    }

    #[test]
    fn selecting_collection_loads_name_and_color() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        let source = SourceConfig {
            color: Some("#112233".into()),
            ..SourceConfig::default()
        };
        sessions.begin(UID, SyncType::Calendars, source, PathBuf::from(ROOT));
        assert_eq!(
            sessions.get(UID).unwrap().source().color.as_deref(),
            Some("#112233")
        );

        let name = sessions.select_collection(UID, "colID00042").unwrap();
        assert_eq!(name, "Work");

        let session = sessions.get(UID).unwrap();
        assert_eq!(session.display_name(), Some("Work"));
        assert_eq!(session.source().color.as_deref(), Some("#abcdef"));
        assert!(sessions.is_complete(UID));
    }

    #[test]
    fn deleted_collection_cannot_be_selected() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));

        let err = sessions.select_collection(UID, "colID00099").unwrap_err();
        assert!(matches!(err, ColSyncError::CollectionNotFound(_)));
        assert!(!sessions.is_complete(UID));
    }

    #[test]
    fn mistyped_collection_id_is_rejected() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));
        let writes = store.write_count();

        let err = sessions.select_collection(UID, "typo-id").unwrap_err();
        assert!(matches!(err, ColSyncError::CollectionNotFound(_)));
        assert!(matches!(sessions.commit(UID), Err(ColSyncError::Incomplete(_))));

        assert_eq!(store.write_count(), writes);
        assert_eq!(
            store.list_raw_identifiers(Path::new(ROOT), SyncType::Calendars).unwrap(),
            vec!["colID00042".to_string(), "colID00099".to_string()]
        );
    }

    #[test]
    fn selection_names_the_source() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));
        sessions.select_collection(UID, "colID00042").unwrap();

        let committed = sessions.commit(UID).unwrap();
        assert_eq!(committed.display_name.as_deref(), Some("Work"));
    }

    #[test]
    fn renaming_selected_collection_renames_source() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));
        sessions.select_collection(UID, "colID00042").unwrap();

        assert!(sessions.rename_collection(UID, "Office").unwrap());
        assert_eq!(sessions.get(UID).unwrap().display_name(), Some("Office"));

        let writes = store.write_count();
        assert!(!sessions.rename_collection(UID, "Office").unwrap());
        assert_eq!(store.write_count(), writes);

        let directory = sessions.directory(UID).unwrap();
        assert_eq!(directory.find("colID00042").unwrap().as_deref(), Some("Office"));
    }

    #[test]
    fn rename_needs_a_selection() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));

        assert!(matches!(
            sessions.rename_collection(UID, "Office"),
            Err(ColSyncError::Incomplete(_))
        ));
        assert!(matches!(
            sessions.delete_collection("unknown"),
            Err(ColSyncError::SessionNotFound(_))
        ));
    }

    #[test]
    fn deleting_selected_collection_clears_selection() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        let source = SourceConfig {
            color: Some("#112233".into()),
            ..SourceConfig::default()
        };
        sessions.begin(UID, SyncType::Calendars, source, PathBuf::from(ROOT));
        sessions.select_collection(UID, "colID00042").unwrap();

        sessions.delete_collection(UID).unwrap();

        let session = sessions.get(UID).unwrap();
        assert_eq!(session.source().collection, None);
        assert_eq!(session.display_name(), None);
        assert_eq!(session.source().color.as_deref(), Some("#112233"));
        assert!(!sessions.is_complete(UID));

        let directory = sessions.directory(UID).unwrap();
        assert_eq!(directory.find("colID00042").unwrap(), None);
    }

    #[test]
    fn changing_directory_clears_selection_and_restores_color() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        let source = SourceConfig {
            color: Some("#112233".into()),
            ..SourceConfig::default()
        };
        sessions.begin(UID, SyncType::Calendars, source, PathBuf::from(ROOT));
        sessions.select_collection(UID, "colID00042").unwrap();

        sessions.set_directory(UID, PathBuf::from("/elsewhere")).unwrap();

        let session = sessions.get(UID).unwrap();
        assert_eq!(session.source().collection, None);
        assert_eq!(session.display_name(), None);
        assert_eq!(session.source().color.as_deref(), Some("#112233"));
    }

    #[test]
    fn existing_source_keeps_its_directory() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        let source = SourceConfig {
            decsync_dir: Some(PathBuf::from(ROOT)),
            collection: Some("colID00042".into()),
            display_name: None,
            app_id: Some("desk-colsync-00001".into()),
            color: None,
        };
        let session = sessions.begin(UID, SyncType::Calendars, source, PathBuf::from("/default"));
        assert!(!session.is_new());
        assert_eq!(session.source().color.as_deref(), Some("#abcdef"));

        let err = sessions.set_directory(UID, PathBuf::from("/other")).unwrap_err();
        assert!(matches!(err, ColSyncError::Locked(_)));
    }

    #[test]
    fn create_selects_new_collection() {
        let store = MemoryStore::new();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Tasks, SourceConfig::default(), PathBuf::from(ROOT));

        let id = sessions.create_collection(UID, "Groceries").unwrap();

        let session = sessions.get(UID).unwrap();
        assert_eq!(session.source().collection(), Some(id.as_str()));
        assert_eq!(session.display_name(), Some("Groceries"));
    }

    #[test]
    fn commit_provisions_identity_and_pushes_color() {
        let store = MemoryStore::new();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        let source = SourceConfig {
            color: Some("#112233".into()),
            ..SourceConfig::default()
        };
        sessions.begin(UID, SyncType::Calendars, source, PathBuf::from(ROOT));
        let id = sessions.create_collection(UID, "Work").unwrap();

        let committed = sessions.commit(UID).unwrap();
        let app_id = committed.app_id.clone().unwrap();
        assert!(app_id.contains("-colsync-"), "{app_id}");
        assert_eq!(
            store.writer_of(Path::new(ROOT), SyncType::Calendars, &id, "\"color\"").as_deref(),
            Some(app_id.as_str())
        );

        // Committing again keeps the identity and writes nothing.
        let writes = store.write_count();
        let again = sessions.commit(UID).unwrap();
        assert_eq!(again.app_id.as_deref(), Some(app_id.as_str()));
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn local_color_edit_is_committed() {
        let store = seeded_store();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));
        sessions.select_collection(UID, "colID00042").unwrap();

        sessions.source_mut(UID).unwrap().color = Some("#00ff00".into());
        sessions.commit(UID).unwrap();

        let info = InfoStore::new(&store, ROOT, SyncType::Calendars);
        assert_eq!(
            info.get("colID00042", Attribute::Color, None).unwrap().as_deref(),
            Some("#00ff00")
        );
    }

    #[test]
    fn incomplete_source_cannot_commit() {
        let store = MemoryStore::new();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Memos, SourceConfig::default(), PathBuf::from(ROOT));

        assert!(matches!(sessions.commit(UID), Err(ColSyncError::Incomplete(_))));
        assert!(matches!(
            sessions.commit("unknown"),
            Err(ColSyncError::SessionNotFound(_))
        ));
    }

    #[test]
    fn incompatible_root_blocks_listing() {
        let store = seeded_store();
        store.set_root_status(Path::new(ROOT), RootStatus::InvalidMarker);
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Calendars, SourceConfig::default(), PathBuf::from(ROOT));

        assert!(matches!(
            sessions.directory(UID),
            Err(ColSyncError::RootIncompatible(RootStatus::InvalidMarker))
        ));
    }

    #[test]
    fn end_drops_session() {
        let store = MemoryStore::new();
        let mut sessions = ConfigSessions::new(&store, "colsync");
        sessions.begin(UID, SyncType::Contacts, SourceConfig::default(), PathBuf::from(ROOT));

        let source = sessions.end(UID).unwrap();
        assert_eq!(source.dir(), Some(Path::new(ROOT)));
        assert!(sessions.get(UID).is_none());
        assert!(sessions.end(UID).is_none());
    }
}
