use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use colsync_core::session::ConfigSessions;
use colsync_core::store::SyncStore;
use colsync_core::{SourceConfig, SyncType};
use owo_colors::OwoColorize;

use super::{Context, STORE};
use crate::render::Render;

/// Which collection the source should be bound to.
pub enum Selection {
    /// Keep whatever the source already points at
    Keep,
    Existing(String),
    New(String),
}

impl Selection {
    pub fn from_args(collection: Option<String>, new: Option<String>) -> Self {
        match (collection, new) {
            (_, Some(name)) => Selection::New(name),
            (Some(id), None) => Selection::Existing(id),
            (None, None) => Selection::Keep,
        }
    }
}

/// What to change while linking.
pub struct LinkOptions {
    pub selection: Selection,
    /// Local color to push to the collection
    pub color: Option<String>,
    /// New name for the bound collection
    pub rename: Option<String>,
}

pub struct Linked {
    pub source: SourceConfig,
    pub display_name: Option<String>,
}

pub fn run(
    ctx: &Context,
    sync_type: SyncType,
    source_path: &Path,
    options: LinkOptions,
) -> Result<()> {
    let source = SourceConfig::load(source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;
    let uid = source_path.display().to_string();

    let linked = link(&STORE, ctx, &uid, sync_type, source, options)?;

    linked
        .source
        .save(source_path)
        .with_context(|| format!("Failed to write {}", source_path.display()))?;

    let name = linked.display_name.as_deref().unwrap_or_default();
    println!("{} Linked {} to {} '{}'", "✓".green(), uid, sync_type.title(), name);
    if let Some(color) = &linked.source.color {
        println!("   color {}", color.dimmed());
    }

    Ok(())
}

/// Runs one configuration session for `source` and returns what to persist.
pub fn link(
    store: &dyn SyncStore,
    ctx: &Context,
    uid: &str,
    sync_type: SyncType,
    source: SourceConfig,
    options: LinkOptions,
) -> Result<Linked> {
    let mut sessions =
        ConfigSessions::new(store, ctx.config.app_label.clone()).with_limits(ctx.config.limits());

    let session = sessions.begin(uid, sync_type, source, ctx.root());
    let current_dir: Option<PathBuf> = session.source().dir().map(Path::to_path_buf);
    if let Some(dir) = &ctx.dir_override
        && current_dir.as_ref() != Some(dir)
    {
        tracing::debug!(uid, dir = %dir.display(), "switching source directory");
        sessions.set_directory(uid, dir.clone())?;
    }

    match options.selection {
        Selection::Keep => {
            if let Some(id) = sessions
                .get(uid)
                .and_then(|s| s.source().collection())
                .map(str::to_string)
            {
                sessions.select_collection(uid, &id)?;
            }
        }
        Selection::Existing(id) => {
            sessions.select_collection(uid, &id)?;
        }
        Selection::New(name) => {
            sessions.create_collection(uid, &name)?;
        }
    }

    if let Some(name) = &options.rename
        && !sessions.rename_collection(uid, name)?
    {
        tracing::debug!(uid, name = %name, "collection already has this name");
    }

    if let Some(color) = options.color {
        sessions.source_mut(uid)?.color = Some(color);
    }

    if !sessions.is_complete(uid) {
        let available: Vec<String> = sessions
            .directory(uid)?
            .list()?
            .map(|c| c.map(|c| c.render()))
            .collect::<Result<_, _>>()?;
        anyhow::bail!(
            "No {} selected. Pick one with --collection <id> or create one with --new <name>.\n\n{}",
            sync_type.title(),
            available.join("\n")
        );
    }

    let source = sessions.commit(uid)?;
    let display_name = source.display_name.clone();
    sessions.end(uid);
    tracing::debug!(uid, collection = ?source.collection, "linked source");

    Ok(Linked {
        source,
        display_name,
    })
}
