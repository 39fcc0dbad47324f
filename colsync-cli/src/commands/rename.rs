use anyhow::Result;
use colsync_core::SyncType;
use owo_colors::OwoColorize;

use super::{Context, require_collection};

pub fn run(ctx: &Context, sync_type: SyncType, id: &str, name: &str) -> Result<()> {
    let directory = ctx.directory(sync_type)?;
    let current = require_collection(&directory, sync_type, id)?;

    if directory.rename(id, &current, name)? {
        println!("{} Renamed '{}' to '{}'", "✓".green(), current, name);
    } else {
        println!("{}", format!("'{current}' is unchanged").dimmed());
    }

    Ok(())
}
