use anyhow::Result;
use colsync_core::SyncType;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::{Context, require_collection};

pub fn run(ctx: &Context, sync_type: SyncType, id: &str, yes: bool) -> Result<()> {
    let directory = ctx.directory(sync_type)?;
    let name = require_collection(&directory, sync_type, id)?;

    let confirmed = yes
        || Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete the {} '{}'?",
                sync_type.title(),
                name
            ))
            .default(false)
            .interact()?;

    if !confirmed {
        tracing::debug!(id, "deletion cancelled");
        println!("{}", "Nothing deleted".dimmed());
        return Ok(());
    }

    directory.delete(id)?;
    println!("{} Deleted {} '{}'", "✓".green(), sync_type.title(), name);
    Ok(())
}
