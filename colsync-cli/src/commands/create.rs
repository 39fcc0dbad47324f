use anyhow::Result;
use colsync_core::SyncType;
use owo_colors::OwoColorize;

use super::Context;

pub fn run(ctx: &Context, sync_type: SyncType, name: &str) -> Result<()> {
    let directory = ctx.directory(sync_type)?;
    let id = directory.create(name)?;

    println!("{} Created {} '{}' ({})", "✓".green(), sync_type.title(), name, id.dimmed());
    Ok(())
}
