use anyhow::Result;
use colsync_core::SyncType;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::Render;

pub fn run(ctx: &Context, sync_type: SyncType) -> Result<()> {
    let directory = ctx.directory(sync_type)?;

    let mut found = false;
    for collection in directory.list()? {
        println!("{}", collection?.render());
        found = true;
    }

    if !found {
        println!(
            "{}",
            format!(
                "No {}s yet. Create one with:\n  colsync create {} <name>",
                sync_type.title(),
                sync_type
            )
            .dimmed()
        );
    }

    Ok(())
}
