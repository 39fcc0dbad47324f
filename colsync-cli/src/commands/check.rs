use anyhow::Result;
use colsync_core::Directory;

use super::{Context, STORE};
use crate::render::Render;

pub fn run(ctx: &Context) -> Result<()> {
    let root = ctx.root();
    let status = Directory::check(&STORE, &root);

    println!("{}", root.display());
    println!("   {}", status.render());

    if !status.is_ok() {
        anyhow::bail!("{} cannot be used: {}", root.display(), status);
    }

    Ok(())
}
