//! Terminal rendering for colsync-core types.

use colsync_core::CollectionEntry;
use colsync_core::store::RootStatus;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for CollectionEntry {
    fn render(&self) -> String {
        format!("{}  {}", self.id.dimmed(), self.name)
    }
}

impl Render for RootStatus {
    fn render(&self) -> String {
        if self.is_ok() {
            format!("{} {}", "✓".green(), self)
        } else {
            format!("{} {}", "✗".red(), self.to_string().red())
        }
    }
}
