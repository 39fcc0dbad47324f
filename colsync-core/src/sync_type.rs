//! The kinds of collections a DecSync directory can hold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Calendars,
    Tasks,
    Memos,
    Contacts,
}

impl SyncType {
    pub const ALL: [SyncType; 4] = [
        SyncType::Calendars,
        SyncType::Tasks,
        SyncType::Memos,
        SyncType::Contacts,
    ];

    /// Path segment used for this sync type inside the DecSync directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Calendars => "calendars",
            SyncType::Tasks => "tasks",
            SyncType::Memos => "memos",
            SyncType::Contacts => "contacts",
        }
    }

    /// Human-readable name of a single collection of this type.
    pub fn title(&self) -> &'static str {
        match self {
            SyncType::Calendars => "calendar",
            SyncType::Tasks => "task list",
            SyncType::Memos => "memo list",
            SyncType::Contacts => "address book",
        }
    }

    /// Whether the local source mirrors the collection's `color` attribute.
    /// Address books have no color.
    pub fn mirrors_color(&self) -> bool {
        !matches!(self, SyncType::Contacts)
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!("Unknown sync type '{s}' (expected calendars, tasks, memos or contacts)")
            })
    }
}
