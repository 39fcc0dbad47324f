//! Collection metadata for DecSync directories.
//!
//! This crate manages the collections (calendars, task lists, memo lists,
//! address books) stored in a shared DecSync directory:
//! - `directory` lists the collections of a compatible root
//! - `lifecycle` creates, renames and soft-deletes them
//! - `color` keeps a source's color in step with its collection
//! - `identity` provisions the application identity writes are attributed to
//! - `session` ties these together for sources being configured
//!
//! Storage goes through the [`store::SyncStore`] trait.

pub mod color;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod info;
pub mod lifecycle;
pub mod session;
pub mod source;
pub mod store;
pub mod sync_type;

pub use directory::{CollectionEntry, Directory};
pub use error::{ColSyncError, ColSyncResult};
pub use info::{Attribute, InfoStore};
pub use source::SourceConfig;
pub use sync_type::SyncType;
