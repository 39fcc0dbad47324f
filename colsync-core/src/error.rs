//! Error types for colsync.

use thiserror::Error;

use crate::store::RootStatus;

/// Errors that can occur in colsync operations.
#[derive(Error, Debug)]
pub enum ColSyncError {
    #[error("{0}")]
    RootIncompatible(RootStatus),

    #[error("Store access error: {0}")]
    StoreAccess(String),

    #[error("Collection '{0}' does not exist or was deleted")]
    CollectionNotFound(String),

    #[error("'{0}' is not a valid collection or application id")]
    InvalidId(String),

    #[error("Collection name must not be empty")]
    InvalidName,

    #[error("Source '{0}' needs both a directory and a collection")]
    Incomplete(String),

    #[error("The directory of source '{0}' can no longer be changed")]
    Locked(String),

    #[error("No configuration session for source '{0}'")]
    SessionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for colsync operations.
pub type ColSyncResult<T> = Result<T, ColSyncError>;
