//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a [`crate::StorageBackend`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// Attempted to truncate to a size larger than the stored data.
    #[error("cannot truncate to {requested} bytes, store holds {size}")]
    TruncatePastEnd {
        /// The requested size.
        requested: u64,
        /// The current storage size.
        size: u64,
    },

    /// Another process holds the database file.
    #[error("database file is locked by another process: {path}")]
    Locked {
        /// Path of the locked file.
        path: String,
    },

    /// The backend was opened read-only.
    #[error("database file is open read-only: {path}")]
    ReadOnly {
        /// Path of the file.
        path: String,
    },

    /// The stored bytes are unusable.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
