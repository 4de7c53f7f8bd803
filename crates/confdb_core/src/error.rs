//! Error types for ConfDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A record failed its validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// The offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors that can occur in ConfDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key is absent from the bucket.
    #[error("not found: {key} in bucket {bucket}")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// Display form of the missing key.
        key: String,
    },

    /// A natural key is already taken.
    #[error("conflict: {key} already exists in bucket {bucket}")]
    Conflict {
        /// Bucket holding the existing record.
        bucket: String,
        /// Display form of the colliding key.
        key: String,
    },

    /// The record was rejected by its validation rules.
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(#[from] confdb_storage::StorageError),

    /// Record or journal payload encoding failure.
    #[error("codec error: {0}")]
    Codec(#[from] confdb_codec::CodecError),

    /// A complete journal frame failed its integrity checks.
    #[error("journal corruption at offset {offset}: {message}")]
    JournalCorruption {
        /// Offset of the bad frame.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The database file is of an unknown format or version.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(bucket: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(bucket: impl Into<String>, key: impl ToString) -> Self {
        Self::Conflict {
            bucket: bucket.into(),
            key: key.to_string(),
        }
    }

    /// Creates a journal corruption error.
    pub fn journal_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`CoreError::Conflict`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
