//! Core type definitions for ConfDB.

use confdb_codec::{decode_int_key, decode_str_key, encode_int_key, encode_str_key, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a project (tenant).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProjectId(pub u64);

impl ProjectId {
    /// Creates a new project ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project:{}", self.0)
    }
}

/// The partition a record lives in.
///
/// `Global` is an ordinary partition holding cross-project indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Records owned by one project.
    Project(ProjectId),
    /// The cross-project partition.
    Global,
}

impl From<ProjectId> for Scope {
    fn from(project: ProjectId) -> Self {
        Self::Project(project)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => id.fmt(f),
            Self::Global => f.write_str("global"),
        }
    }
}

/// A primary key inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKey {
    /// Auto-assigned integer key.
    Int(u64),
    /// Caller-supplied natural key.
    Str(String),
}

impl ObjectKey {
    /// Returns the order-preserving byte form stored in the bucket.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Int(id) => encode_int_key(*id),
            Self::Str(key) => encode_str_key(key),
        }
    }

    /// Decodes an integer key.
    pub fn decode_int(bytes: &[u8]) -> CodecResult<Self> {
        decode_int_key(bytes).map(Self::Int)
    }

    /// Decodes a natural key.
    pub fn decode_str(bytes: &[u8]) -> CodecResult<Self> {
        decode_str_key(bytes).map(Self::Str)
    }
}

impl From<u64> for ObjectKey {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self::Str(key.to_owned())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "#{id}"),
            Self::Str(key) => write!(f, "{key:?}"),
        }
    }
}

/// Commit sequence number.
///
/// Every committed write transaction gets the next number; replay applies
/// commits in this order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}
