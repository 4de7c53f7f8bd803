//! # ConfDB Storage
//!
//! Byte-level storage for the ConfDB journal.
//!
//! A ConfDB database lives in a single file. This crate owns nothing but
//! that file's bytes: the journal framing, buckets and records are all
//! interpreted one layer up in `confdb_core`.
//!
//! ## Backends
//!
//! - [`FileBackend`] - the database file, held under an exclusive advisory lock
//! - [`InMemoryBackend`] - ephemeral databases and tests
//!
//! ## Example
//!
//! ```rust
//! use confdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"frame").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
