//! # ConfDB Core
//!
//! Multi-tenant object store for integration configuration.
//!
//! This crate provides:
//! - A single-file, journaled key-value engine with named buckets
//! - Per-project bucket partitioning with a shared global scope
//! - A generic object store with auto-increment and natural keys
//! - Child back-reference resolution for cascading deletes
//! - A global alias index kept consistent with per-project alias records
//!
//! ## Example
//!
//! ```rust,ignore
//! use confdb_core::{Database, Integration, IntegrationAlias, IntegrationRef, ProjectId};
//!
//! let db = Database::open_in_memory()?;
//! let project = ProjectId::new(1);
//!
//! let hook = db.create_integration(Integration {
//!     project_id: project,
//!     name: "deploy".into(),
//!     ..Integration::default()
//! })?;
//!
//! db.create_integration_alias(IntegrationAlias::new(
//!     project,
//!     IntegrationRef::Specific(hook.id),
//!     "deploy-prod",
//! ))?;
//!
//! let owner = db.get_integration_alias_by_alias("deploy-prod")?;
//! assert_eq!(owner.project_id, project);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alias_index;
mod config;
mod database;
mod error;
pub mod journal;
pub mod kv;
pub mod model;
pub mod object;
pub mod partition;
pub mod referrer;
mod types;

pub use alias_index::AliasIndex;
pub use config::{AliasWriteMode, Config};
pub use database::Database;
pub use error::{CoreError, CoreResult, ValidationError};
pub use kv::{BucketStats, CompactStats, Engine, ReadTxn, ReadView, WriteTxn};
pub use model::{
    AliasIndexEntry, BodyDataType, ExtractValueSource, Integration, IntegrationAlias,
    IntegrationAuthMethod, IntegrationExtractValue, IntegrationMatcher, IntegrationRef,
    MatchMethod, MatchType, VariableType,
};
pub use object::{KeyStrategy, ObjectStore, Record, RetrieveQueryParams, SortDirection, Validate};
pub use partition::{bucket_name, parse_bucket_name};
pub use referrer::{IntegrationReferrers, ObjectReferrer};
pub use types::{ObjectKey, ProjectId, Scope, SequenceNumber};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
