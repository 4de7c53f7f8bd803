//! # ConfDB Testkit
//!
//! Test utilities for ConfDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A storage backend with injectable append and flush failures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         let hook = db.create_integration(integration(ProjectId::new(1), "deploy")).unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
