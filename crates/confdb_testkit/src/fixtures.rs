//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use crate::faulty::{FaultHandle, FaultyBackend};
use confdb_core::{Config, Database, Integration, IntegrationMatcher, ProjectId};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DB_FILE: &str = "confdb.journal";

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    faults: Option<FaultHandle>,
    path: Option<PathBuf>,
    /// Kept alive to prevent cleanup.
    _temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self::memory_with_config(test_config())
    }

    /// Creates a new in-memory test database with custom configuration.
    pub fn memory_with_config(config: Config) -> Self {
        Self {
            db: Database::open_in_memory_with_config(config)
                .expect("Failed to open in-memory database"),
            faults: None,
            path: None,
            _temp_dir: None,
        }
    }

    /// Creates a new file-based test database in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(test_config())
    }

    /// Creates a new file-based test database with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(DB_FILE);
        let db = Database::open_with_config(&path, config).expect("Failed to open file database");

        Self {
            db,
            faults: None,
            path: Some(path),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory database whose storage fails on demand.
    pub fn faulty(config: Config) -> Self {
        let (backend, faults) = FaultyBackend::in_memory();
        Self {
            db: Database::open_with_backend(Box::new(backend), config)
                .expect("Failed to open faulty database"),
            faults: Some(faults),
            path: None,
            _temp_dir: None,
        }
    }

    /// The fault handle of a [`TestDatabase::faulty`] database.
    pub fn faults(&self) -> &FaultHandle {
        self.faults
            .as_ref()
            .expect("Only faulty test databases have a fault handle")
    }

    /// Returns the database path if file-based, None otherwise.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Closes a file-based database, releasing its lock, and hands back the
    /// directory holding the file. The file lives as long as the directory.
    pub fn close(self) -> TempDir {
        let Self { db, _temp_dir, .. } = self;
        drop(db);
        _temp_dir.expect("Only file databases can be closed")
    }

    /// Closes and reopens a file-based database, replaying its journal.
    pub fn reopen(self) -> Self {
        let Self {
            db,
            path,
            _temp_dir,
            ..
        } = self;
        let config = db.config().clone();
        drop(db);

        let path = path.expect("Only file databases can be reopened");
        let db = Database::open_with_config(&path, config).expect("Failed to reopen database");
        Self {
            db,
            faults: None,
            path: Some(path),
            _temp_dir,
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Default configuration for tests: no fsync.
pub fn test_config() -> Config {
    Config::default().sync_on_commit(false)
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust,ignore
/// use confdb_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         let hook = db.create_integration(integration(project, "deploy")).unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db
        .path()
        .expect("File database should have a path")
        .to_path_buf();
    f(&test_db.db, &path)
}

/// An unsaved integration with the given name.
pub fn integration(project: ProjectId, name: &str) -> Integration {
    Integration {
        project_id: project,
        name: name.to_string(),
        template_id: 1,
        ..Integration::default()
    }
}

/// An unsaved body matcher of `integration_id`.
pub fn matcher(integration_id: u64, name: &str) -> IntegrationMatcher {
    IntegrationMatcher {
        integration_id,
        name: name.to_string(),
        key: "ref".to_string(),
        value: "refs/heads/main".to_string(),
        ..IntegrationMatcher::default()
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates `count` integrations in each of `projects`, named
    /// `hook-<n>`. Ids run from 1 to `count` in every project.
    pub fn seed_integrations(db: &Database, projects: &[ProjectId], count: usize) {
        for &project in projects {
            for n in 1..=count {
                db.create_integration(integration(project, &format!("hook-{n}")))
                    .expect("Failed to seed integration");
            }
        }
    }
}
