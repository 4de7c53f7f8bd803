//! Database configuration.

/// How alias writes spanning the project bucket and the global index are
/// made atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasWriteMode {
    /// Both buckets are written in one engine transaction.
    #[default]
    Transactional,
    /// Each bucket is written in its own transaction. A failed global write
    /// is undone by deleting the project-scoped record again.
    Compensating,
}

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync the journal on every commit.
    pub sync_on_commit: bool,

    /// Alias index write strategy.
    pub alias_write_mode: AliasWriteMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            alias_write_mode: AliasWriteMode::Transactional,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the alias index write strategy.
    #[must_use]
    pub const fn alias_write_mode(mut self, mode: AliasWriteMode) -> Self {
        self.alias_write_mode = mode;
        self
    }
}
