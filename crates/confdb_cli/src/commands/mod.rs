//! CLI command implementations.

pub mod alias;
pub mod compact;
pub mod inspect;
pub mod verify;

use confdb_core::{CoreResult, Database};
use std::path::Path;
use tracing::debug;

/// Opens an existing database file for reading. Commands never create
/// one, and only `compact` ever writes.
pub fn open_existing(path: &Path) -> CoreResult<Database> {
    debug!(path = %path.display(), "opening database read-only");
    Database::open_read_only(path)
}
