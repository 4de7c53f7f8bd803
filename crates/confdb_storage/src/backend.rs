//! The storage backend trait.

use crate::error::StorageResult;

/// An append-only byte store holding one database journal.
///
/// Backends never interpret the bytes they hold. The journal writer in
/// `confdb_core` appends whole commit frames and, when a commit cannot be
/// made durable, truncates back to the size it observed before the append.
///
/// # Invariants
///
/// - `append` returns the offset the data starts at, which equals the
///   previous `size()`
/// - `read_at` returns exactly the bytes previously appended at that offset
/// - after `flush` returns, appended data survives process exit
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range is not
    /// fully inside the stored data, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data at the end and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes, i.e. the next append offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces data and metadata to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Discards everything after `new_size`.
    ///
    /// Used to drop a torn trailing frame found during replay and to roll
    /// back a commit frame whose append or flush failed.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` exceeds the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads the whole store into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be read or the read fails.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let len = usize::try_from(size).map_err(|_| {
            crate::StorageError::Corrupted(format!("store of {size} bytes does not fit in memory"))
        })?;
        self.read_at(0, len)
    }
}
