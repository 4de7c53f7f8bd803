//! Journal writer and replay.

use crate::error::{CoreError, CoreResult};
use crate::journal::record::{decode_frame, CommitRecord, FrameRead};
use confdb_storage::StorageBackend;
use tracing::{error, info, warn};

/// The append-only commit journal backing a database.
///
/// The journal is the database file: replaying it from the start rebuilds
/// every bucket.
///
/// If a failed append cannot be cut back off the file, the journal is
/// poisoned: the frame on disk may replay as a commit the caller was told
/// had failed, and a later frame would reuse its sequence number. Every
/// further append is refused until the database is reopened or compacted.
pub struct Journal {
    backend: Box<dyn StorageBackend>,
    sync_on_commit: bool,
    read_only: bool,
    poisoned: bool,
    torn_tail: u64,
}

impl Journal {
    /// Wraps a storage backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend,
            sync_on_commit,
            read_only: false,
            poisoned: false,
            torn_tail: 0,
        }
    }

    /// Wraps a backend that is only ever read. Replay leaves a torn tail in
    /// place and appends are refused.
    pub fn read_only(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            read_only: true,
            ..Self::new(backend, false)
        }
    }

    /// Reads every committed record in order.
    ///
    /// A frame cut short at the end of the file is a commit that never
    /// finished; it is trimmed so the next append starts on a frame
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::JournalCorruption`] for a complete frame that
    /// fails its checks or is out of sequence order.
    pub fn replay(&mut self) -> CoreResult<Vec<CommitRecord>> {
        let bytes = self.backend.read_all()?;
        let mut records: Vec<CommitRecord> = Vec::new();
        let mut pos = 0usize;

        while pos < bytes.len() {
            match decode_frame(&bytes[pos..], pos as u64)? {
                FrameRead::Frame(record, len) => {
                    if let Some(last) = records.last() {
                        if record.sequence <= last.sequence {
                            return Err(CoreError::journal_corruption(
                                pos as u64,
                                format!("{} follows {}", record.sequence, last.sequence),
                            ));
                        }
                    }
                    records.push(record);
                    pos += len;
                }
                FrameRead::Torn => {
                    let torn = (bytes.len() - pos) as u64;
                    if self.read_only {
                        warn!(offset = pos, bytes = torn, "ignoring torn journal tail");
                        self.torn_tail = torn;
                    } else {
                        warn!(offset = pos, discarded = torn, "trimming torn journal tail");
                        self.backend.truncate(pos as u64)?;
                    }
                    break;
                }
            }
        }

        info!(commits = records.len(), bytes = pos, "journal replayed");
        Ok(records)
    }

    /// Appends a commit and makes it durable.
    ///
    /// If the frame cannot be fully written and flushed, the journal is cut
    /// back to its previous size so a later replay never sees the commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] without writing anything if
    /// the journal is read-only or poisoned.
    pub fn append(&mut self, record: &CommitRecord) -> CoreResult<u64> {
        if self.read_only {
            return Err(CoreError::invalid_operation("database is open read-only"));
        }
        if self.poisoned {
            return Err(CoreError::invalid_operation(
                "journal holds an unrolled-back frame; reopen the database",
            ));
        }

        let frame = record.encode_frame()?;
        let mark = self.backend.size()?;

        match self.write_frame(&frame) {
            Ok(offset) => Ok(offset),
            Err(err) => {
                if let Err(rollback) = self.backend.truncate(mark) {
                    self.poisoned = true;
                    error!(
                        sequence = record.sequence.as_u64(),
                        error = %rollback,
                        "could not roll back failed journal append, refusing further writes"
                    );
                }
                Err(err)
            }
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> CoreResult<u64> {
        let offset = self.backend.append(frame)?;
        self.backend.flush()?;
        if self.sync_on_commit {
            self.backend.sync()?;
        }
        Ok(offset)
    }

    /// Returns the journal size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Whether appends are refused because the backend is read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether a failed append could not be rolled back.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Bytes of an incomplete trailing frame left in place by a read-only
    /// replay.
    #[must_use]
    pub fn torn_tail(&self) -> u64 {
        self.torn_tail
    }

    /// Swaps in a backend holding a rewritten journal.
    ///
    /// The old backend is dropped, releasing its file lock.
    pub fn replace_backend(&mut self, backend: Box<dyn StorageBackend>) {
        self.backend = backend;
        self.poisoned = false;
        self.torn_tail = 0;
    }
}
