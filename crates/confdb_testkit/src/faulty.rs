//! Failure injection for storage backends.
//!
//! [`FaultyBackend`] wraps another backend and fails selected appends,
//! flushes or truncates. The failures are armed through a [`FaultHandle`],
//! which stays usable after the backend has been moved into a database.
//!
//! ```rust,ignore
//! let (backend, faults) = FaultyBackend::in_memory();
//! let db = Database::open_with_backend(Box::new(backend), Config::default())?;
//!
//! faults.fail_next_append();
//! assert!(db.delete_integration(project, id).is_err());
//! ```

use confdb_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct FaultState {
    /// Appends left until the failing one; `0` means disarmed.
    appends_until_failure: AtomicUsize,
    fail_next_flush: AtomicBool,
    fail_next_truncate: AtomicBool,
    appends: AtomicUsize,
    failures: AtomicUsize,
}

/// Arms failures on a [`FaultyBackend`].
#[derive(Debug, Clone, Default)]
pub struct FaultHandle(Arc<FaultState>);

impl FaultHandle {
    /// Fails the next append.
    pub fn fail_next_append(&self) {
        self.fail_nth_append(1);
    }

    /// Fails the `n`th append from now (1-based). `0` disarms.
    pub fn fail_nth_append(&self, n: usize) {
        self.0.appends_until_failure.store(n, Ordering::SeqCst);
    }

    /// Fails the next flush.
    pub fn fail_next_flush(&self) {
        self.0.fail_next_flush.store(true, Ordering::SeqCst);
    }

    /// Fails the next truncate, which is how the journal rolls back a
    /// failed append.
    pub fn fail_next_truncate(&self) {
        self.0.fail_next_truncate.store(true, Ordering::SeqCst);
    }

    /// Disarms every pending failure.
    pub fn reset(&self) {
        self.0.appends_until_failure.store(0, Ordering::SeqCst);
        self.0.fail_next_flush.store(false, Ordering::SeqCst);
        self.0.fail_next_truncate.store(false, Ordering::SeqCst);
    }

    /// Number of successful appends so far.
    pub fn appends(&self) -> usize {
        self.0.appends.load(Ordering::SeqCst)
    }

    /// Number of failures injected so far.
    pub fn failures(&self) -> usize {
        self.0.failures.load(Ordering::SeqCst)
    }

    fn take_append_failure(&self) -> bool {
        let state = &self.0;
        match state.appends_until_failure.load(Ordering::SeqCst) {
            0 => false,
            1 => {
                state.appends_until_failure.store(0, Ordering::SeqCst);
                true
            }
            n => {
                state.appends_until_failure.store(n - 1, Ordering::SeqCst);
                false
            }
        }
    }

    fn injected(&self, what: &str) -> StorageError {
        self.0.failures.fetch_add(1, Ordering::SeqCst);
        StorageError::Io(io::Error::other(format!("injected {what} failure")))
    }
}

/// A storage backend that fails on demand.
///
/// A failing append writes the first half of the data before returning
/// the error, like a write cut off by a full disk.
pub struct FaultyBackend {
    inner: Box<dyn StorageBackend>,
    faults: FaultHandle,
}

impl FaultyBackend {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn StorageBackend>) -> Self {
        Self {
            inner,
            faults: FaultHandle::default(),
        }
    }

    /// A faulty in-memory backend and its handle.
    pub fn in_memory() -> (Self, FaultHandle) {
        let backend = Self::new(Box::new(InMemoryBackend::new()));
        let handle = backend.handle();
        (backend, handle)
    }

    /// Returns a handle sharing this backend's fault state.
    pub fn handle(&self) -> FaultHandle {
        self.faults.clone()
    }
}

impl StorageBackend for FaultyBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if self.faults.take_append_failure() {
            let partial = &data[..data.len() / 2];
            if !partial.is_empty() {
                self.inner.append(partial)?;
            }
            return Err(self.faults.injected("append"));
        }
        let offset = self.inner.append(data)?;
        self.faults.0.appends.fetch_add(1, Ordering::SeqCst);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.faults.0.fail_next_flush.swap(false, Ordering::SeqCst) {
            return Err(self.faults.injected("flush"));
        }
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if self.faults.0.fail_next_truncate.swap(false, Ordering::SeqCst) {
            return Err(self.faults.injected("truncate"));
        }
        self.inner.truncate(new_size)
    }
}
