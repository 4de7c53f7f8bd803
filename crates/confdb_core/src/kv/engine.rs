//! The bucketed key-value engine.

use crate::error::{CoreError, CoreResult};
use crate::journal::{BucketOp, CommitRecord, Journal};
use crate::kv::bucket::{apply_op, Buckets, Snapshot};
use crate::kv::txn::{ReadTxn, ReadView, WriteTxn};
use crate::types::SequenceNumber;
use confdb_storage::StorageBackend;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info};

/// Size and counter of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStats {
    /// Bucket name.
    pub name: String,
    /// Number of records.
    pub records: usize,
    /// Auto-increment counter.
    pub sequence: u64,
}

/// Outcome of [`Engine::compact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactStats {
    /// Commit sequence the rewritten journal ends at.
    pub sequence: SequenceNumber,
    /// Buckets carried over.
    pub buckets: usize,
    /// Records carried over.
    pub records: usize,
    /// Journal size before compaction.
    pub bytes_before: u64,
    /// Journal size after compaction.
    pub bytes_after: u64,
}

/// Single-writer, multi-reader key-value engine over named buckets.
///
/// - Writers are serialized by the journal lock; a write transaction sees
///   the latest committed state and nothing else can commit meanwhile.
/// - Readers take the current committed snapshot and never block writers.
/// - A commit is visible only after its journal frame is durable.
pub struct Engine {
    journal: Mutex<Journal>,
    committed: RwLock<Arc<Snapshot>>,
}

impl Engine {
    /// Opens an engine over `backend`, replaying its journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal is corrupt or unreadable.
    pub fn open(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> CoreResult<Self> {
        Self::from_journal(Journal::new(backend, sync_on_commit))
    }

    /// Opens an engine that never writes to `backend`.
    ///
    /// A torn journal tail is left in place and reported by
    /// [`Engine::torn_tail_bytes`]; every write transaction that changes
    /// something fails.
    pub fn open_read_only(backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        Self::from_journal(Journal::read_only(backend))
    }

    fn from_journal(mut journal: Journal) -> CoreResult<Self> {
        let records = journal.replay()?;

        let mut buckets = Buckets::new();
        let mut sequence = SequenceNumber::default();
        for record in &records {
            for op in &record.ops {
                apply_op(&mut buckets, op);
            }
            sequence = record.sequence;
        }

        info!(
            buckets = buckets.len(),
            sequence = sequence.as_u64(),
            "engine opened"
        );

        Ok(Self {
            journal: Mutex::new(journal),
            committed: RwLock::new(Arc::new(Snapshot { sequence, buckets })),
        })
    }

    /// Starts a read-only transaction on the latest committed snapshot.
    #[must_use]
    pub fn begin_read(&self) -> ReadTxn {
        ReadTxn::new(self.committed.read().clone())
    }

    /// Runs `f` in a read-only transaction.
    pub fn view<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&ReadTxn) -> CoreResult<R>,
    {
        let txn = self.begin_read();
        f(&txn)
    }

    /// Runs `f` in a read-write transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and is discarded if it
    /// returns `Err`. A failed commit leaves the committed state unchanged.
    pub fn update<F, R>(&self, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut WriteTxn) -> CoreResult<R>,
    {
        let mut journal = self.journal.lock();
        let base = self.committed.read().clone();
        let mut txn = WriteTxn::new(base);

        let result = f(&mut txn)?;
        if !txn.is_dirty() {
            return Ok(result);
        }

        let (base, dirty, ops) = txn.into_parts();
        let sequence = base.sequence.next();
        let op_count = ops.len();
        journal.append(&CommitRecord { sequence, ops })?;

        let mut buckets = base.buckets.clone();
        for (name, bucket) in dirty {
            buckets.insert(name, Arc::new(bucket));
        }
        *self.committed.write() = Arc::new(Snapshot { sequence, buckets });

        debug!(sequence = sequence.as_u64(), ops = op_count, "committed");
        Ok(result)
    }

    /// The sequence of the latest commit.
    #[must_use]
    pub fn committed_sequence(&self) -> SequenceNumber {
        self.committed.read().sequence
    }

    /// Per-bucket record counts and counters.
    #[must_use]
    pub fn stats(&self) -> Vec<BucketStats> {
        let txn = self.begin_read();
        txn.bucket_names()
            .into_iter()
            .filter_map(|name| {
                let bucket = txn.bucket(&name)?;
                Some(BucketStats {
                    records: bucket.len(),
                    sequence: bucket.sequence(),
                    name,
                })
            })
            .collect()
    }

    /// Size of the journal in bytes.
    pub fn journal_size(&self) -> CoreResult<u64> {
        self.journal.lock().size()
    }

    /// Whether the engine was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.journal.lock().is_read_only()
    }

    /// Whether writes are refused after a failed rollback.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.journal.lock().is_poisoned()
    }

    /// Bytes of incomplete trailing frame found by a read-only open.
    #[must_use]
    pub fn torn_tail_bytes(&self) -> u64 {
        self.journal.lock().torn_tail()
    }

    /// Rewrites the journal as a single frame holding the committed state.
    ///
    /// `write` receives the new journal bytes and returns a backend that
    /// durably holds exactly them; it replaces the current backend. Writers
    /// are blocked for the duration. If `write` fails the current journal
    /// stays in use.
    ///
    /// The frame carries the latest commit sequence and every bucket
    /// counter, so keys handed out before compaction are never reused.
    pub fn compact<F>(&self, write: F) -> CoreResult<CompactStats>
    where
        F: FnOnce(&[u8]) -> CoreResult<Box<dyn StorageBackend>>,
    {
        let mut journal = self.journal.lock();
        if journal.is_read_only() {
            return Err(CoreError::invalid_operation("database is open read-only"));
        }

        let snapshot = self.committed.read().clone();
        let mut ops = Vec::new();
        let mut records = 0;
        for (name, bucket) in &snapshot.buckets {
            if bucket.sequence() > 0 {
                ops.push(BucketOp::SetSequence {
                    bucket: name.clone(),
                    value: bucket.sequence(),
                });
            }
            for (key, value) in bucket.iter() {
                ops.push(BucketOp::Put {
                    bucket: name.clone(),
                    key: key.to_vec(),
                    value: value.to_vec(),
                });
                records += 1;
            }
        }

        let frame = if ops.is_empty() && snapshot.sequence == SequenceNumber::default() {
            Vec::new()
        } else {
            CommitRecord {
                sequence: snapshot.sequence,
                ops,
            }
            .encode_frame()?
        };

        let bytes_before = journal.size()?;
        let backend = write(&frame)?;
        journal.replace_backend(backend);

        let stats = CompactStats {
            sequence: snapshot.sequence,
            buckets: snapshot.buckets.len(),
            records,
            bytes_before,
            bytes_after: frame.len() as u64,
        };
        info!(
            sequence = stats.sequence.as_u64(),
            records = stats.records,
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            "journal compacted"
        );
        Ok(stats)
    }
}
