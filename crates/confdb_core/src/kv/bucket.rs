//! Buckets and committed snapshots.

use crate::journal::BucketOp;
use crate::types::SequenceNumber;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named, ordered key-value namespace.
///
/// Keys iterate in byte order. Each bucket carries its own auto-increment
/// counter, which only ever grows.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    sequence: u64,
}

impl Bucket {
    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bucket holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last value handed out by the auto-increment counter.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    pub(crate) fn delete(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    pub(crate) fn set_sequence(&mut self, value: u64) {
        self.sequence = self.sequence.max(value);
    }
}

pub(crate) type Buckets = BTreeMap<String, Arc<Bucket>>;

/// The committed state as of one commit sequence.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub(crate) sequence: SequenceNumber,
    pub(crate) buckets: Buckets,
}

/// Applies one replayed journal operation.
pub(crate) fn apply_op(buckets: &mut Buckets, op: &BucketOp) {
    let bucket = Arc::make_mut(buckets.entry(op.bucket().to_owned()).or_default());
    match op {
        BucketOp::Put { key, value, .. } => bucket.put(key.clone(), value.clone()),
        BucketOp::Delete { key, .. } => {
            bucket.delete(key);
        }
        BucketOp::SetSequence { value, .. } => bucket.set_sequence(*value),
    }
}
