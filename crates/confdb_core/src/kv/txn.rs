//! Read and write transactions.

use crate::journal::BucketOp;
use crate::kv::bucket::{Bucket, Snapshot};
use crate::types::SequenceNumber;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read access shared by both transaction kinds.
pub trait ReadView {
    /// Returns the named bucket, or `None` if nothing was ever written to it.
    fn bucket(&self, name: &str) -> Option<&Bucket>;

    /// Names of every bucket visible to this transaction, sorted.
    fn bucket_names(&self) -> Vec<String>;

    /// Reads one key.
    fn get(&self, bucket: &str, key: &[u8]) -> Option<&[u8]> {
        self.bucket(bucket)?.get(key)
    }

    /// Whether the key exists.
    fn contains(&self, bucket: &str, key: &[u8]) -> bool {
        self.bucket(bucket).is_some_and(|b| b.contains_key(key))
    }
}

/// A read-only transaction over one committed snapshot.
///
/// Commits that land while the transaction is open are not visible to it.
pub struct ReadTxn {
    snapshot: Arc<Snapshot>,
}

impl ReadTxn {
    pub(crate) fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    /// The commit this snapshot reflects.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.snapshot.sequence
    }
}

impl ReadView for ReadTxn {
    fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.snapshot.buckets.get(name).map(|b| &**b)
    }

    fn bucket_names(&self) -> Vec<String> {
        self.snapshot.buckets.keys().cloned().collect()
    }
}

/// A read-write transaction.
///
/// Buckets are copied on first write; reads see the transaction's own
/// writes. Dropping the transaction without committing discards
/// everything.
pub struct WriteTxn {
    base: Arc<Snapshot>,
    dirty: BTreeMap<String, Bucket>,
    ops: Vec<BucketOp>,
}

impl WriteTxn {
    pub(crate) fn new(base: Arc<Snapshot>) -> Self {
        Self {
            base,
            dirty: BTreeMap::new(),
            ops: Vec::new(),
        }
    }

    fn bucket_mut(&mut self, name: &str) -> &mut Bucket {
        let base = &self.base;
        self.dirty.entry(name.to_owned()).or_insert_with(|| {
            base.buckets
                .get(name)
                .map(|b| (**b).clone())
                .unwrap_or_default()
        })
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn put(&mut self, bucket: &str, key: Vec<u8>, value: Vec<u8>) {
        self.bucket_mut(bucket).put(key.clone(), value.clone());
        self.ops.push(BucketOp::Put {
            bucket: bucket.to_owned(),
            key,
            value,
        });
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&mut self, bucket: &str, key: &[u8]) -> bool {
        if !self.contains(bucket, key) {
            return false;
        }
        self.bucket_mut(bucket).delete(key);
        self.ops.push(BucketOp::Delete {
            bucket: bucket.to_owned(),
            key: key.to_vec(),
        });
        true
    }

    /// Bumps the bucket's auto-increment counter and returns the new value.
    ///
    /// Deleting the records it numbered never lowers the counter, so values
    /// are not reused.
    pub fn next_sequence(&mut self, bucket: &str) -> u64 {
        let target = self.bucket_mut(bucket);
        let value = target.sequence() + 1;
        target.set_sequence(value);
        self.ops.push(BucketOp::SetSequence {
            bucket: bucket.to_owned(),
            value,
        });
        value
    }

    /// The commit this transaction started from.
    #[must_use]
    pub fn base_sequence(&self) -> SequenceNumber {
        self.base.sequence
    }

    /// Whether the transaction has written anything.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.ops.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Arc<Snapshot>, BTreeMap<String, Bucket>, Vec<BucketOp>) {
        (self.base, self.dirty, self.ops)
    }
}

impl ReadView for WriteTxn {
    fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.dirty
            .get(name)
            .or_else(|| self.base.buckets.get(name).map(|b| &**b))
    }

    fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .base
            .buckets
            .keys()
            .chain(self.dirty.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_txn() -> WriteTxn {
        WriteTxn::new(Arc::new(Snapshot::default()))
    }

    #[test]
    fn writes_are_visible_inside_the_transaction() {
        let mut txn = empty_txn();
        txn.put("integration_0000000001", vec![1], b"hook".to_vec());

        assert_eq!(txn.get("integration_0000000001", &[1]), Some(&b"hook"[..]));
        assert!(txn.is_dirty());
        assert_eq!(txn.bucket_names(), vec!["integration_0000000001".to_string()]);
    }

    #[test]
    fn deleting_absent_key_records_nothing() {
        let mut txn = empty_txn();
        assert!(!txn.delete("integration_0000000001", &[1]));
        assert!(!txn.is_dirty());
    }

    #[test]
    fn sequence_increments_per_bucket() {
        let mut txn = empty_txn();
        assert_eq!(txn.next_sequence("a"), 1);
        assert_eq!(txn.next_sequence("a"), 2);
        assert_eq!(txn.next_sequence("b"), 1);
    }

    #[test]
    fn base_snapshot_is_untouched() {
        let base = Arc::new(Snapshot::default());
        let mut txn = WriteTxn::new(Arc::clone(&base));
        txn.put("a", vec![1], vec![2]);

        assert!(ReadTxn::new(base).bucket("a").is_none());
    }
}
