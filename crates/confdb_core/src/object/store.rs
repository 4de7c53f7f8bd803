//! Generic object store.

use crate::error::{CoreError, CoreResult};
use crate::kv::{Engine, ReadView, WriteTxn};
use crate::object::query::RetrieveQueryParams;
use crate::object::record::{KeyStrategy, Record};
use crate::partition::bucket_name;
use crate::types::{ObjectKey, Scope};
use confdb_codec::{from_cbor, to_cbor};
use std::sync::Arc;
use tracing::debug;

/// CRUD over any [`Record`] type, partitioned by [`Scope`].
///
/// Each plain method runs in its own engine transaction. The `*_in`
/// associated functions take a transaction instead, so callers can put
/// several mutations behind one commit:
///
/// ```rust,ignore
/// engine.update(|txn| {
///     let hook = ObjectStore::create_in(txn, scope, hook)?;
///     ObjectStore::delete_in::<Matcher>(txn, scope, &stale_key)?;
///     Ok(hook)
/// })?;
/// ```
#[derive(Clone)]
pub struct ObjectStore {
    engine: Arc<Engine>,
}

impl ObjectStore {
    /// Creates a store over `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Returns the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Inserts a record and returns it with its key assigned.
    pub fn create<R: Record>(&self, scope: Scope, record: R) -> CoreResult<R> {
        self.engine
            .update(|txn| Self::create_in(txn, scope, record))
    }

    /// Reads one record.
    pub fn get<R: Record>(&self, scope: Scope, key: &ObjectKey) -> CoreResult<R> {
        self.engine.view(|txn| Self::get_in(txn, scope, key))
    }

    /// Lists all records of the bucket, then sorts and pages them.
    pub fn get_all<R: Record>(
        &self,
        scope: Scope,
        params: &RetrieveQueryParams,
    ) -> CoreResult<Vec<R>> {
        self.get_all_where(scope, params, |_: &R| true)
    }

    /// Lists the records matching `filter`, then sorts and pages them.
    ///
    /// Filtering runs before paging, so offsets and limits count matching
    /// records only.
    pub fn get_all_where<R, F>(
        &self,
        scope: Scope,
        params: &RetrieveQueryParams,
        filter: F,
    ) -> CoreResult<Vec<R>>
    where
        R: Record,
        F: Fn(&R) -> bool,
    {
        let records = self.engine.view(|txn| Self::scan_in::<R, _>(txn, scope))?;
        params.apply(records.into_iter().filter(|r| filter(r)).collect())
    }

    /// Overwrites an existing record.
    pub fn update<R: Record>(&self, scope: Scope, record: &R) -> CoreResult<()> {
        self.engine.update(|txn| Self::update_in(txn, scope, record))
    }

    /// Deletes one record. Children are not touched.
    pub fn delete<R: Record>(&self, scope: Scope, key: &ObjectKey) -> CoreResult<()> {
        self.engine.update(|txn| Self::delete_in::<R>(txn, scope, key))
    }

    /// Inserts a record inside `txn`.
    ///
    /// Auto-increment types take the next value of the bucket counter;
    /// unique natural keys fail with [`CoreError::Conflict`] when taken.
    pub fn create_in<R: Record>(txn: &mut WriteTxn, scope: Scope, mut record: R) -> CoreResult<R> {
        let bucket = bucket_name(scope, R::TABLE);

        let key = match R::KEY_STRATEGY {
            KeyStrategy::AutoIncrement => {
                let id = txn.next_sequence(&bucket);
                record.assign_id(id);
                ObjectKey::Int(id)
            }
            KeyStrategy::Natural { unique } => {
                let key = record.key();
                if unique && txn.contains(&bucket, &key.encode()) {
                    return Err(CoreError::conflict(bucket, key));
                }
                key
            }
        };

        txn.put(&bucket, key.encode(), to_cbor(&record)?);
        debug!(bucket = %bucket, key = %key, "created");
        Ok(record)
    }

    /// Reads one record inside a transaction.
    pub fn get_in<R: Record, V: ReadView>(view: &V, scope: Scope, key: &ObjectKey) -> CoreResult<R> {
        Self::find_in(view, scope, key)?.ok_or_else(|| {
            CoreError::not_found(bucket_name(scope, R::TABLE), key)
        })
    }

    /// Reads one record, `None` if absent.
    pub fn find_in<R: Record, V: ReadView>(
        view: &V,
        scope: Scope,
        key: &ObjectKey,
    ) -> CoreResult<Option<R>> {
        let bucket = bucket_name(scope, R::TABLE);
        view.get(&bucket, &key.encode())
            .map(|bytes| from_cbor(bytes).map_err(CoreError::from))
            .transpose()
    }

    /// Decodes every record of the bucket in key order.
    pub fn scan_in<R: Record, V: ReadView>(view: &V, scope: Scope) -> CoreResult<Vec<R>> {
        let bucket = bucket_name(scope, R::TABLE);
        match view.bucket(&bucket) {
            Some(entries) => entries
                .iter()
                .map(|(_, bytes)| from_cbor(bytes).map_err(CoreError::from))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrites an existing record inside `txn`.
    pub fn update_in<R: Record>(txn: &mut WriteTxn, scope: Scope, record: &R) -> CoreResult<()> {
        let bucket = bucket_name(scope, R::TABLE);
        let key = record.key();
        let encoded = key.encode();

        if !txn.contains(&bucket, &encoded) {
            return Err(CoreError::not_found(bucket, key));
        }

        txn.put(&bucket, encoded, to_cbor(record)?);
        debug!(bucket = %bucket, key = %key, "updated");
        Ok(())
    }

    /// Deletes one record inside `txn`.
    pub fn delete_in<R: Record>(txn: &mut WriteTxn, scope: Scope, key: &ObjectKey) -> CoreResult<()> {
        let bucket = bucket_name(scope, R::TABLE);
        if !txn.delete(&bucket, &key.encode()) {
            return Err(CoreError::not_found(bucket, key));
        }
        debug!(bucket = %bucket, key = %key, "deleted");
        Ok(())
    }
}
