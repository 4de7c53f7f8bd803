//! Embedded key-value engine.
//!
//! Named buckets of ordered byte keys, read through snapshot transactions
//! and written through serialized, journaled write transactions.

mod bucket;
mod engine;
mod txn;

pub use bucket::Bucket;
pub use engine::{BucketStats, CompactStats, Engine};
pub use txn::{ReadTxn, ReadView, WriteTxn};
