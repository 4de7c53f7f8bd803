//! Generic, schema-less object storage.
//!
//! Record types describe themselves through [`Record`]; the store maps them
//! onto buckets named by [`crate::partition`].

mod query;
mod record;
mod store;

pub use query::{RetrieveQueryParams, SortDirection};
pub use record::{KeyStrategy, Record, Validate};
pub use store::ObjectStore;
