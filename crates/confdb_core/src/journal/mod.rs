//! Commit journal.
//!
//! Each committed write transaction becomes one checksummed frame listing
//! its bucket operations. Frames are only ever appended; opening a
//! database replays them in order.

mod record;
mod writer;

pub use record::{compute_crc32, BucketOp, CommitRecord, FRAME_MAGIC, FRAME_VERSION};
pub use writer::Journal;
