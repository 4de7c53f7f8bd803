//! Journal commit records and frame layout.
//!
//! ```text
//! +-------+---------+-------------+------------------+-------+
//! | magic | version | payload len | payload (CBOR)   | crc32 |
//! | 4     | 2 (LE)  | 4 (LE)      | len              | 4 (LE)|
//! +-------+---------+-------------+------------------+-------+
//! ```
//!
//! The CRC covers everything before it.

use crate::error::{CoreError, CoreResult};
use crate::types::SequenceNumber;
use confdb_codec::{from_cbor, to_cbor};
use serde::{Deserialize, Serialize};

/// Magic bytes opening every frame.
pub const FRAME_MAGIC: [u8; 4] = *b"CFDB";

/// Current frame format version.
pub const FRAME_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
pub const HEADER_SIZE: usize = 10;

/// CRC trailer size.
pub const CRC_SIZE: usize = 4;

/// One mutation of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketOp {
    /// Insert or overwrite a key.
    Put {
        /// Bucket name.
        bucket: String,
        /// Encoded key.
        key: Vec<u8>,
        /// Encoded record.
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// Bucket name.
        bucket: String,
        /// Encoded key.
        key: Vec<u8>,
    },
    /// Set the bucket's auto-increment counter.
    SetSequence {
        /// Bucket name.
        bucket: String,
        /// New counter value.
        value: u64,
    },
}

impl BucketOp {
    /// Returns the bucket this operation touches.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Put { bucket, .. } | Self::Delete { bucket, .. } | Self::SetSequence { bucket, .. } => {
                bucket
            }
        }
    }
}

/// Everything one write transaction changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit order.
    pub sequence: SequenceNumber,
    /// Mutations, in the order they were made.
    pub ops: Vec<BucketOp>,
}

impl CommitRecord {
    /// Encodes the record into a complete frame.
    pub fn encode_frame(&self) -> CoreResult<Vec<u8>> {
        let payload = to_cbor(self)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| CoreError::invalid_operation("commit record exceeds 4 GiB"))?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        frame.extend_from_slice(&FRAME_MAGIC);
        frame.extend_from_slice(&FRAME_VERSION.to_le_bytes());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&payload);

        let crc = compute_crc32(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());
        Ok(frame)
    }
}

/// Outcome of decoding one frame from a byte buffer.
#[derive(Debug)]
pub enum FrameRead {
    /// A complete, valid frame and its total length.
    Frame(CommitRecord, usize),
    /// The buffer ends in the middle of a frame.
    Torn,
}

/// Decodes the frame at the start of `buf`. `offset` is only used for
/// error reporting.
pub fn decode_frame(buf: &[u8], offset: u64) -> CoreResult<FrameRead> {
    if buf.len() < HEADER_SIZE {
        return Ok(FrameRead::Torn);
    }

    if buf[0..4] != FRAME_MAGIC {
        return Err(CoreError::journal_corruption(offset, "bad frame magic"));
    }

    let version = u16::from_le_bytes([buf[4], buf[5]]);
    if version != FRAME_VERSION {
        return Err(CoreError::invalid_format(format!(
            "unsupported journal version {version}, expected {FRAME_VERSION}"
        )));
    }

    let len = u32::from_le_bytes([buf[6], buf[7], buf[8], buf[9]]) as usize;
    let total = HEADER_SIZE + len + CRC_SIZE;
    if buf.len() < total {
        return Ok(FrameRead::Torn);
    }

    let body_end = HEADER_SIZE + len;
    let expected = u32::from_le_bytes([
        buf[body_end],
        buf[body_end + 1],
        buf[body_end + 2],
        buf[body_end + 3],
    ]);
    let actual = compute_crc32(&buf[..body_end]);
    if expected != actual {
        return Err(CoreError::journal_corruption(
            offset,
            format!("checksum mismatch: expected {expected:08x}, got {actual:08x}"),
        ));
    }

    let record = from_cbor(&buf[HEADER_SIZE..body_end])?;
    Ok(FrameRead::Frame(record, total))
}

/// Computes the IEEE CRC32 of `data`.
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
