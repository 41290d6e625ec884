//! Record Codec
//!
//! JSON encodings for the three on-disk shapes:
//!
//! ```text
//! WAL line      {"action":"put","key":"A","value":1}\n
//!               {"action":"delete","key":"A"}\n
//! Snapshot      {"A":1,"B":{"nested":[true,null]}}
//! Checkpoint    {"wal_offset":128}
//! ```
//!
//! A WAL line is only a record if it ends in `\n` and the bytes before the
//! newline decode completely. Anything else is a torn write.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Stored value. The store never looks inside it.
pub type Value = serde_json::Value;

/// The authoritative key → value state
pub type Mapping = BTreeMap<String, Value>;

/// Terminator for a single WAL record
pub const RECORD_TERMINATOR: u8 = b'\n';

/// A single mutation in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum LogRecord {
    /// Bind `key` to `value`
    Put { key: String, value: Value },

    /// Remove `key` (logged even when the key is absent)
    Delete { key: String },
}

impl LogRecord {
    /// Key touched by this record
    pub fn key(&self) -> &str {
        match self {
            LogRecord::Put { key, .. } | LogRecord::Delete { key } => key.as_str(),
        }
    }

    /// Apply this record to `mapping`
    pub fn apply(self, mapping: &mut Mapping) {
        match self {
            LogRecord::Put { key, value } => {
                mapping.insert(key, value);
            }
            LogRecord::Delete { key } => {
                mapping.remove(&key);
            }
        }
    }
}

/// Checkpoint metadata: how much of the WAL the snapshot already covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub wal_offset: u64,
}

// =============================================================================
// WAL records
// =============================================================================

/// Encode a record as one newline-terminated line
pub fn encode_record(record: &LogRecord) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    {
        let mut writer = (&mut buf).writer();
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| LedgerError::Serialization(format!("WAL record: {}", e)))?;
    }
    buf.put_u8(RECORD_TERMINATOR);
    Ok(buf.freeze())
}

/// Decode one record from a line with its terminator already stripped
pub fn decode_record(line: &[u8]) -> std::result::Result<LogRecord, serde_json::Error> {
    serde_json::from_slice(line)
}

// =============================================================================
// Snapshots
// =============================================================================

pub fn encode_snapshot(mapping: &Mapping) -> Result<Vec<u8>> {
    serde_json::to_vec(mapping).map_err(|e| LedgerError::Serialization(format!("snapshot: {}", e)))
}

/// The whole input must be one JSON object; trailing bytes are an error
pub fn decode_snapshot(bytes: &[u8]) -> std::result::Result<Mapping, serde_json::Error> {
    serde_json::from_slice(bytes)
}

// =============================================================================
// Checkpoints
// =============================================================================

pub fn encode_checkpoint(checkpoint: &Checkpoint) -> Result<Vec<u8>> {
    serde_json::to_vec(checkpoint)
        .map_err(|e| LedgerError::Serialization(format!("checkpoint: {}", e)))
}

pub fn decode_checkpoint(bytes: &[u8]) -> std::result::Result<Checkpoint, serde_json::Error> {
    serde_json::from_slice(bytes)
}
