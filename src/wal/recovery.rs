//! WAL Recovery
//!
//! Replays the WAL tail onto a mapping and trims torn writes.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{debug, warn};

use crate::codec::Mapping;
use crate::error::Result;

use super::{WalRead, WalReader};

/// Replays WAL records after a crash
pub struct WalRecovery;

/// Result of a replay pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalReplay {
    /// Offset replay started from
    pub start_offset: u64,

    /// Number of records applied
    pub records_applied: u64,

    /// Offset just past the last valid record
    pub valid_len: u64,

    /// Physical file length when replay ran
    pub file_len: u64,

    /// Why replay stopped early, if it did
    pub stop_reason: Option<String>,
}

impl WalReplay {
    /// Bytes after the last valid record (torn or corrupt tail)
    pub fn discarded_bytes(&self) -> u64 {
        self.file_len.saturating_sub(self.valid_len)
    }
}

impl WalRecovery {
    /// Apply every valid record from `offset` onward to `mapping`
    ///
    /// Stops at the first malformed record; it and everything after it are
    /// left unapplied.
    pub fn replay(path: &Path, offset: u64, mapping: &mut Mapping) -> Result<WalReplay> {
        let file_len = std::fs::metadata(path)?.len();
        let mut reader = WalReader::open(path, offset)?;
        let mut records_applied = 0u64;
        let mut stop_reason = None;

        loop {
            match reader.next_record()? {
                WalRead::Record(record) => {
                    record.apply(mapping);
                    records_applied += 1;
                }
                WalRead::End => break,
                WalRead::Malformed { offset, reason } => {
                    warn!(
                        path = %path.display(),
                        offset,
                        %reason,
                        "Malformed WAL record; discarding it and everything after it"
                    );
                    stop_reason = Some(reason);
                    break;
                }
            }
        }

        let replay = WalReplay {
            start_offset: offset,
            records_applied,
            valid_len: reader.position(),
            file_len,
            stop_reason,
        };

        debug!(
            path = %path.display(),
            start_offset = replay.start_offset,
            records = replay.records_applied,
            valid_len = replay.valid_len,
            file_len = replay.file_len,
            "WAL replay finished"
        );

        Ok(replay)
    }

    /// Cut the WAL back to `valid_len` and fsync it
    ///
    /// Appends after recovery then start on a record boundary instead of
    /// being glued onto a torn fragment.
    pub fn truncate(path: &Path, valid_len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid_len)?;
        file.sync_all()?;
        Ok(())
    }
}
