//! Checkpoint Tracker
//!
//! Counts mutations since the last checkpoint and persists the WAL offset
//! the latest snapshot covers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::{self, Checkpoint};
use crate::error::Result;

use super::atomic::write_atomic;

/// What was found in the checkpoint file at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointLoad {
    /// Parsed successfully
    Loaded(u64),

    /// No checkpoint file
    Missing,

    /// Present but unreadable or wrong shape; treated as offset 0
    Corrupt(String),
}

impl CheckpointLoad {
    /// Offset to start replay from (0 unless loaded)
    pub fn offset(&self) -> u64 {
        match self {
            CheckpointLoad::Loaded(offset) => *offset,
            CheckpointLoad::Missing | CheckpointLoad::Corrupt(_) => 0,
        }
    }
}

/// Tracks mutations since the last checkpoint and writes checkpoint files
#[derive(Debug)]
pub struct CheckpointTracker {
    path: PathBuf,
    every: usize,
    sync_directory: bool,

    /// Mutations since the last checkpoint (never persisted)
    ops_since: usize,

    /// Offset recorded by the last checkpoint (or reconciled at recovery)
    offset: u64,

    /// Checkpoints written by this tracker
    taken: u64,
}

impl CheckpointTracker {
    /// `offset` is the reconciled offset recovery started replay from
    pub fn new(path: &Path, every: usize, sync_directory: bool, offset: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            every,
            sync_directory,
            ops_since: 0,
            offset,
            taken: 0,
        }
    }

    /// Read the checkpoint file; never fails
    pub fn load(path: &Path) -> CheckpointLoad {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return CheckpointLoad::Missing,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable checkpoint; replaying full WAL");
                return CheckpointLoad::Corrupt(e.to_string());
            }
        };

        match codec::decode_checkpoint(&bytes) {
            Ok(checkpoint) => CheckpointLoad::Loaded(checkpoint.wal_offset),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt checkpoint; replaying full WAL");
                CheckpointLoad::Corrupt(e.to_string())
            }
        }
    }

    /// Count one mutation; returns true when a checkpoint is due
    pub fn note_mutation(&mut self) -> bool {
        self.ops_since += 1;
        self.is_due()
    }

    pub fn is_due(&self) -> bool {
        self.every > 0 && self.ops_since >= self.every
    }

    /// Persist `wal_offset` and reset the counter
    ///
    /// Must be called after the snapshot covering `wal_offset` is durable.
    /// The counter is left untouched if the write fails.
    pub fn record(&mut self, wal_offset: u64) -> Result<()> {
        debug_assert!(wal_offset >= self.offset, "checkpoint offset went backwards");

        let bytes = codec::encode_checkpoint(&Checkpoint { wal_offset })?;
        write_atomic(&self.path, &bytes, self.sync_directory)?;

        self.offset = wal_offset;
        self.ops_since = 0;
        self.taken += 1;

        debug!(path = %self.path.display(), wal_offset, "Checkpoint recorded");
        Ok(())
    }

    pub fn ops_since(&self) -> usize {
        self.ops_since
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn taken(&self) -> u64 {
        self.taken
    }
}
