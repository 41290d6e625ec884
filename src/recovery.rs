//! Recovery Procedure
//!
//! Rebuilds the mapping on startup from the snapshot and the WAL tail.
//!
//! ```text
//!   Init ──► LoadSnapshot ──► LoadCheckpoint ──► ReplayWal ──► Ready
//!    │            │                 │                 │
//!    │            │                 │                 └─ seek, apply, stop at
//!    │            │                 │                    first torn record,
//!    │            │                 │                    trim the torn tail
//!    │            │                 └─ missing/corrupt → offset 0
//!    │            └─ absent → write {}; unparsable → fatal
//!    └─ drop leftover *.tmp files
//! ```

use std::fmt;

use tracing::{debug, info, warn};

use crate::codec::Mapping;
use crate::config::{Config, StorePaths};
use crate::error::Result;
use crate::storage::{self, CheckpointLoad, CheckpointTracker, SnapshotWriter};
use crate::wal::WalRecovery;

/// Recovery phases, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecoveryPhase {
    Init,
    LoadSnapshot,
    LoadCheckpoint,
    ReplayWal,
    Ready,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryPhase::Init => "init",
            RecoveryPhase::LoadSnapshot => "load-snapshot",
            RecoveryPhase::LoadCheckpoint => "load-checkpoint",
            RecoveryPhase::ReplayWal => "replay-wal",
            RecoveryPhase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// What recovery found and did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Leftover temp files deleted during `Init`
    pub stale_temp_files_removed: usize,

    /// The main file was absent and an empty snapshot was written
    pub snapshot_created: bool,

    /// Keys in the snapshot before replay
    pub snapshot_keys: usize,

    /// State of the checkpoint file
    pub checkpoint: CheckpointLoad,

    /// Whether a WAL file existed
    pub wal_present: bool,

    /// Offset replay actually started from
    pub start_offset: u64,

    /// The checkpoint offset exceeded the WAL length and was reset to 0
    pub offset_clamped: bool,

    /// Records applied from the WAL
    pub records_replayed: u64,

    /// WAL length after trimming any torn tail
    pub wal_valid_len: u64,

    /// Bytes of torn or corrupt WAL tail that were discarded
    pub discarded_bytes: u64,
}

impl Default for RecoveryReport {
    fn default() -> Self {
        Self {
            stale_temp_files_removed: 0,
            snapshot_created: false,
            snapshot_keys: 0,
            checkpoint: CheckpointLoad::Missing,
            wal_present: false,
            start_offset: 0,
            offset_clamped: false,
            records_replayed: 0,
            wal_valid_len: 0,
            discarded_bytes: 0,
        }
    }
}

/// Output of a completed recovery
#[derive(Debug)]
pub struct Recovered {
    pub mapping: Mapping,
    pub report: RecoveryReport,
}

/// Runs the startup state machine
pub struct Recovery<'a> {
    paths: &'a StorePaths,
    config: &'a Config,
    phase: RecoveryPhase,
    mapping: Mapping,
    report: RecoveryReport,
}

impl<'a> Recovery<'a> {
    pub fn new(paths: &'a StorePaths, config: &'a Config) -> Self {
        Self {
            paths,
            config,
            phase: RecoveryPhase::Init,
            mapping: Mapping::new(),
            report: RecoveryReport::default(),
        }
    }

    /// Drive every phase to `Ready`
    ///
    /// Only a corrupt main file or an I/O error stops recovery.
    pub fn run(mut self) -> Result<Recovered> {
        self.clear_temp_files();

        self.advance(RecoveryPhase::LoadSnapshot);
        self.load_snapshot()?;

        self.advance(RecoveryPhase::LoadCheckpoint);
        self.load_checkpoint();

        self.advance(RecoveryPhase::ReplayWal);
        self.replay_wal()?;

        self.advance(RecoveryPhase::Ready);

        info!(
            keys = self.mapping.len(),
            snapshot_keys = self.report.snapshot_keys,
            start_offset = self.report.start_offset,
            replayed = self.report.records_replayed,
            discarded_bytes = self.report.discarded_bytes,
            "Recovery complete"
        );

        Ok(Recovered {
            mapping: self.mapping,
            report: self.report,
        })
    }

    fn advance(&mut self, next: RecoveryPhase) {
        debug_assert!(next > self.phase, "recovery phases only move forward");
        debug!(from = %self.phase, to = %next, "Recovery phase");
        self.phase = next;
    }

    fn clear_temp_files(&mut self) {
        for path in [&self.paths.data_file, &self.paths.checkpoint_file] {
            if storage::remove_stale_temp(path) {
                self.report.stale_temp_files_removed += 1;
            }
        }
    }

    fn load_snapshot(&mut self) -> Result<()> {
        let writer = SnapshotWriter::new(&self.paths.data_file, self.config.sync_directory);
        let (mapping, created) = writer.load_or_init()?;

        self.report.snapshot_created = created;
        self.report.snapshot_keys = mapping.len();
        self.mapping = mapping;
        Ok(())
    }

    fn load_checkpoint(&mut self) {
        self.report.checkpoint = CheckpointTracker::load(&self.paths.checkpoint_file);
    }

    fn replay_wal(&mut self) -> Result<()> {
        let wal_path = &self.paths.wal_file;
        let recorded = self.report.checkpoint.offset();

        if !wal_path.exists() {
            self.report.offset_clamped = recorded > 0;
            debug!(path = %wal_path.display(), "No WAL; skipping replay");
            return Ok(());
        }
        self.report.wal_present = true;

        let wal_len = std::fs::metadata(wal_path)?.len();
        let start = if recorded > wal_len {
            warn!(
                recorded,
                wal_len, "Checkpoint offset beyond end of WAL; replaying from start"
            );
            self.report.offset_clamped = true;
            0
        } else {
            recorded
        };
        self.report.start_offset = start;

        let replay = WalRecovery::replay(wal_path, start, &mut self.mapping)?;
        self.report.records_replayed = replay.records_applied;
        self.report.wal_valid_len = replay.valid_len;
        self.report.discarded_bytes = replay.discarded_bytes();

        if replay.discarded_bytes() > 0 {
            warn!(
                path = %wal_path.display(),
                valid_len = replay.valid_len,
                discarded = replay.discarded_bytes(),
                "Trimming torn WAL tail"
            );
            WalRecovery::truncate(wal_path, replay.valid_len)?;
        }

        Ok(())
    }
}
