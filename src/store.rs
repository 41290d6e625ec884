//! Store Module
//!
//! The public key-value store that coordinates all components.
//!
//! ## Responsibilities
//! - Run recovery on open
//! - Log every mutation to the WAL before applying it
//! - Trigger snapshot + checkpoint every `checkpoint_every` mutations
//! - Serialize all operations behind one lock

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::{LogRecord, Mapping, Value};
use crate::config::{Config, StorePaths};
use crate::error::Result;
use crate::recovery::{Recovery, RecoveryReport};
use crate::storage::{CheckpointTracker, SnapshotWriter};
use crate::wal::WalWriter;

/// A durable key-value store
///
/// ## Concurrency Model: one coarse lock
///
/// Every operation, reads included, runs under `inner`. A `get` therefore
/// never sees a mutation whose WAL record is not yet fsynced, and writers
/// pay for each other's fsync latency.
///
/// ## Durability
///
/// - `put`/`delete` return only after their WAL record is fsynced
/// - The main data file is only replaced atomically
/// - The checkpoint offset is read after the snapshot is durable
pub struct Store {
    paths: StorePaths,
    config: Config,
    report: RecoveryReport,
    inner: Mutex<StoreInner>,
}

/// State guarded by the store lock
struct StoreInner {
    mapping: Mapping,
    wal: WalWriter,
    snapshot: SnapshotWriter,
    tracker: CheckpointTracker,
}

/// Point-in-time counters for a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Keys currently in the mapping
    pub keys: usize,

    /// Mutations since the last checkpoint
    pub ops_since_checkpoint: usize,

    /// Committed WAL length in bytes
    pub wal_len: u64,

    /// WAL offset covered by the last checkpoint
    pub checkpoint_offset: u64,

    /// Checkpoints written since open
    pub checkpoints_taken: u64,

    /// WAL records appended since open
    pub records_appended: u64,
}

impl Store {
    /// Open or create a store
    ///
    /// On startup:
    /// 1. Validate paths
    /// 2. Recover (snapshot → checkpoint → WAL replay)
    /// 3. Open the WAL for appending
    /// 4. Rewrite a stale checkpoint if its offset was beyond the WAL
    pub fn open(paths: StorePaths, config: Config) -> Result<Self> {
        paths.validate()?;

        let recovered = Recovery::new(&paths, &config).run()?;
        let report = recovered.report;

        let wal = WalWriter::open(&paths.wal_file, config.sync_directory)?;
        let snapshot = SnapshotWriter::new(&paths.data_file, config.sync_directory);
        let tracker = CheckpointTracker::new(
            &paths.checkpoint_file,
            config.checkpoint_every,
            config.sync_directory,
            report.start_offset,
        );

        let mut inner = StoreInner {
            mapping: recovered.mapping,
            wal,
            snapshot,
            tracker,
        };

        if report.offset_clamped {
            inner.checkpoint()?;
        }

        info!(
            data_file = %paths.data_file.display(),
            wal_file = %paths.wal_file.display(),
            keys = inner.mapping.len(),
            wal_len = inner.wal.len(),
            checkpoint_every = config.checkpoint_every,
            "Store opened"
        );

        Ok(Self {
            paths,
            config,
            report,
            inner: Mutex::new(inner),
        })
    }

    /// Open with default file names and config inside `dir`
    ///
    /// Creates `dir` if it does not exist.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Self::open(StorePaths::in_dir(dir), Config::default())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().mapping.get(key).cloned()
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire the store lock
    /// 2. Append + fsync a `put` record (mapping untouched on failure)
    /// 3. Apply to the mapping
    /// 4. Checkpoint if due
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let record = LogRecord::Put {
            key: key.into(),
            value: value.into(),
        };
        self.inner.lock().commit(record)
    }

    /// Delete a key
    ///
    /// The record is logged even if the key is absent.
    pub fn delete(&self, key: impl Into<String>) -> Result<()> {
        let record = LogRecord::Delete { key: key.into() };
        self.inner.lock().commit(record)
    }

    /// Snapshot and checkpoint now, regardless of the op counter
    pub fn checkpoint(&self) -> Result<()> {
        self.inner.lock().checkpoint()
    }

    /// Close the store
    ///
    /// Checkpoints any mutations not yet folded into the snapshot, syncs the
    /// WAL, and releases the file handle.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.into_inner();

        if inner.tracker.ops_since() > 0 {
            inner.checkpoint()?;
        }
        inner.wal.sync()?;

        info!(data_file = %self.paths.data_file.display(), "Store closed");
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().mapping.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().mapping.is_empty()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.lock();
        StoreStats {
            keys: inner.mapping.len(),
            ops_since_checkpoint: inner.tracker.ops_since(),
            wal_len: inner.wal.len(),
            checkpoint_offset: inner.tracker.offset(),
            checkpoints_taken: inner.tracker.taken(),
            records_appended: inner.wal.records_appended(),
        }
    }

    /// What recovery did when this store was opened
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.report
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl StoreInner {
    /// Log, apply, maybe checkpoint. Caller holds the store lock.
    ///
    /// The mutation is committed once the WAL append succeeds. A failed
    /// checkpoint after that point is logged and retried on the next
    /// mutation, since the op counter is only reset by a completed one.
    fn commit(&mut self, record: LogRecord) -> Result<()> {
        let wal_len = self.wal.append(&record)?;
        debug!(key = record.key(), wal_len, "WAL record committed");

        record.apply(&mut self.mapping);

        if self.tracker.note_mutation() {
            if let Err(e) = self.checkpoint() {
                warn!(
                    error = %e,
                    ops_since_checkpoint = self.tracker.ops_since(),
                    "Checkpoint failed; will retry after the next mutation"
                );
            }
        }
        Ok(())
    }

    /// Snapshot first, then read the WAL length. The reverse order could
    /// record an offset past records the snapshot does not contain.
    fn checkpoint(&mut self) -> Result<()> {
        self.snapshot.write(&self.mapping)?;
        let wal_offset = self.wal.len();
        self.tracker.record(wal_offset)?;

        info!(
            keys = self.mapping.len(),
            wal_offset,
            "Checkpoint complete"
        );
        Ok(())
    }
}
