//! Storage Module
//!
//! Durable files that are replaced rather than appended to.
//!
//! ## Responsibilities
//! - Atomic replace: write temp, fsync, rename, fsync directory
//! - Snapshot of the full mapping in the main data file
//! - Checkpoint metadata recording how much WAL the snapshot covers
//!
//! ## Replace Sequence
//! ```text
//!   db.json.tmp  ◄── write + flush + fsync
//!        │
//!        │ rename (atomic)
//!        ▼
//!   db.json      ◄── readers see old or new, never partial
//!        │
//!        ▼
//!   fsync(dir)   ◄── rename survives power loss
//! ```

mod atomic;
mod snapshot;
mod checkpoint;

pub use atomic::{remove_stale_temp, sync_parent_dir, temp_path, write_atomic};
pub use snapshot::SnapshotWriter;
pub use checkpoint::{CheckpointLoad, CheckpointTracker};
