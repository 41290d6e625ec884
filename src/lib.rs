//! # LedgerKV
//!
//! A crash-safe, single-node key-value store with:
//! - Write-Ahead Logging (WAL), fsynced before every mutation is applied
//! - Atomic snapshots of the full state (write temp, fsync, rename)
//! - Checkpoints recording how much WAL the snapshot already covers
//! - Crash recovery that discards torn WAL records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store                                │
//! │              (one Mutex over all operations)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌──────────────────┐
//!   │     WAL     │ │   Mapping   │   │ CheckpointTracker│
//!   │  (Append)   │ │ (BTreeMap)  │   │   (op counter)   │
//!   └─────────────┘ └─────────────┘   └────────┬─────────┘
//!                                              │ every N ops
//!                                              ▼
//!                                     ┌──────────────────┐
//!                                     │  SnapshotWriter  │
//!                                     │ (atomic replace) │
//!                                     └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ledgerkv::{Config, Store, StorePaths};
//!
//! let store = Store::open(StorePaths::in_dir("./data"), Config::default())?;
//! store.put("A", 1)?;
//! assert_eq!(store.get("A"), Some(serde_json::json!(1)));
//! store.delete("A")?;
//! store.close()?;
//! # Ok::<(), ledgerkv::LedgerError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod wal;
pub mod storage;
pub mod recovery;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LedgerError, Result};
pub use config::{Config, StorePaths};
pub use codec::{LogRecord, Mapping, Value};
pub use recovery::RecoveryReport;
pub use store::{Store, StoreStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LedgerKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
