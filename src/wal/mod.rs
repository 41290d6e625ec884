//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append one record per mutation, fsynced before the mutation is applied
//! - Track the physical byte length used by checkpoints
//! - Sequential replay from a byte offset, stopping at the first torn record
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ {"action":"put","key":"A","value":1}\n       │  record 1
//! ├──────────────────────────────────────────────┤
//! │ {"action":"delete","key":"A"}\n              │  record 2
//! ├──────────────────────────────────────────────┤
//! │ {"action":"put","key":"B"                    │  torn tail (ignored)
//! └──────────────────────────────────────────────┘
//! ```

mod writer;
mod reader;
mod recovery;

pub use crate::codec::LogRecord;
pub use writer::WalWriter;
pub use reader::{WalRead, WalReader};
pub use recovery::{WalRecovery, WalReplay};
