//! Error types for LedgerKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unified error type for LedgerKV operations
#[derive(Debug, Error)]
pub enum LedgerError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Disk full, permission denied, fsync failure, ...
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Durability Errors
    // -------------------------------------------------------------------------
    /// The WAL may end in a torn record that could not be cut back
    #[error("WAL write failed: {0}")]
    WalWrite(String),

    /// The main data file exists but is not a complete snapshot.
    ///
    /// Fatal on open: nothing is silently discarded.
    #[error("Snapshot corruption in {}: {reason}", path.display())]
    Corruption { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// True for the fatal "main file is unreadable" case
    pub fn is_corruption(&self) -> bool {
        matches!(self, LedgerError::Corruption { .. })
    }
}
