//! Configuration for LedgerKV
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

/// Main configuration for a LedgerKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Checkpoint Configuration
    // -------------------------------------------------------------------------
    /// Number of mutations between automatic checkpoints.
    /// `0` disables automatic checkpoints (`Store::checkpoint` still works).
    pub checkpoint_every: usize,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// fsync the parent directory after each atomic rename (unix only)
    pub sync_directory: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_every: 5,
            sync_directory: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of mutations between automatic checkpoints
    pub fn checkpoint_every(mut self, ops: usize) -> Self {
        self.config.checkpoint_every = ops;
        self
    }

    /// Enable or disable directory fsync after renames
    pub fn sync_directory(mut self, enabled: bool) -> Self {
        self.config.sync_directory = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Locations of the three files a store owns
///
/// ```text
///   {dir}/
///     ├── db.json           (snapshot, always complete)
///     ├── wal.json          (write-ahead log, JSON lines)
///     └── checkpoint.json   ({"wal_offset": N})
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Main data file holding the latest snapshot
    pub data_file: PathBuf,

    /// Write-ahead log
    pub wal_file: PathBuf,

    /// Checkpoint metadata
    pub checkpoint_file: PathBuf,
}

impl StorePaths {
    pub const DATA_FILENAME: &'static str = "db.json";
    pub const WAL_FILENAME: &'static str = "wal.json";
    pub const CHECKPOINT_FILENAME: &'static str = "checkpoint.json";

    /// Explicit paths for each file
    pub fn new(
        data_file: impl Into<PathBuf>,
        wal_file: impl Into<PathBuf>,
        checkpoint_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_file: data_file.into(),
            wal_file: wal_file.into(),
            checkpoint_file: checkpoint_file.into(),
        }
    }

    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(Self::DATA_FILENAME),
            dir.join(Self::WAL_FILENAME),
            dir.join(Self::CHECKPOINT_FILENAME),
        )
    }

    /// Reject layouts where two roles (or a role and a temp file) collide
    pub fn validate(&self) -> Result<()> {
        let files = [&self.data_file, &self.wal_file, &self.checkpoint_file];

        for (i, a) in files.iter().enumerate() {
            for b in files.iter().skip(i + 1) {
                if a == b {
                    return Err(LedgerError::Config(format!(
                        "path {} is used for more than one store file",
                        a.display()
                    )));
                }
            }
        }

        let temps = [
            crate::storage::temp_path(&self.data_file),
            crate::storage::temp_path(&self.checkpoint_file),
        ];
        for temp in &temps {
            if files.iter().any(|f| *f == temp) {
                return Err(LedgerError::Config(format!(
                    "path {} collides with a temporary file",
                    temp.display()
                )));
            }
        }

        Ok(())
    }
}
