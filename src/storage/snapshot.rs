//! Snapshot Writer
//!
//! Materializes the full mapping into the main data file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec::{self, Mapping};
use crate::error::{LedgerError, Result};

use super::atomic::write_atomic;

/// Writes and loads full-state snapshots
///
/// The main data file is only ever replaced through `write_atomic`, so it is
/// always a complete JSON object.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    sync_directory: bool,
}

impl SnapshotWriter {
    pub fn new(path: &Path, sync_directory: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            sync_directory,
        }
    }

    /// Persist `mapping` as the new snapshot
    pub fn write(&self, mapping: &Mapping) -> Result<()> {
        let bytes = codec::encode_snapshot(mapping)?;
        write_atomic(&self.path, &bytes, self.sync_directory)?;
        debug!(path = %self.path.display(), keys = mapping.len(), "Snapshot written");
        Ok(())
    }

    /// Load the snapshot, or `None` if the main file does not exist
    ///
    /// A file that exists but does not parse is `LedgerError::Corruption`.
    pub fn load(&self) -> Result<Option<Mapping>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mapping = codec::decode_snapshot(&bytes).map_err(|e| LedgerError::Corruption {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Some(mapping))
    }

    /// Load the snapshot, writing an empty one first if none exists
    ///
    /// Returns the mapping and whether the file was created.
    pub fn load_or_init(&self) -> Result<(Mapping, bool)> {
        match self.load()? {
            Some(mapping) => Ok((mapping, false)),
            None => {
                let mapping = Mapping::new();
                self.write(&mapping)?;
                info!(path = %self.path.display(), "Created empty snapshot");
                Ok((mapping, true))
            }
        }
    }
}
