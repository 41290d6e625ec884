//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::{self, LogRecord};
use crate::error::{LedgerError, Result};
use crate::storage;

/// Appends records to the WAL file
///
/// Every append is written, flushed and fsynced before `append` returns.
/// `len` is the byte length of the committed prefix of the file.
///
/// If a failed append cannot be cut back, the file no longer ends on a
/// record boundary and the writer refuses every later append.
pub struct WalWriter {
    file: File,
    path: PathBuf,
    len: u64,
    records_appended: u64,

    /// Set when the file may hold bytes past `len`
    failed: Option<String>,
}

impl WalWriter {
    /// Open a WAL file for appending, creating it if needed
    ///
    /// A newly created file has its directory entry fsynced when
    /// `sync_directory` is set, so the first record cannot outlive its file.
    pub fn open(path: &Path, sync_directory: bool) -> Result<Self> {
        let existed = path.exists();

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        if !existed && sync_directory {
            storage::sync_parent_dir(path)?;
        }

        debug!(path = %path.display(), len, created = !existed, "WAL opened");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
            records_appended: 0,
            failed: None,
        })
    }

    /// Append a record and make it durable
    ///
    /// Returns the WAL length after the append. On failure the file is cut
    /// back to the previous length so no fragment of this record precedes the
    /// next one; if that also fails, the writer is marked failed.
    pub fn append(&mut self, record: &LogRecord) -> Result<u64> {
        if let Some(reason) = &self.failed {
            return Err(LedgerError::WalWrite(format!(
                "{} has an uncommitted tail past byte {}: {}",
                self.path.display(),
                self.len,
                reason
            )));
        }

        let line = codec::encode_record(record)?;

        if let Err(e) = self.write_durable(&line) {
            self.rollback();
            return Err(e.into());
        }

        self.len += line.len() as u64;
        self.records_appended += 1;
        Ok(self.len)
    }

    fn write_durable(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        self.file.flush()?;
        self.file.sync_data()
    }

    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            warn!(
                path = %self.path.display(),
                committed_len = self.len,
                error = %e,
                "Failed to cut torn WAL append; refusing further appends"
            );
            self.failed = Some(e.to_string());
        }
    }

    /// True once a torn append could not be cut back
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Force everything (data and metadata) to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Byte length of the committed WAL
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records appended through this writer since it was opened
    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    /// Writer over a handle that rejects writes, for failure-path tests
    #[cfg(test)]
    pub(crate) fn open_read_only(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
            records_appended: 0,
            failed: None,
        })
    }
}
