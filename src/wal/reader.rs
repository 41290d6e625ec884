//! WAL Reader
//!
//! Handles reading records from the WAL file.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::codec::{self, LogRecord, RECORD_TERMINATOR};
use crate::error::Result;

/// Outcome of reading one record
#[derive(Debug, Clone, PartialEq)]
pub enum WalRead {
    /// A complete record
    Record(LogRecord),

    /// Clean end of file on a record boundary
    End,

    /// A torn or undecodable record; nothing at or after it is valid
    Malformed { offset: u64, reason: String },
}

/// Sequential reader over WAL records
pub struct WalReader {
    reader: BufReader<File>,
    position: u64,
    line: Vec<u8>,
    finished: bool,
}

impl WalReader {
    /// Open a WAL file and seek to `offset`
    pub fn open(path: &Path, offset: u64) -> Result<Self> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(offset))?;

        Ok(Self {
            reader: BufReader::new(file),
            position: offset,
            line: Vec::new(),
            finished: false,
        })
    }

    /// Read the next record
    ///
    /// Once `End` or `Malformed` is returned, every later call returns `End`.
    pub fn next_record(&mut self) -> Result<WalRead> {
        if self.finished {
            return Ok(WalRead::End);
        }

        self.line.clear();
        let n = self.reader.read_until(RECORD_TERMINATOR, &mut self.line)?;

        if n == 0 {
            self.finished = true;
            return Ok(WalRead::End);
        }

        if self.line.last() != Some(&RECORD_TERMINATOR) {
            self.finished = true;
            return Ok(WalRead::Malformed {
                offset: self.position,
                reason: format!("unterminated record ({} bytes)", n),
            });
        }

        match codec::decode_record(&self.line[..n - 1]) {
            Ok(record) => {
                self.position += n as u64;
                Ok(WalRead::Record(record))
            }
            Err(e) => {
                self.finished = true;
                Ok(WalRead::Malformed {
                    offset: self.position,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Byte offset just past the last valid record read
    pub fn position(&self) -> u64 {
        self.position
    }
}
