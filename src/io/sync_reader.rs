//! Synchronous ledger reader with iterator interface
//!
//! Provides a streaming iterator over the rows of a ledger CSV file
//! (`player,buyin,walkout`). Delegates format concerns to the csv_format
//! module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<NewPlayerSession, LedgerError>` for each CSV row:
//!
//! ```no_run
//! use poker_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("ledger.csv")).unwrap();
//! let entries: Result<Vec<_>, _> = reader.collect();
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row errors are yielded as `Err` carrying the line number
//!
//! A session is recorded all-or-nothing, so callers normally collect into a
//! `Result<Vec<_>, _>` and give up on the first bad row.

use crate::io::csv_format::{convert_ledger_record, LedgerCsvRecord};
use crate::types::{LedgerError, NewPlayerSession};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous ledger reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a ledger file for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields and expects a
    /// `player,buyin,walkout` header.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be opened
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::Io {
            line: None,
            message: format!("Failed to open ledger '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<NewPlayerSession, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<LedgerCsvRecord>();
        let next = deserializer.next()?;
        self.line_num += 1;
        let line = self.line_num;

        Some(match next {
            Ok(record) => convert_ledger_record(record).map_err(|e| LedgerError::Io {
                line: Some(line),
                message: e.to_string(),
            }),
            Err(e) => Err(LedgerError::Io {
                line: Some(line),
                message: format!("CSV parse error: {}", e),
            }),
        })
    }
}
