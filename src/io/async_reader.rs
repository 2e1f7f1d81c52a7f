//! Asynchronous ledger reader with batch interface
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - any `futures::io::AsyncRead` source (`tokio::fs::File` via tokio-util compat)
//! - Batch reading, so large ledgers never block the runtime for long
//!
//! # Architecture
//!
//! ```text
//! Ledger CSV → AsyncReader → Batches of NewPlayerSession
//!                  ↓
//!           csv_format module
//!           (LedgerCsvRecord, convert_ledger_record)
//! ```
//!
//! Unlike a tolerant importer, a bad row fails the whole read: a session is
//! recorded all-or-nothing.

use crate::io::csv_format::{convert_ledger_record, LedgerCsvRecord};
use crate::types::{LedgerError, NewPlayerSession};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous ledger reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader over an async byte source
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` ledger rows
    ///
    /// # Returns
    ///
    /// The converted rows; an empty vector once the end of the ledger is reached
    ///
    /// # Errors
    ///
    /// `Io` carrying the line number of the first malformed row
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Result<Vec<NewPlayerSession>, LedgerError> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<LedgerCsvRecord>();

        while batch.len() < batch_size {
            let Some(next) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num;

            let record = next.map_err(|e| LedgerError::Io {
                line: Some(line),
                message: format!("CSV parse error: {}", e),
            })?;
            let entry = convert_ledger_record(record).map_err(|e| LedgerError::Io {
                line: Some(line),
                message: e.to_string(),
            })?;
            batch.push(entry);
        }

        Ok(batch)
    }

    /// Read the whole ledger in batches of `batch_size`
    pub async fn read_all(&mut self, batch_size: usize) -> Result<Vec<NewPlayerSession>, LedgerError> {
        let mut entries = Vec::new();
        loop {
            let batch = self.read_batch(batch_size.max(1)).await?;
            if batch.is_empty() {
                return Ok(entries);
            }
            entries.extend(batch);
        }
    }
}
