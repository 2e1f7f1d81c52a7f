//! Asynchronous recording strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncRecordingStrategy
//!     ├── tokio multi-threaded runtime (owned per request)
//!     ├── AsyncReader (batch CSV reading over tokio::fs + compat)
//!     └── AsyncSettlementEngine (spawn_blocking, optional timeout)
//! ```
//!
//! Batches are only a reading concern: all of them are collected before the
//! settlement starts, and the session is still written in one transaction.

use crate::core::r#async::{AsyncConfig, AsyncSettlementEngine};
use crate::core::{LookupFacade, Store};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_settled_session, RecordingStrategy, SessionRequest};
use crate::types::{LedgerError, Session};
use std::io::Write;
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;

/// Ledger rows read per batch
const BATCH_SIZE: usize = 256;

/// Asynchronous recording strategy
#[derive(Debug, Clone, Default)]
pub struct AsyncRecordingStrategy {
    config: AsyncConfig,
}

impl AsyncRecordingStrategy {
    /// Create a new AsyncRecordingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - Settlement configuration (per-call timeout)
    pub fn new(config: AsyncConfig) -> Self {
        Self { config }
    }
}

impl RecordingStrategy for AsyncRecordingStrategy {
    fn record(
        &self,
        store: &Store,
        request: &SessionRequest,
        ledger_path: &Path,
        output: &mut dyn Write,
    ) -> Result<Session, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .map_err(|e| LedgerError::Io {
                line: None,
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let session = runtime.block_on(async {
            let file = tokio::fs::File::open(ledger_path)
                .await
                .map_err(|e| LedgerError::Io {
                    line: None,
                    message: format!("Failed to open ledger '{}': {}", ledger_path.display(), e),
                })?;

            let mut reader = AsyncReader::new(file.compat());
            let entries = reader.read_all(BATCH_SIZE).await?;
            tracing::debug!(rows = entries.len(), ledger = %ledger_path.display(), "Read ledger");

            AsyncSettlementEngine::new(store.clone(), self.config.clone())
                .create_session(request.realm_id, request.name.clone(), request.time, entries)
                .await
        })?;

        write_settled_session(&LookupFacade::new(store.clone()), session.id, output)?;
        Ok(session)
    }
}
