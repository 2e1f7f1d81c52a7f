//! Synchronous recording strategy
//!
//! Orchestrates one settlement on the calling thread, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Settlement to `SettlementEngine` (one transaction)
//! - Output to `csv_format::write_settlement_csv` via the lookup facade
//!
//! The whole ledger is parsed before the transaction starts, so a malformed
//! row never leaves a partially recorded session behind.

use crate::core::{LookupFacade, SettlementEngine, Store};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_settled_session, RecordingStrategy, SessionRequest};
use crate::types::{LedgerError, NewPlayerSession, Session};
use std::io::Write;
use std::path::Path;

/// Synchronous recording strategy
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use poker_ledger::core::Store;
/// use poker_ledger::strategy::{RecordingStrategy, SessionRequest, SyncRecordingStrategy};
/// use poker_ledger::types::RealmId;
/// use std::path::Path;
///
/// let store = Store::in_memory().unwrap();
/// let request = SessionRequest::new(RealmId(1), None, Utc::now());
/// SyncRecordingStrategy
///     .record(&store, &request, Path::new("ledger.csv"), &mut std::io::stdout())
///     .expect("Recording failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncRecordingStrategy;

impl RecordingStrategy for SyncRecordingStrategy {
    fn record(
        &self,
        store: &Store,
        request: &SessionRequest,
        ledger_path: &Path,
        output: &mut dyn Write,
    ) -> Result<Session, LedgerError> {
        let entries = SyncReader::new(ledger_path)?.collect::<Result<Vec<NewPlayerSession>, _>>()?;
        tracing::debug!(rows = entries.len(), ledger = %ledger_path.display(), "Read ledger");

        let session = SettlementEngine::new(store.clone()).create_session(
            request.realm_id,
            request.name.as_deref(),
            request.time,
            &entries,
        )?;

        write_settled_session(&LookupFacade::new(store.clone()), session.id, output)?;
        Ok(session)
    }
}
