//! Recording strategy module
//!
//! A recording strategy is a complete pipeline for one `record-session`
//! request: read the ledger CSV, settle it through the appropriate engine and
//! write the resulting transfers. Implementations (synchronous, asynchronous
//! batch) are selected at runtime.

use crate::cli::StrategyType;
use crate::core::r#async::AsyncConfig;
use crate::core::store::Store;
use crate::core::traits::LedgerReader;
use crate::io::csv_format::{settlement_lines, write_settlement_csv};
use crate::types::{LedgerError, RealmId, Session, SessionId};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::AsyncRecordingStrategy;
pub use sync::SyncRecordingStrategy;

/// Everything about a session except its ledger rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub realm_id: RealmId,
    pub name: Option<String>,
    pub time: DateTime<Utc>,
}

impl SessionRequest {
    pub fn new(realm_id: RealmId, name: Option<String>, time: DateTime<Utc>) -> Self {
        Self {
            realm_id,
            name,
            time,
        }
    }
}

/// Recording strategy trait for complete ledger settlement pipelines
pub trait RecordingStrategy: Send + Sync {
    /// Settle the ledger at `ledger_path` as a new session and write its transfers
    ///
    /// # Arguments
    ///
    /// * `store` - Store the session is recorded in
    /// * `request` - Realm, name and time of the session
    /// * `ledger_path` - Path to a `player,buyin,walkout` CSV file
    /// * `output` - Writer receiving `player,buyin,walkout,amount` rows
    ///
    /// # Returns
    ///
    /// The committed session
    ///
    /// # Errors
    ///
    /// - `Io` if the ledger cannot be read or any row is malformed; nothing is recorded
    /// - Any settlement error, in which case nothing is recorded either
    /// - `Io` if the output cannot be written; the session stays committed
    fn record(
        &self,
        store: &Store,
        request: &SessionRequest,
        ledger_path: &Path,
        output: &mut dyn Write,
    ) -> Result<Session, LedgerError>;
}

/// Create a recording strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of recording strategy to create (Sync or Async)
/// * `config` - Optional configuration for async settlement (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<AsyncConfig>,
) -> Box<dyn RecordingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncRecordingStrategy),
        StrategyType::Async => Box::new(AsyncRecordingStrategy::new(config.unwrap_or_default())),
    }
}

/// Read back a committed session and write its settlement lines
pub(crate) fn write_settled_session(
    reader: &dyn LedgerReader,
    session_id: SessionId,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let rows = reader.player_sessions_by_session_id(session_id)?;
    let transfers = reader.transfers_by_session_id(session_id)?;
    let lines = settlement_lines(&rows, &transfers)?;
    write_settlement_csv(&lines, output)
}
