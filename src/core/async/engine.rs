//! Settlement orchestration for async callers
//!
//! # Architecture
//!
//! ```text
//! AsyncSettlementEngine::create_session (async)
//!     ├── CancellationToken + DropGuard   (cancels when the future is dropped)
//!     ├── tokio::time::timeout            (optional, cancels on expiry)
//!     └── spawn_blocking
//!         └── SettlementEngine::create_session_with_cancel (one transaction)
//! ```
//!
//! The engine is cloneable; clones share the underlying [`Store`].

use crate::core::settlement::SettlementEngine;
use crate::core::store::Store;
use crate::types::{LedgerError, NewPlayerSession, RealmId, Session};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for async settlement
#[derive(Clone, Debug, Default)]
pub struct AsyncConfig {
    /// Upper bound on one settlement, `None` for no limit
    pub timeout: Option<Duration>,
}

impl AsyncConfig {
    /// Create a config with a per-call timeout
    ///
    /// A zero timeout would cancel every call before it starts, so it is
    /// treated as "no limit".
    pub fn with_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            tracing::warn!("Invalid settlement timeout (0), settling without a limit");
            return Self { timeout: None };
        }
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Async settlement engine
///
/// Each call owns one transaction from start to commit or rollback, exactly
/// like the synchronous engine it wraps.
#[derive(Debug, Clone)]
pub struct AsyncSettlementEngine {
    engine: SettlementEngine,
    config: AsyncConfig,
}

impl AsyncSettlementEngine {
    pub fn new(store: Store, config: AsyncConfig) -> Self {
        Self {
            engine: SettlementEngine::new(store),
            config,
        }
    }

    /// Record a session; see [`SettlementEngine::create_session`]
    ///
    /// # Errors
    ///
    /// Same as the synchronous engine. Timeouts, cancellation and a panicked
    /// worker surface as `TransactionAborted` with nothing persisted.
    pub async fn create_session(
        &self,
        realm_id: RealmId,
        name: Option<String>,
        time: DateTime<Utc>,
        entries: Vec<NewPlayerSession>,
    ) -> Result<Session, LedgerError> {
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();

        let engine = self.engine.clone();
        let token = cancel.clone();
        let mut handle = tokio::task::spawn_blocking(move || {
            engine.create_session_with_cancel(realm_id, name.as_deref(), time, &entries, &token)
        });

        let joined = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        realm_id = %realm_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Settlement timed out, cancelling"
                    );
                    cancel.cancel();
                    // The worker may have committed before seeing the token;
                    // report whatever actually happened.
                    handle.await
                }
            },
            None => handle.await,
        };

        guard.disarm();

        joined.map_err(|e| LedgerError::transaction_aborted(format!("settlement task failed: {}", e)))?
    }
}
