//! SQLite connection handle and row decoding
//!
//! Only this module and the components built on it talk to the database.
//! A [`Store`] wraps a single connection behind a mutex; cloning it hands out
//! another reference to the same connection. Components receive a `Store`
//! at construction instead of reaching for a process-wide handle.
//!
//! # Row Decoding
//!
//! Rows are decoded field by field with the `decode_*` functions below. Each
//! decoder expects the column order of the matching `*_COLUMNS` constant.

use crate::types::{
    LedgerError, Player, PlayerId, PlayerSession, Realm, RealmId, Session, SessionId, Transfer,
    TransferId,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

pub(crate) const REALM_COLUMNS: &str = "id, name, title";
pub(crate) const PLAYER_COLUMNS: &str = "id, name, realm_id";
pub(crate) const SESSION_COLUMNS: &str = "id, realm_id, name, time";
pub(crate) const PLAYER_SESSION_COLUMNS: &str =
    "player_id, session_id, buyin, walkout, created_at";
pub(crate) const TRANSFER_COLUMNS: &str = "id, session_id, player_id, amount, created_at";

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, gone when the last handle is dropped
    Memory,
    /// Database file, created if missing
    File(PathBuf),
}

/// Connection settings for a [`Store`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,

    /// Use write-ahead logging (file databases only)
    pub wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }
}

impl StoreConfig {
    /// Configuration for a file-backed database at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database
    pub fn memory() -> Self {
        Self::default()
    }

    /// Override the busy timeout
    ///
    /// A zero timeout would make every contended write fail immediately, so
    /// it falls back to the default.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        if busy_timeout.is_zero() {
            let default = Self::default().busy_timeout;
            tracing::warn!(
                default_ms = default.as_millis() as u64,
                "Invalid busy timeout (0), using default"
            );
            self.busy_timeout = default;
        } else {
            self.busy_timeout = busy_timeout;
        }
        self
    }
}

/// Shared handle to the ledger database
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open a database according to `config`
    ///
    /// Foreign keys are always enforced. The schema is not applied; call
    /// [`Store::migrate`] for that.
    pub fn open(config: &StoreConfig) -> Result<Self, LedgerError> {
        let conn = match &config.location {
            StoreLocation::Memory => Connection::open_in_memory()?,
            StoreLocation::File(path) => {
                let conn = Connection::open(path)?;
                if config.wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn
            }
        };

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(config.busy_timeout)?;

        tracing::debug!(location = ?config.location, "Opened ledger store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a fresh in-memory database with the schema applied
    pub fn in_memory() -> Result<Self, LedgerError> {
        let store = Self::open(&StoreConfig::memory())?;
        store.migrate()?;
        Ok(store)
    }

    /// Apply the ledger schema
    ///
    /// Every statement is `IF NOT EXISTS`, so this is safe to run against an
    /// already initialised database.
    pub fn migrate(&self) -> Result<(), LedgerError> {
        self.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
    }

    /// Run `f` with exclusive access to the connection
    ///
    /// The lock is held until `f` returns, so a transaction opened inside `f`
    /// cannot interleave with any other operation on this handle.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, LedgerError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::storage("connection lock poisoned"))?;
        f(&mut conn)
    }
}

/// Milliseconds since the UNIX epoch, the on-disk timestamp format
pub(crate) fn to_millis(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn decode_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {} out of range", millis).into(),
        )
    })
}

pub(crate) fn decode_realm(row: &Row<'_>) -> rusqlite::Result<Realm> {
    Ok(Realm {
        id: RealmId(row.get(0)?),
        name: row.get(1)?,
        title: row.get(2)?,
    })
}

pub(crate) fn decode_player(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: PlayerId(row.get(0)?),
        name: row.get(1)?,
        realm_id: RealmId(row.get(2)?),
    })
}

pub(crate) fn decode_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: SessionId(row.get(0)?),
        realm_id: RealmId(row.get(1)?),
        name: row.get(2)?,
        time: decode_time(row, 3)?,
    })
}

pub(crate) fn decode_player_session(row: &Row<'_>) -> rusqlite::Result<PlayerSession> {
    Ok(PlayerSession {
        player_id: PlayerId(row.get(0)?),
        session_id: SessionId(row.get(1)?),
        buyin: row.get(2)?,
        walkout: row.get(3)?,
        created_at: decode_time(row, 4)?,
    })
}

pub(crate) fn decode_transfer(row: &Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: TransferId(row.get(0)?),
        session_id: SessionId(row.get(1)?),
        player_id: PlayerId(row.get(2)?),
        amount: row.get(3)?,
        created_at: decode_time(row, 4)?,
    })
}
