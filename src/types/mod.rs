//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ids`: Store-generated identifiers
//! - `entity`: Realm, Player, Session, PlayerSession and Transfer rows
//! - `error`: Error types for the ledger

pub mod entity;
pub mod error;
pub mod ids;

pub use entity::{NewPlayerSession, Player, PlayerSession, Realm, Session, SessionSummary, Transfer};
pub use error::{ErrorKind, LedgerError};
pub use ids::{PlayerId, RealmId, SessionId, TransferId};
