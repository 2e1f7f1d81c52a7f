//! Persistent ledger entities
//!
//! These mirror the rows of the five ledger tables. Optional columns are
//! plain `Option`s so that an absent title stays distinct from an empty one.

use super::ids::{PlayerId, RealmId, SessionId, TransferId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An organisational grouping of players and sessions (one friend group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Realm {
    pub id: RealmId,

    /// Unique across the store, never empty
    pub name: String,

    pub title: Option<String>,
}

/// A player; belongs to exactly one realm for its lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub realm_id: RealmId,
}

/// One recorded poker game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub realm_id: RealmId,
    pub name: Option<String>,

    /// When the game took place, stored with millisecond precision
    pub time: DateTime<Utc>,
}

/// A player's participation in a session
///
/// The (player, session) pair is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSession {
    pub player_id: PlayerId,
    pub session_id: SessionId,

    /// Amount contributed at the start of the session
    pub buyin: i64,

    /// Amount taken away at the end of the session
    pub walkout: i64,

    /// Assigned by the store at insert time
    pub created_at: DateTime<Utc>,
}

/// Net result of one player in one session
///
/// Positive amounts are winnings, negative amounts are losses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub id: TransferId,
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied buy-in/walkout pair for one player of a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPlayerSession {
    pub player_id: PlayerId,
    pub buyin: i64,
    pub walkout: i64,
}

impl NewPlayerSession {
    pub fn new(player_id: PlayerId, buyin: i64, walkout: i64) -> Self {
        NewPlayerSession {
            player_id,
            buyin,
            walkout,
        }
    }

    /// Net transfer implied by this entry: `walkout - buyin`
    ///
    /// Returns `None` only when the subtraction overflows, which cannot
    /// happen for the non-negative amounts the engine accepts.
    pub fn net(&self) -> Option<i64> {
        self.walkout.checked_sub(self.buyin)
    }
}

/// Chip totals of a committed session
///
/// `imbalance` is `total_walkout - total_buyin`. The ledger records declared
/// amounts and never rejects a session for not reconciling, so a non-zero
/// imbalance is informational. Totals are `i128` so that no committed session
/// can overflow them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session: Session,
    pub player_count: usize,
    pub total_buyin: i128,
    pub total_walkout: i128,
    pub imbalance: i128,
}

impl SessionSummary {
    /// Build a summary from a session and its participation rows
    pub fn from_rows(session: Session, rows: &[PlayerSession]) -> Self {
        let total_buyin = rows.iter().map(|ps| i128::from(ps.buyin)).sum::<i128>();
        let total_walkout = rows.iter().map(|ps| i128::from(ps.walkout)).sum::<i128>();

        SessionSummary {
            session,
            player_count: rows.len(),
            total_buyin,
            total_walkout,
            imbalance: total_walkout - total_buyin,
        }
    }

    /// Whether total walkouts equal total buy-ins
    pub fn is_balanced(&self) -> bool {
        self.imbalance == 0
    }
}
