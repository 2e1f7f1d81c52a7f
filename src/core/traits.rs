//! Read-side abstraction consumed by query-serving layers
//!
//! A query layer (GraphQL resolver, HTTP handler, the bundled CLI) depends on
//! `LedgerReader` rather than on a concrete store, and has no way to write
//! through it. Writes go through the settlement engine only.

use crate::types::{
    LedgerError, Player, PlayerId, PlayerSession, Realm, RealmId, Session, SessionId,
    SessionSummary, Transfer,
};

/// Read-only access to committed ledger state
pub trait LedgerReader {
    /// Realm with the given unique name
    fn realm_by_name(&self, name: &str) -> Result<Realm, LedgerError>;

    fn realm_by_id(&self, id: RealmId) -> Result<Realm, LedgerError>;

    fn player_by_id(&self, id: PlayerId) -> Result<Player, LedgerError>;

    fn session_by_id(&self, id: SessionId) -> Result<Session, LedgerError>;

    /// All sessions of a realm, oldest first
    fn sessions_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Session>, LedgerError>;

    fn players_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Player>, LedgerError>;

    fn player_session(
        &self,
        player_id: PlayerId,
        session_id: SessionId,
    ) -> Result<PlayerSession, LedgerError>;

    fn player_sessions_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerSession>, LedgerError>;

    fn player_sessions_by_player_id(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSession>, LedgerError>;

    fn transfers_by_session_id(&self, session_id: SessionId)
        -> Result<Vec<Transfer>, LedgerError>;

    /// Chip totals of a session
    fn session_summary(&self, session_id: SessionId) -> Result<SessionSummary, LedgerError>;
}
