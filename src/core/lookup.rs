//! Lookup facade
//!
//! Exposes the read half of the [`EntityStore`] through the [`LedgerReader`]
//! trait. Every call is a read of committed state; the facade never writes
//! and never participates in a settlement transaction.

use crate::core::entity_store::EntityStore;
use crate::core::store::Store;
use crate::core::traits::LedgerReader;
use crate::types::{
    LedgerError, Player, PlayerId, PlayerSession, Realm, RealmId, Session, SessionId,
    SessionSummary, Transfer,
};

/// Read-only traversal of the ledger for query-serving layers
#[derive(Debug, Clone)]
pub struct LookupFacade {
    entities: EntityStore,
}

impl LookupFacade {
    pub fn new(store: Store) -> Self {
        LookupFacade {
            entities: EntityStore::new(store),
        }
    }
}

impl LedgerReader for LookupFacade {
    fn realm_by_name(&self, name: &str) -> Result<Realm, LedgerError> {
        tracing::debug!(name, "Lookup realm by name");
        self.entities.realm_by_name(name)
    }

    fn realm_by_id(&self, id: RealmId) -> Result<Realm, LedgerError> {
        self.entities.realm_by_id(id)
    }

    fn player_by_id(&self, id: PlayerId) -> Result<Player, LedgerError> {
        tracing::debug!(player_id = %id, "Lookup player");
        self.entities.player_by_id(id)
    }

    fn session_by_id(&self, id: SessionId) -> Result<Session, LedgerError> {
        tracing::debug!(session_id = %id, "Lookup session");
        self.entities.session_by_id(id)
    }

    fn sessions_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Session>, LedgerError> {
        tracing::debug!(realm_id = %realm_id, "Lookup sessions of realm");
        self.entities.sessions_by_realm_id(realm_id)
    }

    fn players_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Player>, LedgerError> {
        self.entities.players_by_realm_id(realm_id)
    }

    fn player_session(
        &self,
        player_id: PlayerId,
        session_id: SessionId,
    ) -> Result<PlayerSession, LedgerError> {
        self.entities.player_session(player_id, session_id)
    }

    fn player_sessions_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerSession>, LedgerError> {
        self.entities.player_sessions_by_session_id(session_id)
    }

    fn player_sessions_by_player_id(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSession>, LedgerError> {
        self.entities.player_sessions_by_player_id(player_id)
    }

    fn transfers_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<Transfer>, LedgerError> {
        self.entities.transfers_by_session_id(session_id)
    }

    fn session_summary(&self, session_id: SessionId) -> Result<SessionSummary, LedgerError> {
        let (session, rows) = self.entities.session_with_rows(session_id)?;
        Ok(SessionSummary::from_rows(session, &rows))
    }
}
