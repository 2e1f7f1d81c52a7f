//! Entity persistence
//!
//! The `EntityStore` owns single-row creation of realms and players and every
//! keyed read against the five ledger tables. Sessions and their batches are
//! written only by the settlement engine.
//!
//! # Reads
//!
//! Single-row reads fail with `NotFound` when nothing matches. Parent-keyed
//! reads (`*_by_realm_id`, `*_by_session_id`, `*_by_player_id`) fail with
//! `NotFound` when the parent itself is missing and return an empty list when
//! the parent has no children. Lists are ordered explicitly; insertion order
//! is never relied on.

use crate::core::store::{
    decode_player, decode_player_session, decode_realm, decode_session, decode_transfer, Store,
    PLAYER_COLUMNS, PLAYER_SESSION_COLUMNS, REALM_COLUMNS, SESSION_COLUMNS, TRANSFER_COLUMNS,
};
use crate::types::{
    LedgerError, Player, PlayerId, PlayerSession, Realm, RealmId, Session, SessionId, Transfer,
};
use rusqlite::{params, Connection, OptionalExtension};

/// Persists and retrieves individual ledger entities
#[derive(Debug, Clone)]
pub struct EntityStore {
    store: Store,
}

impl EntityStore {
    /// Create an EntityStore over `store`
    pub fn new(store: Store) -> Self {
        EntityStore { store }
    }

    /// Create a realm
    ///
    /// # Arguments
    ///
    /// * `name` - Unique, non-empty realm name
    /// * `title` - Optional display title; `Some("")` is stored as an empty string
    ///
    /// # Returns
    ///
    /// The persisted realm including its generated id
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the name is blank
    /// - `ConstraintViolation` if a realm with this name already exists
    pub fn create_realm(&self, name: &str, title: Option<&str>) -> Result<Realm, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::invalid_argument("realm name must not be empty"));
        }

        let realm = self.store.with_connection(|conn| {
            conn.execute(
                "INSERT INTO realm (name, title) VALUES (?1, ?2)",
                params![name, title],
            )?;
            Ok(Realm {
                id: RealmId(conn.last_insert_rowid()),
                name: name.to_string(),
                title: title.map(str::to_string),
            })
        })?;

        tracing::info!(realm_id = %realm.id, name = %realm.name, "Created realm");
        Ok(realm)
    }

    /// Create a player in an existing realm
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the name is blank
    /// - `ForeignKeyViolation` if the realm does not exist
    pub fn create_player(&self, name: &str, realm_id: RealmId) -> Result<Player, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::invalid_argument("player name must not be empty"));
        }

        let player = self.store.with_connection(|conn| {
            conn.execute(
                "INSERT INTO player (name, realm_id) VALUES (?1, ?2)",
                params![name, realm_id.get()],
            )?;
            Ok(Player {
                id: PlayerId(conn.last_insert_rowid()),
                name: name.to_string(),
                realm_id,
            })
        })?;

        tracing::info!(player_id = %player.id, realm_id = %realm_id, "Created player");
        Ok(player)
    }

    pub fn realm_by_name(&self, name: &str) -> Result<Realm, LedgerError> {
        self.store.with_connection(|conn| {
            let sql = format!("SELECT {} FROM realm WHERE name = ?1", REALM_COLUMNS);
            conn.query_row(&sql, [name], decode_realm)
                .optional()?
                .ok_or_else(|| LedgerError::not_found("realm", name))
        })
    }

    pub fn realm_by_id(&self, id: RealmId) -> Result<Realm, LedgerError> {
        self.store.with_connection(|conn| realm_by_id(conn, id))
    }

    pub fn player_by_id(&self, id: PlayerId) -> Result<Player, LedgerError> {
        self.store.with_connection(|conn| player_by_id(conn, id))
    }

    pub fn session_by_id(&self, id: SessionId) -> Result<Session, LedgerError> {
        self.store.with_connection(|conn| session_by_id(conn, id))
    }

    /// Participation row for one (player, session) pair
    pub fn player_session(
        &self,
        player_id: PlayerId,
        session_id: SessionId,
    ) -> Result<PlayerSession, LedgerError> {
        self.store.with_connection(|conn| {
            let sql = format!(
                "SELECT {} FROM player_session WHERE player_id = ?1 AND session_id = ?2",
                PLAYER_SESSION_COLUMNS
            );
            conn.query_row(
                &sql,
                params![player_id.get(), session_id.get()],
                decode_player_session,
            )
            .optional()?
            .ok_or_else(|| {
                LedgerError::not_found(
                    "player session",
                    format!("(player {}, session {})", player_id, session_id),
                )
            })
        })
    }

    /// Sessions of a realm, oldest first
    pub fn sessions_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Session>, LedgerError> {
        self.store.with_connection(|conn| {
            realm_by_id(conn, realm_id)?;
            let sql = format!(
                "SELECT {} FROM session WHERE realm_id = ?1 ORDER BY time, id",
                SESSION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let sessions = stmt
                .query_map([realm_id.get()], decode_session)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(sessions)
        })
    }

    /// Players of a realm, ordered by id
    pub fn players_by_realm_id(&self, realm_id: RealmId) -> Result<Vec<Player>, LedgerError> {
        self.store.with_connection(|conn| {
            realm_by_id(conn, realm_id)?;
            let sql = format!(
                "SELECT {} FROM player WHERE realm_id = ?1 ORDER BY id",
                PLAYER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let players = stmt
                .query_map([realm_id.get()], decode_player)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(players)
        })
    }

    /// Participation rows of a session, ordered by player id
    pub fn player_sessions_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerSession>, LedgerError> {
        self.store.with_connection(|conn| {
            session_by_id(conn, session_id)?;
            player_sessions_by_session_id(conn, session_id)
        })
    }

    /// Participation rows of a player, ordered by session id
    pub fn player_sessions_by_player_id(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerSession>, LedgerError> {
        self.store.with_connection(|conn| {
            player_by_id(conn, player_id)?;
            let sql = format!(
                "SELECT {} FROM player_session WHERE player_id = ?1 ORDER BY session_id",
                PLAYER_SESSION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([player_id.get()], decode_player_session)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Transfers of a session, ordered by player id
    pub fn transfers_by_session_id(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<Transfer>, LedgerError> {
        self.store.with_connection(|conn| {
            session_by_id(conn, session_id)?;
            let sql = format!(
                "SELECT {} FROM transfer WHERE session_id = ?1 ORDER BY player_id",
                TRANSFER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([session_id.get()], decode_transfer)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Session together with its participation rows, read under one lock
    pub(crate) fn session_with_rows(
        &self,
        session_id: SessionId,
    ) -> Result<(Session, Vec<PlayerSession>), LedgerError> {
        self.store.with_connection(|conn| {
            let session = session_by_id(conn, session_id)?;
            let rows = player_sessions_by_session_id(conn, session_id)?;
            Ok((session, rows))
        })
    }
}

// Connection-level reads, shared with the settlement engine so that its
// existence checks run inside its own transaction.

pub(crate) fn realm_by_id(conn: &Connection, id: RealmId) -> Result<Realm, LedgerError> {
    let sql = format!("SELECT {} FROM realm WHERE id = ?1", REALM_COLUMNS);
    conn.query_row(&sql, [id.get()], decode_realm)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("realm", id))
}

pub(crate) fn player_by_id(conn: &Connection, id: PlayerId) -> Result<Player, LedgerError> {
    let sql = format!("SELECT {} FROM player WHERE id = ?1", PLAYER_COLUMNS);
    conn.query_row(&sql, [id.get()], decode_player)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("player", id))
}

pub(crate) fn session_by_id(conn: &Connection, id: SessionId) -> Result<Session, LedgerError> {
    let sql = format!("SELECT {} FROM session WHERE id = ?1", SESSION_COLUMNS);
    conn.query_row(&sql, [id.get()], decode_session)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("session", id))
}

fn player_sessions_by_session_id(
    conn: &Connection,
    session_id: SessionId,
) -> Result<Vec<PlayerSession>, LedgerError> {
    let sql = format!(
        "SELECT {} FROM player_session WHERE session_id = ?1 ORDER BY player_id",
        PLAYER_SESSION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([session_id.get()], decode_player_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use rstest::{fixture, rstest};

    #[fixture]
    fn entities() -> EntityStore {
        EntityStore::new(Store::in_memory().unwrap())
    }

    #[rstest]
    fn test_create_realm_then_lookup_by_name(entities: EntityStore) {
        let realm = entities.create_realm("crimson", Some("sux")).unwrap();
        assert!(realm.id.get() > 0);

        let found = entities.realm_by_name("crimson").unwrap();
        assert_eq!(found, realm);
        assert_eq!(found.title.as_deref(), Some("sux"));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(""))]
    fn test_realm_title_absent_and_empty_stay_distinct(
        entities: EntityStore,
        #[case] title: Option<&str>,
    ) {
        let realm = entities.create_realm("crimson", title).unwrap();
        let found = entities.realm_by_id(realm.id).unwrap();
        assert_eq!(found.title.as_deref(), title);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn test_create_realm_rejects_blank_name(entities: EntityStore, #[case] name: &str) {
        let err = entities.create_realm(name, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    fn test_create_realm_duplicate_name(entities: EntityStore) {
        entities.create_realm("crimson", None).unwrap();
        let err = entities.create_realm("crimson", Some("again")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[rstest]
    fn test_create_player(entities: EntityStore) {
        let realm = entities.create_realm("testName", Some("testTitle")).unwrap();
        let player = entities.create_player("crimson", realm.id).unwrap();

        assert!(player.id.get() > 0);
        assert_eq!(player.realm_id, realm.id);
        assert_eq!(entities.player_by_id(player.id).unwrap(), player);
    }

    #[rstest]
    fn test_create_player_unknown_realm(entities: EntityStore) {
        let err = entities.create_player("ghost", RealmId(404)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
    }

    #[rstest]
    fn test_create_player_blank_name(entities: EntityStore) {
        let realm = entities.create_realm("r", None).unwrap();
        let err = entities.create_player("", realm.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    fn test_single_row_lookups_not_found(entities: EntityStore) {
        assert_eq!(
            entities.realm_by_name("nope").unwrap_err(),
            LedgerError::not_found("realm", "nope")
        );
        assert_eq!(
            entities.player_by_id(PlayerId(9)).unwrap_err(),
            LedgerError::not_found("player", 9)
        );
        assert_eq!(
            entities.session_by_id(SessionId(9)).unwrap_err(),
            LedgerError::not_found("session", 9)
        );
        assert_eq!(
            entities
                .player_session(PlayerId(1), SessionId(1))
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[rstest]
    fn test_parent_lookups_distinguish_missing_parent_from_no_children(entities: EntityStore) {
        let realm = entities.create_realm("empty", None).unwrap();
        assert!(entities.sessions_by_realm_id(realm.id).unwrap().is_empty());
        assert!(entities.players_by_realm_id(realm.id).unwrap().is_empty());

        let err = entities.sessions_by_realm_id(RealmId(404)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = entities.transfers_by_session_id(SessionId(404)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = entities
            .player_sessions_by_player_id(PlayerId(404))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    fn test_players_by_realm_only_returns_own_realm(entities: EntityStore) {
        let a = entities.create_realm("a", None).unwrap();
        let b = entities.create_realm("b", None).unwrap();
        let p1 = entities.create_player("p1", a.id).unwrap();
        entities.create_player("p2", b.id).unwrap();
        let p3 = entities.create_player("p3", a.id).unwrap();

        let players = entities.players_by_realm_id(a.id).unwrap();
        assert_eq!(players, vec![p1, p3]);
    }
}
