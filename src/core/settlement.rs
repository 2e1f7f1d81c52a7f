//! Session settlement engine
//!
//! This module provides the `SettlementEngine`, the only component that
//! writes more than one row per call. It records a session together with one
//! participation row and one transfer row per player, all inside a single
//! transaction.
//!
//! The engine enforces:
//! - Input validation before any storage access (non-empty batch, non-negative amounts)
//! - Realm and player existence, and realm membership, before the first insert
//! - `transfer.amount == walkout - buyin` for every player
//! - All-or-nothing persistence: any failure drops the transaction
//!
//! Chip conservation is not enforced. Sessions whose walkouts do not add up
//! to their buy-ins are recorded as declared and reported with a warning.

use crate::core::entity_store::{player_by_id, realm_by_id, session_by_id};
use crate::core::store::{to_millis, Store};
use crate::types::{LedgerError, NewPlayerSession, RealmId, Session, SessionId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use tokio_util::sync::CancellationToken;

/// Records sessions and their derived transfers atomically
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    store: Store,
}

impl SettlementEngine {
    /// Create a SettlementEngine over `store`
    pub fn new(store: Store) -> Self {
        SettlementEngine { store }
    }

    /// Record a session with its buy-ins and walkouts
    ///
    /// Inserts the session, then for each entry in the given order a
    /// participation row and a transfer row of `walkout - buyin`. Either all
    /// of these rows are committed or none are.
    ///
    /// # Arguments
    ///
    /// * `realm_id` - Realm the session belongs to
    /// * `name` - Optional session name
    /// * `time` - When the game took place (stored with millisecond precision)
    /// * `entries` - One buy-in/walkout pair per participating player
    ///
    /// # Returns
    ///
    /// The session as stored, including its generated id
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `entries` is empty or holds a negative amount
    /// - `NotFound` if the realm or any player is missing, or a player belongs to another realm
    /// - `ConstraintViolation` if a player appears twice in `entries`
    /// - `TransactionAborted` for any other failure once the transaction has begun
    pub fn create_session(
        &self,
        realm_id: RealmId,
        name: Option<&str>,
        time: DateTime<Utc>,
        entries: &[NewPlayerSession],
    ) -> Result<Session, LedgerError> {
        self.create_session_with_cancel(realm_id, name, time, entries, &CancellationToken::new())
    }

    /// Same as [`create_session`](Self::create_session), observing `cancel`
    ///
    /// The token is checked before the transaction opens, before every player
    /// row and before commit. A cancelled token rolls the transaction back
    /// (or never opens it) and yields `TransactionAborted`.
    pub fn create_session_with_cancel(
        &self,
        realm_id: RealmId,
        name: Option<&str>,
        time: DateTime<Utc>,
        entries: &[NewPlayerSession],
        cancel: &CancellationToken,
    ) -> Result<Session, LedgerError> {
        let imbalance = validate_entries(entries)?;

        let result = self.store.with_connection(|conn| {
            checkpoint(cancel)?;

            // Reserved in autocommit mode so a rollback below leaves a gap
            // instead of handing the same ids out again.
            let session_id = reserve_ids(conn, "session", 1)
                .map_err(LedgerError::into_aborted)?;
            let first_transfer_id = reserve_ids(conn, "transfer", entries.len())
                .map_err(LedgerError::into_aborted)?;

            // IMMEDIATE takes the write lock up front, so the existence checks
            // and the inserts see the same database state.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| LedgerError::from(e).into_aborted())?;

            let ids = ReservedIds {
                session: SessionId(session_id),
                first_transfer: first_transfer_id,
            };
            let session = insert_session(&tx, ids, realm_id, name, time, entries, cancel)
                .map_err(LedgerError::into_aborted)?;

            checkpoint(cancel)?;
            tx.commit()
                .map_err(|e| LedgerError::transaction_aborted(format!("commit failed: {}", e)))?;

            Ok(session)
        });

        match &result {
            Ok(session) => {
                tracing::info!(
                    session_id = %session.id,
                    realm_id = %realm_id,
                    players = entries.len(),
                    "Recorded session"
                );
                if imbalance != 0 {
                    tracing::warn!(
                        session_id = %session.id,
                        imbalance = %imbalance,
                        "Session walkouts do not match buy-ins"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(realm_id = %realm_id, error = %e, "Session rolled back");
            }
        }

        result
    }
}

/// Reject malformed batches before touching storage
///
/// Returns the batch imbalance (`sum(walkout) - sum(buyin)`), widened so
/// that no batch of valid amounts can overflow it.
fn validate_entries(entries: &[NewPlayerSession]) -> Result<i128, LedgerError> {
    if entries.is_empty() {
        return Err(LedgerError::invalid_argument(
            "a session needs at least one player",
        ));
    }

    let mut imbalance: i128 = 0;
    for entry in entries {
        if entry.buyin < 0 || entry.walkout < 0 {
            return Err(LedgerError::invalid_argument(format!(
                "player {} has a negative amount (buyin {}, walkout {})",
                entry.player_id, entry.buyin, entry.walkout
            )));
        }
        imbalance += i128::from(entry.walkout) - i128::from(entry.buyin);
    }

    Ok(imbalance)
}

/// Ids handed out to one settlement before its transaction opens
#[derive(Debug, Clone, Copy)]
struct ReservedIds {
    session: SessionId,
    first_transfer: i64,
}

/// Reserve `count` consecutive ids for `table` and return the first
///
/// Runs as its own autocommit statement, so the reservation survives a later
/// rollback of the settlement transaction.
fn reserve_ids(conn: &Connection, table: &str, count: usize) -> Result<i64, LedgerError> {
    let count = i64::try_from(count)
        .map_err(|_| LedgerError::invalid_argument("too many players in one session"))?;
    let last: i64 = conn.query_row(
        "INSERT INTO id_sequence (name, last_id) VALUES (?1, ?2) \
         ON CONFLICT (name) DO UPDATE SET last_id = last_id + excluded.last_id \
         RETURNING last_id",
        params![table, count],
        |row| row.get(0),
    )?;
    Ok(last - count + 1)
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), LedgerError> {
    if cancel.is_cancelled() {
        return Err(LedgerError::transaction_aborted("settlement cancelled"));
    }
    Ok(())
}

/// Transaction body; runs against the open transaction's connection
fn insert_session(
    conn: &Connection,
    ids: ReservedIds,
    realm_id: RealmId,
    name: Option<&str>,
    time: DateTime<Utc>,
    entries: &[NewPlayerSession],
    cancel: &CancellationToken,
) -> Result<Session, LedgerError> {
    realm_by_id(conn, realm_id)?;
    for entry in entries {
        let player = player_by_id(conn, entry.player_id)?;
        if player.realm_id != realm_id {
            return Err(LedgerError::not_found(
                "player",
                format!("{} in realm {}", entry.player_id, realm_id),
            ));
        }
    }

    let session_id = ids.session;
    conn.execute(
        "INSERT INTO session (id, realm_id, name, time) VALUES (?1, ?2, ?3, ?4)",
        params![session_id.get(), realm_id.get(), name, to_millis(&time)],
    )?;

    let mut insert_player_session = conn.prepare_cached(
        "INSERT INTO player_session (player_id, session_id, buyin, walkout) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut insert_transfer = conn.prepare_cached(
        "INSERT INTO transfer (id, session_id, player_id, amount) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (transfer_id, entry) in (ids.first_transfer..).zip(entries) {
        checkpoint(cancel)?;

        insert_player_session.execute(params![
            entry.player_id.get(),
            session_id.get(),
            entry.buyin,
            entry.walkout
        ])?;

        // both amounts are non-negative, so this cannot overflow
        let amount = entry
            .net()
            .ok_or_else(|| LedgerError::invalid_argument("transfer amount overflows"))?;
        insert_transfer.execute(params![
            transfer_id,
            session_id.get(),
            entry.player_id.get(),
            amount
        ])?;

        tracing::debug!(
            session_id = %session_id,
            player_id = %entry.player_id,
            amount,
            "Inserted player session and transfer"
        );
    }

    session_by_id(conn, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity_store::EntityStore;
    use crate::types::{ErrorKind, Player, PlayerId, Realm};
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    struct Ledger {
        store: Store,
        entities: EntityStore,
        engine: SettlementEngine,
        realm: Realm,
        players: Vec<Player>,
    }

    impl Ledger {
        fn entries(&self, amounts: &[(i64, i64)]) -> Vec<NewPlayerSession> {
            self.players
                .iter()
                .zip(amounts)
                .map(|(player, &(buyin, walkout))| NewPlayerSession::new(player.id, buyin, walkout))
                .collect()
        }

        fn count(&self, table: &str) -> i64 {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            self.store
                .with_connection(|conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
                .unwrap()
        }

        fn assert_empty(&self) {
            assert_eq!(self.count("session"), 0);
            assert_eq!(self.count("player_session"), 0);
            assert_eq!(self.count("transfer"), 0);
        }
    }

    #[fixture]
    fn ledger() -> Ledger {
        let store = Store::in_memory().unwrap();
        let entities = EntityStore::new(store.clone());
        let engine = SettlementEngine::new(store.clone());
        let realm = entities.create_realm("crimson", Some("sux")).unwrap();
        let players = ["p1", "p2", "p3"]
            .iter()
            .map(|name| entities.create_player(name, realm.id).unwrap())
            .collect();

        Ledger {
            store,
            entities,
            engine,
            realm,
            players,
        }
    }

    #[rstest]
    fn test_christmas_night_transfers(ledger: Ledger) {
        let now = Utc::now();
        let entries = ledger.entries(&[(500, 1250), (1000, 0), (1500, 1)]);

        let session = ledger
            .engine
            .create_session(ledger.realm.id, Some("christmas poker night 2017"), now, &entries)
            .unwrap();

        assert!(session.id.get() > 0);
        assert_eq!(session.realm_id, ledger.realm.id);
        assert_eq!(session.name.as_deref(), Some("christmas poker night 2017"));
        assert_eq!(session.time.timestamp(), now.timestamp());

        let transfers: HashMap<PlayerId, i64> = ledger
            .entities
            .transfers_by_session_id(session.id)
            .unwrap()
            .into_iter()
            .map(|t| (t.player_id, t.amount))
            .collect();
        let p = &ledger.players;
        assert_eq!(transfers[&p[0].id], 750);
        assert_eq!(transfers[&p[1].id], -1000);
        assert_eq!(transfers[&p[2].id], -1499);
    }

    #[rstest]
    fn test_player_sessions_match_transfers(ledger: Ledger) {
        let entries = ledger.entries(&[(200, 0), (200, 650), (200, 150)]);
        let session = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap();

        let rows = ledger
            .entities
            .player_sessions_by_session_id(session.id)
            .unwrap();
        let transfers = ledger.entities.transfers_by_session_id(session.id).unwrap();

        assert_eq!(rows.len(), entries.len());
        assert_eq!(rows.len(), transfers.len());
        for (row, transfer) in rows.iter().zip(&transfers) {
            assert_eq!(row.player_id, transfer.player_id);
            assert_eq!(transfer.amount, row.walkout - row.buyin);
        }
    }

    #[rstest]
    fn test_session_time_stored_to_the_millisecond(ledger: Ledger) {
        let time = DateTime::<Utc>::from_timestamp_millis(1_513_900_800_250).unwrap();
        let entries = ledger.entries(&[(100, 100)]);

        let session = ledger
            .engine
            .create_session(ledger.realm.id, None, time, &entries)
            .unwrap();
        assert_eq!(session.time, time);
        assert_eq!(ledger.entities.session_by_id(session.id).unwrap(), session);
    }

    #[rstest]
    fn test_unknown_player_leaves_no_rows(ledger: Ledger) {
        let mut entries = ledger.entries(&[(500, 1250), (1000, 0)]);
        entries.push(NewPlayerSession::new(PlayerId(999), 100, 0));

        let err = ledger
            .engine
            .create_session(ledger.realm.id, Some("broken"), Utc::now(), &entries)
            .unwrap_err();

        assert_eq!(err, LedgerError::not_found("player", 999));
        ledger.assert_empty();
    }

    #[rstest]
    fn test_unknown_realm(ledger: Ledger) {
        let entries = ledger.entries(&[(500, 1250)]);
        let err = ledger
            .engine
            .create_session(RealmId(404), None, Utc::now(), &entries)
            .unwrap_err();

        assert_eq!(err, LedgerError::not_found("realm", 404));
        ledger.assert_empty();
    }

    #[rstest]
    fn test_player_from_other_realm(ledger: Ledger) {
        let other = ledger.entities.create_realm("azure", None).unwrap();
        let stranger = ledger.entities.create_player("stranger", other.id).unwrap();
        let mut entries = ledger.entries(&[(500, 600)]);
        entries.push(NewPlayerSession::new(stranger.id, 100, 0));

        let err = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        ledger.assert_empty();
    }

    #[rstest]
    fn test_duplicate_player_is_constraint_violation(ledger: Ledger) {
        let p1 = ledger.players[0].id;
        let entries = vec![
            NewPlayerSession::new(p1, 500, 1000),
            NewPlayerSession::new(ledger.players[1].id, 500, 0),
            NewPlayerSession::new(p1, 100, 100),
        ];

        let err = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        ledger.assert_empty();
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::negative_buyin(vec![(-1, 100)])]
    #[case::negative_walkout(vec![(100, -5)])]
    fn test_invalid_input_rejected(ledger: Ledger, #[case] amounts: Vec<(i64, i64)>) {
        let entries = ledger.entries(&amounts);
        let err = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        ledger.assert_empty();
    }

    #[rstest]
    fn test_cancelled_settlement_rolls_back(ledger: Ledger) {
        let entries = ledger.entries(&[(500, 1250), (1000, 0), (1500, 1)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = ledger
            .engine
            .create_session_with_cancel(ledger.realm.id, None, Utc::now(), &entries, &cancel)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        ledger.assert_empty();
    }

    #[rstest]
    fn test_identical_calls_create_distinct_sessions(ledger: Ledger) {
        let now = Utc::now();
        let entries = ledger.entries(&[(500, 1250), (1000, 0), (1500, 1)]);

        let first = ledger
            .engine
            .create_session(ledger.realm.id, Some("same"), now, &entries)
            .unwrap();
        let second = ledger
            .engine
            .create_session(ledger.realm.id, Some("same"), now, &entries)
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(ledger.count("session"), 2);
        assert_eq!(ledger.count("player_session"), 6);
        assert_eq!(ledger.count("transfer"), 6);
    }

    #[rstest]
    fn test_failed_call_does_not_disturb_committed_sessions(ledger: Ledger) {
        let entries = ledger.entries(&[(100, 300), (200, 0)]);
        let committed = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap();

        let mut broken = ledger.entries(&[(50, 0)]);
        broken.push(NewPlayerSession::new(PlayerId(999), 1, 1));
        assert!(ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &broken)
            .is_err());

        assert_eq!(ledger.count("session"), 1);
        assert_eq!(
            ledger.entities.transfers_by_session_id(committed.id).unwrap().len(),
            2
        );
    }

    #[rstest]
    fn test_unbalanced_session_is_recorded(ledger: Ledger) {
        // walkouts exceed buy-ins by 1000; recorded as declared
        let entries = ledger.entries(&[(100, 1100), (100, 100)]);
        let session = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap();

        assert_eq!(
            ledger.entities.transfers_by_session_id(session.id).unwrap().len(),
            2
        );
    }

    #[rstest]
    #[case::balanced(vec![NewPlayerSession::new(PlayerId(1), 100, 50), NewPlayerSession::new(PlayerId(2), 100, 150)], 0)]
    #[case::short(vec![NewPlayerSession::new(PlayerId(1), 500, 1250), NewPlayerSession::new(PlayerId(2), 1000, 0)], -250)]
    fn test_validate_entries_imbalance(
        #[case] entries: Vec<NewPlayerSession>,
        #[case] expected: i128,
    ) {
        assert_eq!(validate_entries(&entries).unwrap(), expected);
    }

    #[rstest]
    fn test_huge_walkouts_are_recorded(ledger: Ledger) {
        // the imbalance exceeds i64; it is only reported, never rejected
        let entries = ledger.entries(&[(0, i64::MAX), (0, i64::MAX)]);
        let session = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &entries)
            .unwrap();

        let amounts: Vec<i64> = ledger
            .entities
            .transfers_by_session_id(session.id)
            .unwrap()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![i64::MAX, i64::MAX]);
        assert_eq!(
            validate_entries(&entries).unwrap(),
            2 * i128::from(i64::MAX)
        );
    }

    #[rstest]
    fn test_cancelled_token_wins_over_lookup_errors(ledger: Ledger) {
        let entries = vec![NewPlayerSession::new(PlayerId(999), 1, 1)];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = ledger
            .engine
            .create_session_with_cancel(RealmId(404), None, Utc::now(), &entries, &cancel)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        ledger.assert_empty();
    }

    #[rstest]
    fn test_rolled_back_ids_are_not_reused(ledger: Ledger) {
        let first = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &ledger.entries(&[(10, 20)]))
            .unwrap();

        // duplicate player: session row and first player rows are written, then rolled back
        let mut duplicate = ledger.entries(&[(10, 20), (30, 40)]);
        let again = duplicate[0];
        duplicate.push(again);
        let err = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &duplicate)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        let second = ledger
            .engine
            .create_session(ledger.realm.id, None, Utc::now(), &ledger.entries(&[(10, 20)]))
            .unwrap();

        assert_eq!(first.id, SessionId(1));
        assert_eq!(second.id, SessionId(3));

        let first_transfer = ledger.entities.transfers_by_session_id(first.id).unwrap()[0].id;
        let second_transfer = ledger.entities.transfers_by_session_id(second.id).unwrap()[0].id;
        assert_eq!(first_transfer.get(), 1);
        // ids 2..=4 went to the rolled-back attempt
        assert_eq!(second_transfer.get(), 5);
    }
}
