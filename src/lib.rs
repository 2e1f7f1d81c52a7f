//! Poker Ledger Library
//! # Overview
//!
//! Records poker sessions played within a realm and settles each player's
//! buy-in against their walkout. A session, its participation rows and the
//! derived transfers are written in one SQLite transaction: either all of
//! them are committed or none are.
//!
//! # Architecture
//!
//! - [`types`] - Ids, entities and the [`LedgerError`] taxonomy
//! - [`core`] - Storage and business logic:
//!   - [`core::store`] - Shared SQLite handle and schema
//!   - [`core::entity_store`] - Realms and players
//!   - [`core::settlement`] - Transactional session recording
//!   - [`core::lookup`] - Read-only lookups
//! - [`io`] - Ledger CSV input and CSV output
//! - [`strategy`] - Sync and async recording pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use poker_ledger::{EntityStore, NewPlayerSession, SettlementEngine, Store};
//!
//! let store = Store::in_memory().unwrap();
//! let entities = EntityStore::new(store.clone());
//! let realm = entities.create_realm("crimson", Some("sux")).unwrap();
//! let p1 = entities.create_player("p1", realm.id).unwrap();
//! let p2 = entities.create_player("p2", realm.id).unwrap();
//!
//! let session = SettlementEngine::new(store.clone())
//!     .create_session(
//!         realm.id,
//!         Some("christmas poker night 2017"),
//!         Utc::now(),
//!         &[NewPlayerSession::new(p1.id, 500, 1250), NewPlayerSession::new(p2.id, 1000, 0)],
//!     )
//!     .unwrap();
//!
//! let amounts: Vec<i64> = entities
//!     .transfers_by_session_id(session.id)
//!     .unwrap()
//!     .iter()
//!     .map(|t| t.amount)
//!     .collect();
//! assert_eq!(amounts, vec![750, -1000]);
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AsyncConfig, AsyncSettlementEngine, EntityStore, LedgerReader, LookupFacade,
    SettlementEngine, Store, StoreConfig,
};
pub use io::write_settlement_csv;
pub use types::{
    ErrorKind, LedgerError, NewPlayerSession, Player, PlayerId, PlayerSession, Realm, RealmId,
    Session, SessionId, SessionSummary, Transfer, TransferId,
};
