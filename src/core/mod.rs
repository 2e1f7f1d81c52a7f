//! Core ledger module
//!
//! - `store` - SQLite handle, configuration, schema and row decoders
//! - `entity_store` - Realm/player creation and parent-keyed reads
//! - `settlement` - Atomic session recording with derived transfers
//! - `lookup` - Read-only facade implementing [`traits::LedgerReader`]
//! - `traits` - Trait abstractions for query-serving layers
//! - `async` - Settlement for async callers (timeout, cancellation)

pub mod r#async;
pub mod entity_store;
pub mod lookup;
pub mod settlement;
pub mod store;
pub mod traits;

pub use entity_store::EntityStore;
pub use lookup::LookupFacade;
pub use r#async::{AsyncConfig, AsyncSettlementEngine};
pub use settlement::SettlementEngine;
pub use store::{Store, StoreConfig, StoreLocation};
pub use traits::LedgerReader;
