//! Store-generated identifiers
//!
//! Every identity in the ledger is an integer assigned by the store at insert
//! time. Each entity gets its own newtype so a player id can never be passed
//! where a session id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw integer value as stored in the database
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ledger_id!(
    /// Realm identifier
    RealmId
);

ledger_id!(
    /// Player identifier
    PlayerId
);

ledger_id!(
    /// Session identifier
    SessionId
);

ledger_id!(
    /// Transfer identifier
    TransferId
);
