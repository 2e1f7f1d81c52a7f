//! Error types for the poker ledger
//!
//! Every failure the core can report is a [`LedgerError`]. Each variant maps
//! onto one [`ErrorKind`], which is what callers branch on.
//!
//! # Error Categories
//!
//! - **Input Errors**: empty batches, negative amounts, blank names
//! - **Lookup Errors**: referenced realm/player/session absent
//! - **Store Errors**: unique, primary-key and foreign-key violations
//! - **Transaction Errors**: anything that aborts a settlement mid-flight
//! - **I/O Errors**: ledger files and CSV output

use rusqlite::ffi;
use thiserror::Error;

/// Classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    ConstraintViolation,
    ForeignKeyViolation,
    TransactionAborted,
    Storage,
    Io,
}

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed or missing caller input
    ///
    /// Always rejected before any storage access.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input
        reason: String,
    },

    /// A referenced entity does not exist
    #[error("{entity} {key} not found")]
    NotFound {
        /// Entity kind, e.g. "realm"
        entity: &'static str,
        /// Key that was looked up
        key: String,
    },

    /// Unique, primary-key or check constraint rejected by the store
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        /// Message reported by the store
        message: String,
    },

    /// Foreign-key constraint rejected by the store
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        /// Message reported by the store
        message: String,
    },

    /// A settlement transaction was rolled back
    ///
    /// Nothing written by the aborted call is visible.
    #[error("Transaction aborted: {reason}")]
    TransactionAborted {
        /// Underlying cause
        reason: String,
    },

    /// Connection-level storage failure
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// File or CSV failure in the front-end adapters
    #[error("I/O error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Io {
        /// Ledger line number (if available)
        line: Option<u64>,
        /// Description of the failure
        message: String,
    },
}

impl LedgerError {
    /// Kind tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            LedgerError::ForeignKeyViolation { .. } => ErrorKind::ForeignKeyViolation,
            LedgerError::TransactionAborted { .. } => ErrorKind::TransactionAborted,
            LedgerError::Storage { .. } => ErrorKind::Storage,
            LedgerError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a TransactionAborted error
    pub fn transaction_aborted(reason: impl Into<String>) -> Self {
        LedgerError::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }

    /// Reclassify a failure that happened inside a settlement transaction
    ///
    /// Lookup and constraint failures keep their kind; everything else
    /// becomes `TransactionAborted`.
    pub fn into_aborted(self) -> Self {
        match self {
            LedgerError::InvalidArgument { .. }
            | LedgerError::NotFound { .. }
            | LedgerError::ConstraintViolation { .. }
            | LedgerError::ForeignKeyViolation { .. }
            | LedgerError::TransactionAborted { .. } => self,
            LedgerError::Storage { message } => LedgerError::TransactionAborted { reason: message },
            LedgerError::Io { message, .. } => LedgerError::TransactionAborted { reason: message },
        }
    }
}

// Conversion from rusqlite::Error to LedgerError, classifying constraint codes
impl From<rusqlite::Error> for LedgerError {
    fn from(error: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &error {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = message.clone().unwrap_or_else(|| error.to_string());
                return if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    LedgerError::ForeignKeyViolation { message }
                } else {
                    LedgerError::ConstraintViolation { message }
                };
            }
        }

        LedgerError::Storage {
            message: error.to_string(),
        }
    }
}

// Conversion from io::Error to LedgerError
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            line: None,
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to LedgerError
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::Io {
            line,
            message: error.to_string(),
        }
    }
}
