//! Asynchronous front for the settlement engine
//!
//! SQLite calls block, so the async engine moves each settlement onto tokio's
//! blocking pool and ties the transaction's lifetime to the caller's future:
//!
//! - Dropping the future cancels the settlement
//! - An optional per-call timeout cancels it as well
//!
//! A cancelled settlement rolls back at its next checkpoint. If it had
//! already committed, the committed session is reported instead.

pub mod engine;

pub use engine::{AsyncConfig, AsyncSettlementEngine};
