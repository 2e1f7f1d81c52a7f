//! I/O module
//!
//! Handles ledger CSV parsing and CSV output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Synchronous ledger reader with iterator interface
//! - `async_reader` - Asynchronous ledger reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_ledger_record, settlement_lines, write_rows_csv, write_settlement_csv,
    write_summary_csv, LedgerCsvRecord, SettlementLine,
};
pub use sync_reader::SyncReader;
