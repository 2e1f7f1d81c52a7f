//! CSV format handling for ledgers and lookup output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `LedgerCsvRecord` for deserializing one player's buy-in/walkout row
//! - Conversion from ledger rows to `NewPlayerSession`
//! - Settlement, summary and generic row output
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{LedgerError, NewPlayerSession, PlayerId, PlayerSession, SessionSummary, Transfer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

/// One ledger row: `player,buyin,walkout`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LedgerCsvRecord {
    pub player: i64,
    pub buyin: i64,
    pub walkout: i64,
}

/// Convert a ledger row into a settlement entry
///
/// Negative amounts are rejected here so that a bad ledger fails with the
/// offending line instead of at settlement time.
pub fn convert_ledger_record(record: LedgerCsvRecord) -> Result<NewPlayerSession, LedgerError> {
    if record.buyin < 0 {
        return Err(LedgerError::invalid_argument(format!(
            "negative buyin {} for player {}",
            record.buyin, record.player
        )));
    }
    if record.walkout < 0 {
        return Err(LedgerError::invalid_argument(format!(
            "negative walkout {} for player {}",
            record.walkout, record.player
        )));
    }

    Ok(NewPlayerSession::new(
        PlayerId(record.player),
        record.buyin,
        record.walkout,
    ))
}

/// One output row of a settled session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementLine {
    pub player: PlayerId,
    pub buyin: i64,
    pub walkout: i64,
    pub amount: i64,
}

/// Pair participation rows with their transfers, sorted by player id
///
/// # Errors
///
/// `NotFound` if a participation row has no transfer, which would mean the
/// store lost the one-to-one correspondence between the two tables.
pub fn settlement_lines(
    rows: &[PlayerSession],
    transfers: &[Transfer],
) -> Result<Vec<SettlementLine>, LedgerError> {
    let amounts: HashMap<PlayerId, i64> = transfers
        .iter()
        .map(|t| (t.player_id, t.amount))
        .collect();

    let mut lines = rows
        .iter()
        .map(|ps| {
            let amount = amounts.get(&ps.player_id).copied().ok_or_else(|| {
                LedgerError::not_found(
                    "transfer",
                    format!("(player {}, session {})", ps.player_id, ps.session_id),
                )
            })?;
            Ok(SettlementLine {
                player: ps.player_id,
                buyin: ps.buyin,
                walkout: ps.walkout,
                amount,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    lines.sort_by_key(|line| line.player);
    Ok(lines)
}

/// Write settled lines as `player,buyin,walkout,amount`
pub fn write_settlement_csv(
    lines: &[SettlementLine],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["player", "buyin", "walkout", "amount"])?;
    for line in lines {
        writer.write_record(&[
            line.player.to_string(),
            line.buyin.to_string(),
            line.walkout.to_string(),
            line.amount.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a session summary as a single flat row
pub fn write_summary_csv(summary: &SessionSummary, output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "session",
        "realm",
        "name",
        "time",
        "players",
        "total_buyin",
        "total_walkout",
        "imbalance",
    ])?;
    writer.write_record(&[
        summary.session.id.to_string(),
        summary.session.realm_id.to_string(),
        summary.session.name.clone().unwrap_or_default(),
        summary.session.time.to_rfc3339(),
        summary.player_count.to_string(),
        summary.total_buyin.to_string(),
        summary.total_walkout.to_string(),
        summary.imbalance.to_string(),
    ])?;

    writer.flush()?;
    Ok(())
}

/// Write flat rows (realms, players, sessions) with a header taken from field names
pub fn write_rows_csv<T: Serialize>(rows: &[T], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
