//! Poker Ledger CLI
//!
//! Command-line interface for recording poker sessions from ledger CSV files.
//!
//! # Usage
//!
//! ```bash
//! poker-ledger init
//! poker-ledger create-realm --name crimson --title sux
//! poker-ledger create-player --name p1 --realm-id 1
//! poker-ledger record-session --realm-id 1 --name "christmas" ledger.csv > transfers.csv
//! poker-ledger record-session --realm-id 1 --strategy async --timeout-ms 2000 ledger.csv
//! poker-ledger summary --session-id 1
//! ```
//!
//! Results are written to stdout as CSV; logs go to stderr (`RUST_LOG`
//! overrides `--log-level`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, unknown realm or player, constraint violation, etc.)

use chrono::Utc;
use poker_ledger::cli::{self, CliArgs, Command};
use poker_ledger::core::{EntityStore, LedgerReader, LookupFacade, Store};
use poker_ledger::io::{write_rows_csv, write_summary_csv};
use poker_ledger::strategy::{self, SessionRequest};
use poker_ledger::types::{LedgerError, PlayerId, RealmId, SessionId};
use std::io::Write;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();
    init_tracing(&args.log_level);

    let mut output = std::io::stdout().lock();
    if let Err(e) = run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), LedgerError> {
    let store = Store::open(&args.to_store_config())?;
    store.migrate()?;

    let entities = EntityStore::new(store.clone());
    let lookup = LookupFacade::new(store.clone());

    match &args.command {
        Command::Init => {
            tracing::info!("Schema ready");
        }
        Command::CreateRealm { name, title } => {
            let realm = entities.create_realm(name, title.as_deref())?;
            write_rows_csv(&[realm], output)?;
        }
        Command::CreatePlayer { name, realm_id } => {
            let player = entities.create_player(name, RealmId(*realm_id))?;
            write_rows_csv(&[player], output)?;
        }
        Command::RecordSession {
            realm_id,
            name,
            time,
            strategy: strategy_type,
            ledger,
            ..
        } => {
            let request = SessionRequest::new(
                RealmId(*realm_id),
                name.clone(),
                time.unwrap_or_else(Utc::now),
            );
            let strategy = strategy::create_strategy(*strategy_type, args.command.to_async_config());
            strategy.record(&store, &request, ledger, output)?;
        }
        Command::Realm { name } => {
            write_rows_csv(&[lookup.realm_by_name(name)?], output)?;
        }
        Command::Player { id } => {
            write_rows_csv(&[lookup.player_by_id(PlayerId(*id))?], output)?;
        }
        Command::Session { id } => {
            write_rows_csv(&[lookup.session_by_id(SessionId(*id))?], output)?;
        }
        Command::Sessions { realm_id } => {
            write_rows_csv(&lookup.sessions_by_realm_id(RealmId(*realm_id))?, output)?;
        }
        Command::Summary { session_id } => {
            write_summary_csv(&lookup.session_summary(SessionId(*session_id))?, output)?;
        }
    }

    Ok(())
}
