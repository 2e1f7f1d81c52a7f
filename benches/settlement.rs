//! Benchmark suite for session settlement
//!
//! Measures recording throughput of the settlement engine and of both
//! recording strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Every iteration records one new session on an in-memory store seeded with
//! one realm and as many players as the session has participants.

use chrono::Utc;
use poker_ledger::cli::StrategyType;
use poker_ledger::strategy::{create_strategy, SessionRequest};
use poker_ledger::{EntityStore, NewPlayerSession, RealmId, SettlementEngine, Store};
use std::io::Write;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

fn seeded_store(players: usize) -> (Store, RealmId, Vec<NewPlayerSession>) {
    let store = Store::in_memory().expect("Failed to open store");
    let entities = EntityStore::new(store.clone());
    let realm = entities
        .create_realm("bench", None)
        .expect("Failed to create realm");

    let entries = (0..players)
        .map(|i| {
            let player = entities
                .create_player(&format!("p{}", i), realm.id)
                .expect("Failed to create player");
            NewPlayerSession::new(player.id, 1000, (i as i64 * 37) % 2000)
        })
        .collect();

    (store, realm.id, entries)
}

fn ledger_file(entries: &[NewPlayerSession]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "player,buyin,walkout").expect("Failed to write header");
    for entry in entries {
        writeln!(file, "{},{},{}", entry.player_id, entry.buyin, entry.walkout)
            .expect("Failed to write row");
    }
    file.flush().expect("Failed to flush ledger");
    file
}

/// Settlement engine alone, by number of participants
#[divan::bench(args = [2, 9, 100, 1000])]
fn create_session(bencher: divan::Bencher, players: usize) {
    let (store, realm_id, entries) = seeded_store(players);
    let engine = SettlementEngine::new(store);

    bencher.bench_local(|| {
        engine
            .create_session(realm_id, None, Utc::now(), &entries)
            .expect("Settlement failed")
    });
}

fn record_ledger(bencher: divan::Bencher, strategy_type: StrategyType) {
    let (store, realm_id, entries) = seeded_store(100);
    let ledger = ledger_file(&entries);
    let strategy = create_strategy(strategy_type, None);
    let request = SessionRequest::new(realm_id, None, Utc::now());

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .record(&store, &request, ledger.path(), &mut output)
            .expect("Recording failed");
        output
    });
}

/// Full synchronous pipeline: read ledger CSV, settle, write transfers
#[divan::bench]
fn record_ledger_sync(bencher: divan::Bencher) {
    record_ledger(bencher, StrategyType::Sync);
}

/// Full asynchronous pipeline (runtime per request)
#[divan::bench]
fn record_ledger_async(bencher: divan::Bencher) {
    record_ledger(bencher, StrategyType::Async);
}
