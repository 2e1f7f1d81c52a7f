use crate::core::r#async::AsyncConfig;
use crate::core::store::StoreConfig;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Record poker sessions and settle buy-ins against walkouts
#[derive(Parser, Debug)]
#[command(name = "poker-ledger")]
#[command(about = "Record poker sessions and settle buy-ins against walkouts", long_about = None)]
pub struct CliArgs {
    /// SQLite database file
    #[arg(
        long = "db",
        value_name = "PATH",
        default_value = "poker-ledger.db",
        global = true,
        help = "Path to the SQLite database file"
    )]
    pub db: PathBuf,

    /// Use a throwaway in-memory database instead of `--db`
    #[arg(long = "memory", global = true)]
    pub memory: bool,

    /// How long to wait for a locked database
    #[arg(
        long = "busy-timeout-ms",
        value_name = "MS",
        global = true,
        help = "Milliseconds to wait for a locked database (default: 5000)"
    )]
    pub busy_timeout_ms: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        global = true
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply the schema
    Init,

    /// Create a realm
    CreateRealm {
        #[arg(long)]
        name: String,
        #[arg(long)]
        title: Option<String>,
    },

    /// Create a player in a realm
    CreatePlayer {
        #[arg(long)]
        name: String,
        #[arg(long = "realm-id")]
        realm_id: i64,
    },

    /// Settle a ledger CSV as a new session and print its transfers
    RecordSession {
        #[arg(long = "realm-id")]
        realm_id: i64,

        #[arg(long)]
        name: Option<String>,

        /// When the game took place (RFC 3339, default: now)
        #[arg(long, value_name = "RFC3339")]
        time: Option<DateTime<Utc>>,

        /// Reading/settlement strategy
        #[arg(
            long = "strategy",
            value_name = "STRATEGY",
            default_value = "sync",
            help = "Recording strategy: 'sync' for synchronous or 'async' for asynchronous"
        )]
        strategy: StrategyType,

        /// Upper bound on the settlement (async strategy only)
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Ledger CSV with `player,buyin,walkout` rows
        #[arg(value_name = "LEDGER_CSV")]
        ledger: PathBuf,
    },

    /// Look up a realm by name
    Realm {
        #[arg(long)]
        name: String,
    },

    /// Look up a player by id
    Player {
        #[arg(long)]
        id: i64,
    },

    /// Look up a session by id
    Session {
        #[arg(long)]
        id: i64,
    },

    /// List the sessions of a realm
    Sessions {
        #[arg(long = "realm-id")]
        realm_id: i64,
    },

    /// Totals and imbalance of a session
    Summary {
        #[arg(long = "session-id")]
        session_id: i64,
    },
}

/// Available recording strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a StoreConfig from the global options
    ///
    /// `--memory` wins over `--db`. A zero busy timeout falls back to the
    /// default with a warning.
    pub fn to_store_config(&self) -> StoreConfig {
        let config = if self.memory {
            StoreConfig::memory()
        } else {
            StoreConfig::file(&self.db)
        };

        match self.busy_timeout_ms {
            Some(ms) => config.with_busy_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}

impl Command {
    /// Create an AsyncConfig from `record-session` options
    ///
    /// Other subcommands never settle asynchronously and get `None`.
    pub fn to_async_config(&self) -> Option<AsyncConfig> {
        match self {
            Command::RecordSession {
                strategy: StrategyType::Async,
                timeout_ms,
                ..
            } => Some(
                timeout_ms
                    .map(|ms| AsyncConfig::with_timeout(Duration::from_millis(ms)))
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }
}
