//! # Caja Back-Office Library
//!
//! Command layer over `caja-db`. The `caja` binary reads one JSON request
//! per line on stdin and writes one JSON response per line on stdout; logs
//! go to stderr so the two streams never mix.
//!
//! ## Module Organization
//! ```text
//! caja_app/
//! ├── lib.rs          ◄─── You are here (startup & request loop)
//! ├── dispatch.rs     ◄─── Request enum, Response envelope
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── config.rs   ◄─── Store configuration, database path
//! ├── commands/       ◄─── One async fn per operation
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────────┐              ┌──────────────────────┐            │
//! │  │    DbState       │              │    ConfigState       │            │
//! │  │                  │              │                      │            │
//! │  │  • Database pool │              │  • Store name        │            │
//! │  │  • Repositories  │              │  • Currency, tax     │            │
//! │  └──────────────────┘              └──────────────────────┘            │
//! │                                                                         │
//! │  Each command takes only the state it needs.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod state;

use std::error::Error;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use caja_db::{Database, DbConfig};
use dispatch::handle_line;
use state::{database_path, ConfigState, DbState};

/// Runs the back office until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Determine Database Path ──────────────────────────────────────────► │
/// │     • CAJA_DB_PATH if set                                               │
/// │     • else the platform data directory + caja.db                        │
/// │                                                                         │
/// │  2. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, foreign keys on                             │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  3. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState: Wraps Database connection                                │
/// │     • ConfigState: Defaults overridden by CAJA_* variables             │
/// │                                                                         │
/// │  4. Request Loop ─────────────────────────────────────────────────────► │
/// │     • One line in, one line out, in order                               │
/// │     • Blank lines are skipped                                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn Error>> {
    info!("Starting Caja back office");

    let db_path = database_path()?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let db_state = DbState::new(db);
    let config = ConfigState::from_env();
    info!(store = %config.store_name, currency = %config.currency_code, "State initialized");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(&db_state, &config, line).await;
        debug!(ok = response.ok, "Request handled");

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    db_state.inner().close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=caja=trace` - Show trace for caja crates only
/// - Default: INFO, with debug for caja crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caja=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
