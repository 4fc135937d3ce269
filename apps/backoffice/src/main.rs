//! # Caja Back-Office Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caja Back Office                                 │
//! │                                                                         │
//! │   UI / script ──stdin──► {"command": "...", "args": {...}}             │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  main.rs ────► logging, then caja_app::run                       │  │
//! │  │  dispatch ───► Request ──► commands/ ──► caja-db repositories    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                        caja.db (SQLite, WAL)                            │
//! │                                                                         │
//! │   UI / script ◄─stdout── {"ok": true, "data": ...}                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    caja_app::init_tracing();

    match caja_app::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Back office stopped");
            ExitCode::FAILURE
        }
    }
}
