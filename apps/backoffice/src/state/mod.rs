//! # State Module
//!
//! State handed to every command by the dispatcher.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  main.rs                                                               │
//! │  ├── DbState::new(Database::new(config).await?)                        │
//! │  └── ConfigState::from_env()                                           │
//! │                              │                                          │
//! │                 ┌────────────┴────────────┐                             │
//! │                 ▼                         ▼                             │
//! │  ┌──────────────────────┐  ┌──────────────────────────┐                │
//! │  │   DbState            │  │   ConfigState            │                │
//! │  │                      │  │                          │                │
//! │  │   Database           │  │   store_name             │                │
//! │  │   (SQLite pool)      │  │   currency, tax rate     │                │
//! │  └──────────────────────┘  └──────────────────────────┘                │
//! │                                                                         │
//! │  Both are passed explicitly; nothing lives in a global.                │
//! │  • DbState: pool is internally synchronised                            │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::{database_path, ConfigState};
pub use db::DbState;
