//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ## Thread Safety
//! The `Database` struct from `caja-db` holds a `SqlitePool`, which is
//! thread-safe. The dispatcher still runs one request at a time, so no two
//! postings are ever in flight together.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn get_sale(db: &DbState, args: IdArgs) -> Result<SaleDetail, ApiError> {
//!     Ok(db.inner().sales().get(&args.id).await?)
//! }
//! ```

use caja_db::Database;

/// Wrapper around `Database` handed to every command.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
