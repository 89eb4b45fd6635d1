//! # Database State
//!
//! Wraps the `Database` connection for use in register commands.
//!
//! ## Thread Safety
//! The `Database` struct from `tally-db` contains a `SqlitePool` which
//! is inherently thread-safe. Commands can run store operations without
//! explicit locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_drafts(db: &DbState) -> Result<Vec<Draft>, ApiError> {
//!     Ok(db.inner().drafts().list().await?)
//! }
//! ```

use tally_db::Database;

/// Wrapper around `Database` for register state management.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
