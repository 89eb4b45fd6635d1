//! # Local Store Handle
//!
//! Opens the register's SQLite file and hands out repositories.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::new(DbConfig::new(path))                                     │
//! │       │  open or create the file, WAL journal, migrate                  │
//! │       ▼                                                                 │
//! │  SqlitePool (a few connections, one register process)                   │
//! │       │                                                                 │
//! │       ├── drafts()   ──► parked sales   ─┐                              │
//! │       ├── settings() ──► tax rate        ├──► kv_store                  │
//! │       └── kv()       ──► raw keys       ─┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every parked sale lives in one `kv_store` row that is rewritten on each
//! save or restore. With the WAL journal a crash mid-rewrite leaves the last
//! committed collection readable on the next start, and a startup read of the
//! draft count never waits on an in-flight save.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::draft::DraftRepository;
use crate::repository::kv::KvRepository;
use crate::repository::settings::SettingsRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the local store lives and how many connections it may hold.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// The register issues one command at a time; a small pool covers the
    /// command loop plus startup reads.
    pub max_connections: u32,
    /// How long a command waits for a free connection.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Store file at `path`, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    /// Private in-memory store for tests.
    ///
    /// Each SQLite connection to `:memory:` is its own database, so the pool
    /// is pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle on the local store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the store and applies pending migrations.
    ///
    /// ## Errors
    /// - `ConnectionFailed` when the file cannot be opened
    /// - `MigrationFailed` when the schema cannot be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening local store");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // a power cut may drop the last committed draft, never corrupt the row
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Store pool ready");

        migrations::run_migrations(&pool).await?;
        info!("Local store ready");

        Ok(Database { pool })
    }

    /// The underlying pool, for migration status and ad-hoc queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn kv(&self) -> KvRepository {
        KvRepository::new(self.pool.clone())
    }

    /// Parked sales.
    pub fn drafts(&self) -> DraftRepository {
        DraftRepository::new(self.pool.clone())
    }

    /// Operator settings (tax rate).
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Waits for in-flight writes and closes every connection.
    pub async fn close(&self) {
        info!("Closing local store");
        self.pool.close().await;
    }

    /// True when the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
