//! SQLite access for the database-backed root handler.
//!
//! Provides:
//! - An r2d2 connection pool over a file or in-memory database
//! - The `SELECT 1` health query, run off the async runtime

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

/// Path values that select an in-memory database.
const MEMORY_PATHS: [&str; 2] = [":memory:", "file::memory:?cache=shared"];

const HEALTH_QUERY: &str = "SELECT 1";

/// How long pool creation waits for its first connections.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for database operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Pooled SQLite handle.
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open a pool for the given path.
    ///
    /// `:memory:` gives each pooled connection its own in-memory database,
    /// which is enough for the health query.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot establish its connections.
    pub fn open(path: &str, max_size: u32) -> Result<Self, StorageError> {
        let manager = if MEMORY_PATHS.contains(&path) {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path)
        };

        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)?;

        tracing::debug!(path, max_size, "Opened SQLite pool");
        Ok(Self { pool })
    }

    /// Run the `SELECT 1` health query.
    pub async fn select_one(&self) -> Result<i64, StorageError> {
        let span = tracing::info_span!(
            "db.query",
            otel.kind = "client",
            db.system = "sqlite",
            db.statement = HEALTH_QUERY,
        );

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<i64, StorageError> {
            let conn = pool.get()?;
            let value = conn.query_row(HEALTH_QUERY, [], |row| row.get::<_, i64>(0))?;
            Ok(value)
        })
        .instrument(span)
        .await?
    }
}
