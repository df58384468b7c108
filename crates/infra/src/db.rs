//! Connection pool bootstrap and schema migrations.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::instrument;

use crate::error::{map_sqlx_error, StoreError, StoreResult};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits for a competing write transaction to finish.
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A private in-memory database (tests, demos).
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Open the pool and bring the schema up to date.
///
/// In-memory databases live and die with their connection, so they are
/// pinned to a single long-lived connection that every caller shares.
#[instrument(skip(config), fields(url = %config.url), err)]
pub async fn connect(config: &DbConfig) -> StoreResult<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| map_sqlx_error("connect", e))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| StoreError::storage("migrate", e.to_string()))?;

    tracing::info!("database ready");
    Ok(pool)
}
