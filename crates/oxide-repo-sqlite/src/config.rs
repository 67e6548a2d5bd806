//! Connection settings.

use std::str::FromStr;

use clap::Args;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::Result;

/// SQLite connection settings, flattenable into a host CLI with
/// `#[command(flatten)]`.
#[derive(Debug, Clone, Args)]
pub struct SqliteConfig {
    /// Database URL (SQLite path or connection string).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    /// Enforce foreign keys on every connection.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_url: String::from("sqlite::memory:"),
            max_connections: 5,
            foreign_keys: true,
        }
    }
}

impl SqliteConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub const fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Returns whether the database lives in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Opens a pool, creating the database file if needed.
    ///
    /// Each in-memory connection is a separate database, so in-memory
    /// pools hold exactly one connection that is never recycled.
    ///
    /// # Errors
    ///
    /// Returns the database error for malformed URLs or failed connects.
    pub async fn connect(&self) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .foreign_keys(self.foreign_keys);
        let pool = if self.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.max_connections)
        };
        info!(url = %self.database_url, foreign_keys = self.foreign_keys, "Connecting to SQLite");
        Ok(pool.connect_with(options).await?)
    }
}
