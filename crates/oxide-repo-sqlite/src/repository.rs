//! SQLite repository facade.

use oxide_repo::{Entity, EntitySet, QueryBuilder, Repository};
use oxide_repo_core::meta::EntityMeta;
use oxide_repo_core::schema::MigrationPlan;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Connection, Sqlite, Transaction};
use tracing::{info, warn};

use crate::config::SqliteConfig;
use crate::dialect::SqliteDialect;
use crate::error::Result;
use crate::executor::SqliteExecutor;

/// A [`Repository`] bound to a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    repository: Repository,
    foreign_keys: bool,
}

impl SqliteRepository {
    /// Wraps an existing pool whose connections enforce foreign keys.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            repository: Repository::new(SqliteDialect::new()),
            foreign_keys: true,
        }
    }

    /// Connects with `config`.
    ///
    /// # Errors
    ///
    /// Returns the database error when the pool cannot be opened.
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        let pool = config.connect().await?;
        Ok(Self {
            foreign_keys: config.foreign_keys,
            ..Self::new(pool)
        })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    #[must_use]
    pub fn entities<E: Entity>(&self) -> EntitySet<E> {
        self.repository.entities()
    }

    #[must_use]
    pub fn query<E: Entity>(&self) -> QueryBuilder<E> {
        self.repository.query()
    }

    /// Executor over a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns the database error when no connection can be acquired.
    pub async fn executor(&self) -> Result<SqliteExecutor<PoolConnection<Sqlite>>> {
        let conn = self.pool.acquire().await?;
        Ok(SqliteExecutor::new(conn, self.repository.shared_registry()))
    }

    /// Executor over a new transaction; commit it to keep its changes.
    ///
    /// # Errors
    ///
    /// Returns the database error when the transaction cannot start.
    pub async fn begin(&self) -> Result<SqliteExecutor<Transaction<'static, Sqlite>>> {
        let tx = self.pool.begin().await?;
        Ok(SqliteExecutor::new(tx, self.repository.shared_registry()))
    }

    /// Creates the tables of `entities` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns planning or database errors; nothing is created then.
    pub async fn create_repository(&self, entities: &[&EntityMeta]) -> Result<MigrationPlan> {
        let mut executor = self.begin().await?;
        let plan = self.repository.create_schema(&mut executor, entities).await?;
        executor.commit().await?;
        Ok(plan)
    }

    /// Upgrades the database to the schema `entities` expect.
    ///
    /// Foreign key enforcement is switched off around the transaction so
    /// tables can be rebuilt, and every key is checked before commit. The
    /// setting is restored even when the upgrade fails.
    ///
    /// # Errors
    ///
    /// Returns introspection, planning, database or foreign key errors;
    /// the database is left unchanged then.
    pub async fn upgrade_repository(&self, entities: &[&EntityMeta]) -> Result<MigrationPlan> {
        let mut conn = self.pool.acquire().await?;
        // The pragma is a no-op inside a transaction.
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
        let outcome = self.upgrade_on(&mut conn, entities).await;
        let restore = if self.foreign_keys {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        };
        let restored = sqlx::query(restore).execute(&mut *conn).await;
        if let Err(e) = &outcome {
            warn!(error = %e, "Schema upgrade rolled back");
        }
        let plan = outcome?;
        restored?;
        info!(steps = plan.len(), "Schema upgrade committed");
        Ok(plan)
    }

    async fn upgrade_on(&self, conn: &mut SqliteConnection, entities: &[&EntityMeta]) -> Result<MigrationPlan> {
        let tx = conn.begin().await?;
        let mut executor = SqliteExecutor::new(tx, self.repository.shared_registry());
        let outcome = match self.repository.upgrade_schema(&mut executor, entities).await {
            Ok(plan) => executor.check_foreign_keys().await.map(|()| plan),
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(plan) => {
                executor.commit().await?;
                Ok(plan)
            }
            Err(e) => {
                executor.rollback().await?;
                Err(e)
            }
        }
    }
}
