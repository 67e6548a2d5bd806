//! # oxide-repo-sqlite
//!
//! SQLite backend for `oxide-repo`.
//!
//! - [`SqliteDialect`]: `LIMIT`/`OFFSET` pagination, `RETURNING` for
//!   generated keys, `AUTOINCREMENT` keys, table rebuilds instead of
//!   `DROP COLUMN`
//! - [`SqliteTypeMappings`]: booleans and dates stored as integers
//! - [`SqliteExecutor`]: runs compiled statements through sqlx on a pooled
//!   connection or a transaction, and introspects the catalog
//! - [`SqliteRepository`]: pool-bound facade creating and upgrading the
//!   schema inside one transaction
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_repo_sqlite::{SqliteConfig, SqliteRepository};
//!
//! # async fn run(entities: &[&oxide_repo_core::EntityMeta]) -> oxide_repo_sqlite::Result<()> {
//! let repo = SqliteRepository::connect(&SqliteConfig::new("sqlite:app.db")).await?;
//! let plan = repo.upgrade_repository(entities).await?;
//! println!("applied {} migration steps", plan.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod dialect;
mod error;
mod executor;
mod introspect;
mod repository;
mod types;

pub use config::SqliteConfig;
pub use dialect::SqliteDialect;
pub use error::{Result, SqliteError};
pub use executor::SqliteExecutor;
pub use repository::SqliteRepository;
pub use types::SqliteTypeMappings;
