//! Backend seams.
//!
//! Repositories compile statements; backends run them. An executor is
//! passed to every operation that touches the database, so the caller
//! decides whether it wraps a pooled connection or an open transaction.

use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::schema::SchemaModel;

use crate::row::Row;

/// Runs compiled statements.
#[allow(async_fn_in_trait)]
pub trait StatementExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a query and returns every row.
    async fn select(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>, Self::Error>;

    /// Runs a single-value COUNT query.
    async fn count(&mut self, statement: &CompiledStatement) -> Result<u64, Self::Error>;

    /// Runs an INSERT and returns rows of generated keys, one per inserted
    /// row when the statement returns them.
    async fn insert(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>, Self::Error>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64, Self::Error>;
}

/// Reads the schema a backend currently holds.
#[allow(async_fn_in_trait)]
pub trait SchemaIntrospector {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn introspect(&mut self) -> Result<SchemaModel, Self::Error>;
}
