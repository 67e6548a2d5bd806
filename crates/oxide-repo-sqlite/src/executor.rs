//! sqlx-backed statement execution.
//!
//! [`SqliteExecutor`] runs compiled statements on anything that derefs to
//! a [`SqliteConnection`]: a pooled connection, a transaction or a bare
//! connection. Parameters are encoded through the type mapping registry
//! before binding, so dates and booleans reach SQLite in their storage
//! form.

use std::ops::DerefMut;
use std::sync::Arc;

use oxide_repo::{Row, StatementExecutor};
use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::types::TypeMappingRegistry;
use oxide_repo_core::value::SqlValue;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::{Result, SqliteError};

/// Runs compiled statements on a SQLite connection.
pub struct SqliteExecutor<C> {
    pub(crate) conn: C,
    registry: Arc<TypeMappingRegistry>,
}

impl<C> std::fmt::Debug for SqliteExecutor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

impl<C> SqliteExecutor<C> {
    /// Creates an executor encoding parameters with `registry`.
    pub const fn new(conn: C, registry: Arc<TypeMappingRegistry>) -> Self {
        Self { conn, registry }
    }

    /// Returns the wrapped connection.
    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: DerefMut<Target = SqliteConnection>> SqliteExecutor<C> {
    async fn fetch_rows(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        let query = bind(statement, &self.registry)?;
        let rows = query.fetch_all(&mut *self.conn).await?;
        rows.iter().map(decode_row).collect()
    }

    /// Runs raw SQL without parameters, such as a `PRAGMA`.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn execute_raw(&mut self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "Executing SQL");
        Ok(sqlx::query(sql).execute(&mut *self.conn).await?.rows_affected())
    }

    /// Fails when any row violates a foreign key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ForeignKeyViolation`] with the number of
    /// offending rows.
    pub async fn check_foreign_keys(&mut self) -> Result<()> {
        let violations = sqlx::query("PRAGMA foreign_key_check")
            .fetch_all(&mut *self.conn)
            .await?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SqliteError::ForeignKeyViolation(violations.len()))
        }
    }
}

impl SqliteExecutor<Transaction<'_, Sqlite>> {
    /// Commits the wrapped transaction.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn commit(self) -> Result<()> {
        self.conn.commit().await?;
        Ok(())
    }

    /// Rolls back the wrapped transaction.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub async fn rollback(self) -> Result<()> {
        self.conn.rollback().await?;
        Ok(())
    }
}

impl<C: DerefMut<Target = SqliteConnection>> StatementExecutor for SqliteExecutor<C> {
    type Error = SqliteError;

    async fn select(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        self.fetch_rows(statement).await
    }

    async fn count(&mut self, statement: &CompiledStatement) -> Result<u64> {
        debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        let query = bind(statement, &self.registry)?;
        let row = query.fetch_one(&mut *self.conn).await?;
        let count: i64 = row.try_get(0)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>> {
        self.fetch_rows(statement).await
    }

    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64> {
        debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        let query = bind(statement, &self.registry)?;
        Ok(query.execute(&mut *self.conn).await?.rows_affected())
    }
}

fn bind<'q>(
    statement: &'q CompiledStatement,
    registry: &TypeMappingRegistry,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match registry.encode(param)? {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s),
            SqlValue::Blob(b) => query.bind(b),
            SqlValue::Timestamp(at) => query.bind(at),
        };
    }
    Ok(query)
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    row.columns()
        .iter()
        .map(|column| -> Result<(String, SqlValue)> {
            Ok((column.name().to_owned(), decode_value(row, column.ordinal())?))
        })
        .collect()
}

/// Maps a value by its storage class.
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
        "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    })
}
