//! Schema introspection from the SQLite catalog.
//!
//! Tables come from `sqlite_master`, columns from `PRAGMA table_info` and
//! foreign keys from `PRAGMA foreign_key_list`. SQLite's internal tables
//! (`sqlite_%`) are skipped.

use std::collections::HashMap;
use std::ops::DerefMut;

use oxide_repo::SchemaIntrospector;
use oxide_repo_core::dialect::Dialect;
use oxide_repo_core::schema::{ColumnSchema, ForeignKey, SchemaModel, TableSchema};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row as _;
use tracing::debug;

use crate::dialect::SqliteDialect;
use crate::error::{Result, SqliteError};
use crate::executor::SqliteExecutor;

impl<C: DerefMut<Target = SqliteConnection>> SqliteExecutor<C> {
    async fn table_names(&mut self) -> Result<Vec<(String, Option<String>)>> {
        let rows = sqlx::query(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&mut *self.conn)
        .await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let sql: Option<String> = row.try_get("sql")?;
            tables.push((name, sql));
        }
        Ok(tables)
    }

    async fn foreign_keys(&mut self, quoted: &str) -> Result<HashMap<String, ForeignKey>> {
        let rows = sqlx::query(&format!("PRAGMA foreign_key_list({quoted})"))
            .fetch_all(&mut *self.conn)
            .await?;
        let mut keys = HashMap::with_capacity(rows.len());
        for row in rows {
            let from: String = row.try_get("from")?;
            let table: String = row.try_get("table")?;
            let to: Option<String> = row.try_get("to")?;
            let column = match to {
                Some(column) => column,
                // No target column means the target's primary key.
                None => self.primary_key_of(&table).await?,
            };
            keys.insert(from, ForeignKey { table, column });
        }
        Ok(keys)
    }

    async fn primary_key_of(&mut self, table: &str) -> Result<String> {
        let quoted = SqliteDialect::new().quote_identifier(table);
        let rows = sqlx::query(&format!("PRAGMA table_info({quoted})"))
            .fetch_all(&mut *self.conn)
            .await?;
        for row in rows {
            let pk: i64 = row.try_get("pk")?;
            if pk > 0 {
                return Ok(row.try_get("name")?);
            }
        }
        Err(SqliteError::Introspection(format!(
            "foreign key targets table {table} which has no primary key"
        )))
    }

    async fn introspect_table(&mut self, name: &str, create_sql: Option<&str>) -> Result<TableSchema> {
        let quoted = SqliteDialect::new().quote_identifier(name);
        let mut foreign_keys = self.foreign_keys(&quoted).await?;
        let rows = sqlx::query(&format!("PRAGMA table_info({quoted})"))
            .fetch_all(&mut *self.conn)
            .await?;
        if rows.is_empty() {
            return Err(SqliteError::Introspection(format!("table {name} has no columns")));
        }
        let auto_increment = create_sql.is_some_and(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT"));

        let mut table = TableSchema::new(name);
        for row in rows {
            let column_name: String = row.try_get("name")?;
            let sql_type: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let pk: i64 = row.try_get("pk")?;

            let mut column = ColumnSchema::new(column_name.as_str(), sql_type);
            // Key columns report notnull = 0 but never hold NULL here.
            if not_null != 0 || pk > 0 {
                column = column.not_null();
            }
            if pk > 0 {
                column = column.primary_key();
                if auto_increment {
                    column = column.auto_increment();
                }
            }
            if let Some(fk) = foreign_keys.remove(&column_name) {
                column = column.references(fk.table, fk.column);
            }
            table.columns.push(column);
        }
        Ok(table)
    }
}

impl<C: DerefMut<Target = SqliteConnection>> SchemaIntrospector for SqliteExecutor<C> {
    type Error = SqliteError;

    async fn introspect(&mut self) -> Result<SchemaModel> {
        let mut model = SchemaModel::new();
        for (name, create_sql) in self.table_names().await? {
            let table = self.introspect_table(&name, create_sql.as_deref()).await?;
            model.add_table(table);
        }
        debug!(tables = model.table_names().count(), "Introspected SQLite schema");
        Ok(model)
    }
}
