//! SQL dialect support.
//!
//! Statement compilation is backend-neutral; everything that differs
//! between databases goes through a [`Dialect`]: identifier quoting,
//! placeholders, pagination clauses, returning generated keys, DDL
//! capabilities, and the type mappings a backend installs.

mod generic;

use std::fmt;

pub use generic::GenericDialect;

use crate::query::Pagination;
use crate::types::{GenericTypeMappings, TypeMappingRegistry, TypeMappings};

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Placeholder for the `index`-th parameter, counting from 1.
    fn placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    /// Trailing clause restricting a query to `pagination`, or `None` when
    /// nothing needs restricting.
    fn pagination_clause(&self, pagination: &Pagination) -> Option<String>;

    /// Returns whether INSERT can return generated columns.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Returns whether `ALTER TABLE ... DROP COLUMN` is available.
    fn supports_drop_column(&self) -> bool {
        true
    }

    /// Keyword appended to a generated integer primary key column.
    fn auto_increment_keyword(&self) -> Option<&'static str> {
        None
    }

    /// Name of the scratch table used while rebuilding `table`.
    fn rebuild_table_name(&self, table: &str) -> String {
        format!("{table}__rebuild")
    }

    /// Installs the type mappings of this backend, layered over the
    /// generic defaults.
    fn install_type_mappings(&self, registry: &mut TypeMappingRegistry) {
        GenericTypeMappings.install(registry);
    }
}
