//! SQLite dialect implementation.

use oxide_repo_core::dialect::Dialect;
use oxide_repo_core::query::Pagination;
use oxide_repo_core::types::{GenericTypeMappings, TypeMappingRegistry, TypeMappings};

use crate::types::SqliteTypeMappings;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn pagination_clause(&self, pagination: &Pagination) -> Option<String> {
        match (pagination.offset, pagination.limit) {
            (None, None) => None,
            (None, Some(limit)) => Some(format!("LIMIT {limit}")),
            // OFFSET is only valid after LIMIT; -1 means no limit.
            (Some(offset), None) => Some(format!("LIMIT -1 OFFSET {offset}")),
            (Some(offset), Some(limit)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }

    fn supports_returning(&self) -> bool {
        true // SQLite 3.35.0+
    }

    fn supports_drop_column(&self) -> bool {
        // DROP COLUMN refuses indexed, unique and key columns; rebuilding
        // the table works for all of them.
        false
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        Some("AUTOINCREMENT")
    }

    fn install_type_mappings(&self, registry: &mut TypeMappingRegistry) {
        GenericTypeMappings.install(registry);
        SqliteTypeMappings.install(registry);
    }
}
