//! Generic SQL dialect.

use super::Dialect;
use crate::query::Pagination;

/// A generic SQL dialect using ANSI SQL standards.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn pagination_clause(&self, pagination: &Pagination) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(offset) = pagination.offset {
            parts.push(format!("OFFSET {offset} ROWS"));
        }
        if let Some(limit) = pagination.limit {
            parts.push(format!("FETCH FIRST {limit} ROWS ONLY"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}
