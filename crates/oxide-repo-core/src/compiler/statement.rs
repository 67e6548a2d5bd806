//! Compiled statements.

use std::fmt;

use crate::meta::FieldType;
use crate::value::SqlValue;

/// A bound parameter, tagged with the field type that decides its storage
/// encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub field_type: FieldType,
    pub value: SqlValue,
}

impl Param {
    #[must_use]
    pub const fn new(field_type: FieldType, value: SqlValue) -> Self {
        Self { field_type, value }
    }
}

/// SQL text plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl CompiledStatement {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Statement without parameters.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Parameter values in placeholder order.
    #[must_use]
    pub fn values(&self) -> Vec<&SqlValue> {
        self.params.iter().map(|p| &p.value).collect()
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            let values: Vec<String> = self.params.iter().map(|p| p.value.to_sql_inline()).collect();
            write!(f, " {{params: [{}]}}", values.join(", "))?;
        }
        Ok(())
    }
}
