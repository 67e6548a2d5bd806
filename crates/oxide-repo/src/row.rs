//! Result rows.

use oxide_repo_core::field::{EntityType, Field};
use oxide_repo_core::value::{FromSqlValue, SqlValue};

use crate::error::{RepoError, Result};

/// An ordered column to value map, as returned by executors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(String::as_str).zip(&self.values)
    }

    #[must_use]
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|index| &self.values[index])
    }

    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Decodes a column.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Decode`] when the column is missing or holds an
    /// incompatible value.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        let value = self
            .value(column)
            .ok_or_else(|| RepoError::decode(column, "column not present in row"))?;
        T::from_sql_value(value).map_err(|e| RepoError::decode(column, e.to_string()))
    }

    /// Decodes the column backing `field`.
    ///
    /// # Errors
    ///
    /// Same as [`Row::get`].
    pub fn field<E: EntityType, T: FromSqlValue>(&self, field: &Field<E, T>) -> Result<T> {
        self.get(field.meta().column)
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}
