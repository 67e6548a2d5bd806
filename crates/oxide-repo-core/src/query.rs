//! Query specifications.
//!
//! A [`QuerySpec`] is the data half of a query: which entity, which rows,
//! in what order, which page, and for updates which assignments. Builders
//! mutate a spec; compilers read it.

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::field::FieldRef;
use crate::meta::EntityMeta;
use crate::value::SqlValue;

/// Row window of a query. `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBy {
    pub field: FieldRef,
    pub direction: Direction,
}

/// `SET field = value` in an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: FieldRef,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    entity: &'static EntityMeta,
    predicate: Option<Condition>,
    pagination: Option<Pagination>,
    ordering: Vec<OrderBy>,
    assignments: Vec<Assignment>,
}

impl QuerySpec {
    #[must_use]
    pub const fn new(entity: &'static EntityMeta) -> Self {
        Self {
            entity,
            predicate: None,
            pagination: None,
            ordering: Vec::new(),
            assignments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn entity(&self) -> &'static EntityMeta {
        self.entity
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&Condition> {
        self.predicate.as_ref()
    }

    #[must_use]
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    #[must_use]
    pub fn ordering(&self) -> &[OrderBy] {
        &self.ordering
    }

    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// ANDs `condition` with any predicate already present.
    pub fn add_predicate(&mut self, condition: Condition) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
    }

    /// Sets the number of rows to skip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for negative counts.
    pub fn set_offset(&mut self, offset: i64) -> Result<()> {
        let offset = non_negative("skip", offset)?;
        self.pagination.get_or_insert_with(Pagination::default).offset = Some(offset);
        Ok(())
    }

    /// Sets the maximum number of rows returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for negative counts.
    pub fn set_limit(&mut self, limit: i64) -> Result<()> {
        let limit = non_negative("limit", limit)?;
        self.pagination.get_or_insert_with(Pagination::default).limit = Some(limit);
        Ok(())
    }

    pub fn add_ordering(&mut self, fields: impl IntoIterator<Item = FieldRef>, direction: Direction) {
        self.ordering
            .extend(fields.into_iter().map(|field| OrderBy { field, direction }));
    }

    pub fn add_assignment(&mut self, field: FieldRef, value: SqlValue) {
        self.assignments.push(Assignment { field, value });
    }

    /// Copy of this spec whose limit is at most `cap`, keeping the offset.
    #[must_use]
    pub fn with_limit_cap(&self, cap: u64) -> Self {
        let mut capped = self.clone();
        let pagination = capped.pagination.get_or_insert_with(Pagination::default);
        pagination.limit = Some(pagination.limit.map_or(cap, |limit| limit.min(cap)));
        capped
    }
}

fn non_negative(what: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| Error::invalid_argument(format!("{what} must not be negative, got {value}")))
}
