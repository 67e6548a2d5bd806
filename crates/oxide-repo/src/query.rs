//! Query builders and prepared queries.
//!
//! A [`QueryBuilder`] collects conditions, ordering and pagination.
//! [`QueryBuilder::prepare`] freezes it into a [`Query`] whose statements
//! are compiled once and can be executed any number of times:
//!
//! ```ignore
//! let query = repository
//!     .query::<User>()
//!     .where_(User::FIRST_NAME.contains("John"))
//!     .order_asc(&[&User::LAST_NAME])
//!     .skip(2)
//!     .limit(10)
//!     .prepare()?;
//!
//! let total = query.count(&mut executor).await?;
//! let page = query.to_list(&mut executor).await?;
//! ```

use std::fmt;
use std::marker::PhantomData;

use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::condition::Predicate;
use oxide_repo_core::error::Error as CoreError;
use oxide_repo_core::field::{FieldOf, FieldRef};
use oxide_repo_core::query::{Direction, QuerySpec};
use tracing::debug;

use crate::entity::Entity;
use crate::error::{RepoError, Result};
use crate::executor::StatementExecutor;
use crate::repository::Repository;
use crate::row::Row;

/// Mutable query under construction.
///
/// Invalid pagination is remembered and reported by
/// [`prepare`](Self::prepare), so calls chain without `?` at every step.
pub struct QueryBuilder<E> {
    repository: Repository,
    spec: QuerySpec,
    error: Option<CoreError>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for QueryBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            spec: self.spec.clone(),
            error: self.error.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for QueryBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("spec", &self.spec)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> QueryBuilder<E> {
    pub(crate) fn new(repository: Repository) -> Self {
        Self::from_spec(repository, QuerySpec::new(E::META))
    }

    pub(crate) const fn from_spec(repository: Repository, spec: QuerySpec) -> Self {
        Self {
            repository,
            spec,
            error: None,
            _entity: PhantomData,
        }
    }

    /// Restricts the query; repeated calls are ANDed together.
    #[must_use]
    pub fn where_(mut self, predicate: Predicate<E>) -> Self {
        self.spec.add_predicate(predicate.into_condition());
        self
    }

    /// Skips the first `count` rows. Negative counts fail at
    /// [`prepare`](Self::prepare).
    #[must_use]
    pub fn skip(mut self, count: i64) -> Self {
        if let Err(e) = self.spec.set_offset(count) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Returns at most `count` rows. Negative counts fail at
    /// [`prepare`](Self::prepare).
    #[must_use]
    pub fn limit(mut self, count: i64) -> Self {
        if let Err(e) = self.spec.set_limit(count) {
            self.error.get_or_insert(e);
        }
        self
    }

    #[must_use]
    pub fn order_asc(mut self, fields: &[&dyn FieldOf<E>]) -> Self {
        self.spec
            .add_ordering(fields.iter().map(|field| field.field_ref()), Direction::Asc);
        self
    }

    #[must_use]
    pub fn order_desc(mut self, fields: &[&dyn FieldOf<E>]) -> Self {
        self.spec
            .add_ordering(fields.iter().map(|field| field.field_ref()), Direction::Desc);
        self
    }

    /// Independent copy; changes to either side do not affect the other.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    fn checked_spec(self) -> Result<(Repository, QuerySpec)> {
        match self.error {
            Some(e) => Err(e.into()),
            None => Ok((self.repository, self.spec)),
        }
    }

    /// Compiles the query.
    ///
    /// # Errors
    ///
    /// Returns [`oxide_repo_core::Error::InvalidArgument`] for negative
    /// pagination and [`oxide_repo_core::Error::SchemaMismatch`] for fields
    /// outside the entity.
    pub fn prepare(self) -> Result<Query<E>> {
        let (repository, spec) = self.checked_spec()?;
        let compiler = repository.compiler();
        let select = compiler.select(&spec)?;
        let count = compiler.count(&spec)?;
        let first = compiler.select(&spec.with_limit_cap(1))?;
        let single = compiler.select(&spec.with_limit_cap(2))?;
        debug!(entity = E::META.name, sql = %select, "Prepared query");
        Ok(Query {
            repository,
            spec,
            select,
            count,
            first,
            single,
            _entity: PhantomData,
        })
    }

    /// Compiles a projection onto `fields`, returning rows keyed by field
    /// name.
    ///
    /// # Errors
    ///
    /// Same as [`prepare`](Self::prepare); an empty field list is an
    /// invalid argument.
    pub fn select_to_map(self, fields: &[&dyn FieldOf<E>]) -> Result<MapQuery<E>> {
        let (repository, spec) = self.checked_spec()?;
        let fields: Vec<FieldRef> = fields.iter().map(|field| field.field_ref()).collect();
        let statement = repository.compiler().select_fields(&spec, &fields)?;
        debug!(entity = E::META.name, sql = %statement, "Prepared projection");
        Ok(MapQuery {
            fields,
            statement,
            _entity: PhantomData,
        })
    }
}

/// Compiled, immutable query.
///
/// Holds the statements for listing, counting and single-row lookups so
/// each execution only binds and runs.
pub struct Query<E> {
    repository: Repository,
    spec: QuerySpec,
    select: CompiledStatement,
    count: CompiledStatement,
    first: CompiledStatement,
    single: CompiledStatement,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            spec: self.spec.clone(),
            select: self.select.clone(),
            count: self.count.clone(),
            first: self.first.clone(),
            single: self.single.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("select", &self.select)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Query<E> {
    /// The compiled listing statement.
    #[must_use]
    pub const fn statement(&self) -> &CompiledStatement {
        &self.select
    }

    #[must_use]
    pub const fn count_statement(&self) -> &CompiledStatement {
        &self.count
    }

    /// A new builder starting from this query's conditions, ordering and
    /// pagination.
    #[must_use]
    pub fn fork(&self) -> QueryBuilder<E> {
        QueryBuilder::from_spec(self.repository.clone(), self.spec.clone())
    }

    /// Lazily decoding iterator over the matching entities.
    ///
    /// # Errors
    ///
    /// Returns the executor's error; decoding errors surface per item.
    pub async fn iter<X: StatementExecutor>(&self, executor: &mut X) -> Result<EntityIter<E>> {
        let rows = executor.select(&self.select).await.map_err(RepoError::executor)?;
        Ok(EntityIter::new(rows))
    }

    /// # Errors
    ///
    /// Returns the executor's error or the first decoding error.
    pub async fn to_list<X: StatementExecutor>(&self, executor: &mut X) -> Result<Vec<E>> {
        self.iter(executor).await?.collect()
    }

    /// # Errors
    ///
    /// Same as [`to_list`](Self::to_list).
    pub async fn to_array<X: StatementExecutor>(&self, executor: &mut X) -> Result<Box<[E]>> {
        Ok(self.to_list(executor).await?.into_boxed_slice())
    }

    /// Number of matching rows, honoring pagination.
    ///
    /// # Errors
    ///
    /// Returns the executor's error.
    pub async fn count<X: StatementExecutor>(&self, executor: &mut X) -> Result<u64> {
        executor.count(&self.count).await.map_err(RepoError::executor)
    }

    /// First matching entity, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns the executor's error or a decoding error.
    pub async fn first_or_default<X: StatementExecutor>(&self, executor: &mut X) -> Result<Option<E>> {
        let rows = executor.select(&self.first).await.map_err(RepoError::executor)?;
        rows.first().map(E::from_row).transpose()
    }

    /// The only matching entity, or `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::MultipleResults`] when more than one row
    /// matches.
    pub async fn single_or_default<X: StatementExecutor>(&self, executor: &mut X) -> Result<Option<E>> {
        let rows = executor.select(&self.single).await.map_err(RepoError::executor)?;
        match rows.as_slice() {
            [] => Ok(None),
            [row] => E::from_row(row).map(Some),
            _ => Err(RepoError::MultipleResults),
        }
    }
}

/// Iterator decoding one entity per fetched row.
#[derive(Debug)]
pub struct EntityIter<E> {
    rows: std::vec::IntoIter<Row>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EntityIter<E> {
    fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Iterator for EntityIter<E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| E::from_row(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<E: Entity> ExactSizeIterator for EntityIter<E> {}

/// Compiled projection returning rows keyed by field name.
pub struct MapQuery<E> {
    fields: Vec<FieldRef>,
    statement: CompiledStatement,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for MapQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapQuery")
            .field("fields", &self.fields)
            .field("statement", &self.statement)
            .finish()
    }
}

impl<E> MapQuery<E> {
    #[must_use]
    pub const fn statement(&self) -> &CompiledStatement {
        &self.statement
    }

    /// Runs the projection. Each row holds the selected fields in the
    /// requested order, named by field rather than column.
    ///
    /// # Errors
    ///
    /// Returns the executor's error, or a decoding error when the backend
    /// returns fewer columns than were selected.
    pub async fn fetch<X: StatementExecutor>(&self, executor: &mut X) -> Result<Vec<Row>> {
        let rows = executor.select(&self.statement).await.map_err(RepoError::executor)?;
        rows.iter()
            .map(|row| {
                self.fields
                    .iter()
                    .enumerate()
                    .map(|(index, field)| {
                        row.value_at(index)
                            .cloned()
                            .map(|value| (String::from(field.name()), value))
                            .ok_or_else(|| RepoError::decode(field.column(), "column missing from result"))
                    })
                    .collect::<Result<Row>>()
            })
            .collect()
    }
}
