//! Bulk update and delete builders.

use std::fmt;
use std::marker::PhantomData;

use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::condition::Predicate;
use oxide_repo_core::error::Error as CoreError;
use oxide_repo_core::field::{Field, FieldValue};
use oxide_repo_core::query::QuerySpec;
use oxide_repo_core::value::{SqlValue, ToSqlValue};
use tracing::debug;

use crate::entity::Entity;
use crate::error::{RepoError, Result};
use crate::executor::StatementExecutor;
use crate::repository::Repository;

/// Builds an `UPDATE` over every entity matching the conditions.
pub struct UpdateBuilder<E> {
    repository: Repository,
    spec: QuerySpec,
    error: Option<CoreError>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for UpdateBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            spec: self.spec.clone(),
            error: self.error.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for UpdateBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateBuilder")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> UpdateBuilder<E> {
    pub(crate) fn new(repository: Repository) -> Self {
        Self {
            repository,
            spec: QuerySpec::new(E::META),
            error: None,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn where_(mut self, predicate: Predicate<E>) -> Self {
        self.spec.add_predicate(predicate.into_condition());
        self
    }

    /// Assigns `value` to `field` on every matching row.
    #[must_use]
    pub fn set<T: FieldValue>(mut self, field: &Field<E, T>, value: impl Into<T::Operand>) -> Self {
        self.spec
            .add_assignment(field.field_ref(), value.into().to_sql_value());
        self
    }

    /// Clears a nullable field.
    #[must_use]
    pub fn set_null<T: FieldValue>(mut self, field: &Field<E, Option<T>>) -> Self {
        if field.meta().nullable {
            self.spec.add_assignment(field.field_ref(), SqlValue::Null);
        } else {
            self.error.get_or_insert(CoreError::invalid_argument(format!(
                "field {} is not nullable",
                field.meta().name
            )));
        }
        self
    }

    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Compiles the update.
    ///
    /// # Errors
    ///
    /// Fails when nothing is assigned, a field is foreign to the entity or
    /// a null is assigned to a required field.
    pub fn prepare(self) -> Result<UpdateQuery> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        let statement = self.repository.compiler().update(&self.spec)?;
        debug!(entity = E::META.name, sql = %statement, "Prepared update");
        Ok(UpdateQuery { statement })
    }
}

/// Compiled `UPDATE`.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    statement: CompiledStatement,
}

impl UpdateQuery {
    #[must_use]
    pub const fn statement(&self) -> &CompiledStatement {
        &self.statement
    }

    /// Runs the update and returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns the executor's error.
    pub async fn execute<X: StatementExecutor>(&self, executor: &mut X) -> Result<u64> {
        executor.execute(&self.statement).await.map_err(RepoError::executor)
    }
}

/// Builds a `DELETE` of every entity matching the conditions.
pub struct DeleteBuilder<E> {
    repository: Repository,
    spec: QuerySpec,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DeleteBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            spec: self.spec.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for DeleteBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteBuilder")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> DeleteBuilder<E> {
    pub(crate) fn new(repository: Repository) -> Self {
        Self {
            repository,
            spec: QuerySpec::new(E::META),
            _entity: PhantomData,
        }
    }

    /// Restricts the delete; without any condition every row is removed.
    #[must_use]
    pub fn where_(mut self, predicate: Predicate<E>) -> Self {
        self.spec.add_predicate(predicate.into_condition());
        self
    }

    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Compiles the delete.
    ///
    /// # Errors
    ///
    /// Fails when a condition names a field foreign to the entity.
    pub fn prepare(self) -> Result<DeleteQuery> {
        let statement = self.repository.compiler().delete(&self.spec)?;
        debug!(entity = E::META.name, sql = %statement, "Prepared delete");
        Ok(DeleteQuery { statement })
    }
}

/// Compiled `DELETE`.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    statement: CompiledStatement,
}

impl DeleteQuery {
    #[must_use]
    pub const fn statement(&self) -> &CompiledStatement {
        &self.statement
    }

    /// Runs the delete and returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns the executor's error.
    pub async fn execute<X: StatementExecutor>(&self, executor: &mut X) -> Result<u64> {
        executor.execute(&self.statement).await.map_err(RepoError::executor)
    }
}
