//! Typed entry point for one entity's table.

use std::fmt;
use std::marker::PhantomData;

use oxide_repo_core::condition::{CollectionOp, Condition, Predicate};
use oxide_repo_core::error::Error as CoreError;
use oxide_repo_core::field::FieldRef;
use oxide_repo_core::query::QuerySpec;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{RepoError, Result};
use crate::executor::StatementExecutor;
use crate::query::QueryBuilder;
use crate::repository::Repository;
use crate::update::{DeleteBuilder, UpdateBuilder};

/// All persisted instances of `E`.
pub struct EntitySet<E> {
    repository: Repository,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntitySet<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for EntitySet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySet")
            .field("entity", &E::META.name)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> EntitySet<E> {
    pub(crate) const fn new(repository: Repository) -> Self {
        Self {
            repository,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn query(&self) -> QueryBuilder<E> {
        QueryBuilder::new(self.repository.clone())
    }

    #[must_use]
    pub fn update_query(&self) -> UpdateBuilder<E> {
        UpdateBuilder::new(self.repository.clone())
    }

    #[must_use]
    pub fn delete_query(&self) -> DeleteBuilder<E> {
        DeleteBuilder::new(self.repository.clone())
    }

    /// Inserts one entity, storing its generated key if any.
    ///
    /// # Errors
    ///
    /// Returns compilation, executor or key conversion errors.
    pub async fn add<X: StatementExecutor>(&self, executor: &mut X, entity: &mut E) -> Result<()> {
        self.add_all(executor, std::slice::from_mut(entity)).await
    }

    /// Inserts every entity.
    ///
    /// Entities whose key the database generates are inserted one row per
    /// statement so each returned key lands on the entity it belongs to.
    /// Other entities go in with a single multi-row statement. Rows
    /// inserted before a failure stay unless the executor is a
    /// transaction that is rolled back.
    ///
    /// # Errors
    ///
    /// Returns compilation, executor or key conversion errors, and
    /// [`RepoError::GeneratedKey`] when an insert does not return exactly
    /// one key.
    pub async fn add_all<X: StatementExecutor>(&self, executor: &mut X, entities: &mut [E]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let compiler = self.repository.compiler();
        if !E::META.key().is_some_and(|key| key.generated) {
            let rows: Vec<_> = entities.iter().map(Entity::values).collect();
            let statement = compiler.insert(E::META, &rows)?;
            executor.insert(&statement).await.map_err(RepoError::executor)?;
            debug!(entity = E::META.name, rows = entities.len(), "Inserted entities");
            return Ok(());
        }

        for entity in entities.iter_mut() {
            let statement = compiler.insert(E::META, &[entity.values()])?;
            let keys = executor.insert(&statement).await.map_err(RepoError::executor)?;
            let key = match keys.as_slice() {
                [row] => row.value_at(0),
                _ => None,
            }
            .ok_or(RepoError::GeneratedKey {
                entity: E::META.name,
                returned: keys.len(),
            })?;
            entity.set_generated_key(key)?;
        }
        debug!(entity = E::META.name, rows = entities.len(), "Inserted entities with generated keys");
        Ok(())
    }

    /// Deletes the given entities by key and returns how many rows went.
    ///
    /// # Errors
    ///
    /// Fails when the entity has no key field or the executor fails.
    pub async fn remove<X: StatementExecutor>(&self, executor: &mut X, entities: &[E]) -> Result<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        let meta = E::META;
        let key = meta
            .key()
            .ok_or_else(|| CoreError::schema_mismatch(format!("entity {} has no key field", meta.name)))?;
        let operands = entities.iter().map(Entity::key_value).collect::<Result<Vec<_>>>()?;
        let mut spec = QuerySpec::new(meta);
        spec.add_predicate(Condition::Collection {
            field: FieldRef::new(meta, key),
            op: CollectionOp::In,
            operands,
        });
        let statement = self.repository.compiler().delete(&spec)?;
        executor.execute(&statement).await.map_err(RepoError::executor)
    }

    /// Every entity matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns compilation, executor or decoding errors.
    pub async fn find_all_where<X: StatementExecutor>(
        &self,
        executor: &mut X,
        predicate: Predicate<E>,
    ) -> Result<Vec<E>> {
        self.query().where_(predicate).prepare()?.to_list(executor).await
    }

    /// Number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns the executor's error.
    pub async fn count<X: StatementExecutor>(&self, executor: &mut X) -> Result<u64> {
        self.query().prepare()?.count(executor).await
    }
}
