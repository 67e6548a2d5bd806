//! Repository facade.

use std::fmt;
use std::sync::Arc;

use oxide_repo_core::compiler::SqlCompiler;
use oxide_repo_core::dialect::Dialect;
use oxide_repo_core::meta::EntityMeta;
use oxide_repo_core::schema::{MigrationPlan, MigrationPlanner, PlannerOptions, SchemaModel};
use oxide_repo_core::types::TypeMappingRegistry;
use tracing::{debug, info, warn};

use crate::entity::Entity;
use crate::entity_set::EntitySet;
use crate::error::{RepoError, Result};
use crate::executor::{SchemaIntrospector, StatementExecutor};
use crate::query::QueryBuilder;
use crate::update::{DeleteBuilder, UpdateBuilder};

/// Dialect, type mappings and planner options shared by every query and
/// migration of one backend.
///
/// Cloning is cheap; clones share the dialect and registry.
#[derive(Clone)]
pub struct Repository {
    dialect: Arc<dyn Dialect>,
    registry: Arc<TypeMappingRegistry>,
    planner_options: PlannerOptions,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("dialect", &self.dialect.name())
            .field("planner_options", &self.planner_options)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Repository whose registry holds the dialect's type mappings.
    #[must_use]
    pub fn new<D: Dialect + 'static>(dialect: D) -> Self {
        let registry = TypeMappingRegistry::for_dialect(&dialect);
        Self::with_registry(dialect, registry)
    }

    /// Repository with a caller-assembled registry.
    #[must_use]
    pub fn with_registry<D: Dialect + 'static>(dialect: D, registry: TypeMappingRegistry) -> Self {
        Self {
            dialect: Arc::new(dialect),
            registry: Arc::new(registry),
            planner_options: PlannerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_planner_options(mut self, options: PlannerOptions) -> Self {
        self.planner_options = options;
        self
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    #[must_use]
    pub fn registry(&self) -> &TypeMappingRegistry {
        &self.registry
    }

    /// Shared handle on the registry, for executors that encode parameters.
    #[must_use]
    pub fn shared_registry(&self) -> Arc<TypeMappingRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn compiler(&self) -> SqlCompiler<'_> {
        SqlCompiler::new(self.dialect.as_ref())
    }

    #[must_use]
    pub fn entities<E: Entity>(&self) -> EntitySet<E> {
        EntitySet::new(self.clone())
    }

    #[must_use]
    pub fn query<E: Entity>(&self) -> QueryBuilder<E> {
        QueryBuilder::new(self.clone())
    }

    #[must_use]
    pub fn update_query<E: Entity>(&self) -> UpdateBuilder<E> {
        UpdateBuilder::new(self.clone())
    }

    #[must_use]
    pub fn delete_query<E: Entity>(&self) -> DeleteBuilder<E> {
        DeleteBuilder::new(self.clone())
    }

    /// Schema the given entities expect.
    ///
    /// # Errors
    ///
    /// Fails when a field type has no mapping.
    pub fn expected_schema(&self, entities: &[&EntityMeta]) -> Result<SchemaModel> {
        Ok(SchemaModel::from_entities(entities, &self.registry)?)
    }

    /// Steps taking `actual` to the schema `entities` expect.
    ///
    /// # Errors
    ///
    /// Fails when a field type has no mapping or a needed default is
    /// unavailable.
    pub fn plan_upgrade(&self, entities: &[&EntityMeta], actual: &SchemaModel) -> Result<MigrationPlan> {
        let expected = self.expected_schema(entities)?;
        let planner =
            MigrationPlanner::with_options(self.dialect.as_ref(), &self.registry, self.planner_options.clone());
        Ok(planner.plan(&expected, actual)?)
    }

    /// Creates the tables of `entities`, referenced tables first.
    ///
    /// Runs on `executor` as given; pass a transaction-backed executor to
    /// make creation atomic.
    ///
    /// # Errors
    ///
    /// Fails on planning errors before any statement runs, or with the
    /// first executor error.
    pub async fn create_schema<X>(&self, executor: &mut X, entities: &[&EntityMeta]) -> Result<MigrationPlan>
    where
        X: StatementExecutor,
    {
        let plan = self.plan_upgrade(entities, &SchemaModel::new())?;
        info!(tables = plan.len(), dialect = self.dialect.name(), "Creating schema");
        self.apply(executor, &plan).await?;
        Ok(plan)
    }

    /// Brings the backend's schema in line with `entities`.
    ///
    /// The whole plan is computed and rendered before the first statement
    /// runs. Atomicity comes from the executor's transaction.
    ///
    /// # Errors
    ///
    /// Fails on introspection or planning errors before any statement
    /// runs, or with the first executor error.
    pub async fn upgrade_schema<X>(&self, executor: &mut X, entities: &[&EntityMeta]) -> Result<MigrationPlan>
    where
        X: StatementExecutor + SchemaIntrospector,
    {
        let actual = executor.introspect().await.map_err(RepoError::executor)?;
        let plan = self.plan_upgrade(entities, &actual)?;
        if plan.is_empty() {
            info!(dialect = self.dialect.name(), "Schema is up to date");
        } else {
            info!(steps = plan.len(), dialect = self.dialect.name(), "Upgrading schema");
            self.apply(executor, &plan).await?;
        }
        Ok(plan)
    }

    /// Executes every statement of `plan` in order.
    ///
    /// # Errors
    ///
    /// Fails before executing anything if the plan cannot be rendered.
    pub async fn apply<X>(&self, executor: &mut X, plan: &MigrationPlan) -> Result<()>
    where
        X: StatementExecutor,
    {
        let statements = plan.statements(self.dialect.as_ref())?;
        for step in plan.steps() {
            if step.is_destructive() {
                warn!(table = step.table_name(), "Destructive migration step: {step:?}");
            } else {
                info!(table = step.table_name(), "Migration step: {step:?}");
            }
        }
        for statement in &statements {
            debug!(sql = %statement, "Executing migration statement");
            executor.execute(statement).await.map_err(RepoError::executor)?;
        }
        Ok(())
    }
}
