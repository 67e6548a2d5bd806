//! Schema differ and migration planner.
//!
//! Compares the schema entity metadata expects with the schema a backend
//! reports and plans the steps between them. Tables are visited in
//! foreign key order: referenced tables are created before the tables
//! pointing at them and dropped after them. All steps for one table are
//! adjacent in the plan.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::types::TypeMappingRegistry;
use crate::value::SqlValue;

use super::model::{ColumnSchema, SchemaModel, TableSchema};
use super::plan::{ColumnCopy, ColumnSource, MigrationPlan, MigrationStep};

/// Options for the planner.
#[derive(Debug, Clone, Default)]
pub struct PlannerOptions {
    /// Overrides the dialect's `DROP COLUMN` capability.
    pub native_drop_column: Option<bool>,
    /// Leaves tables without a matching entity in place.
    pub preserve_unknown_tables: bool,
}

impl PlannerOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_native_drop_column(mut self, enabled: bool) -> Self {
        self.native_drop_column = Some(enabled);
        self
    }

    #[must_use]
    pub const fn preserving_unknown_tables(mut self) -> Self {
        self.preserve_unknown_tables = true;
        self
    }
}

/// Plans migrations for one dialect.
#[derive(Debug)]
pub struct MigrationPlanner<'a> {
    dialect: &'a dyn Dialect,
    registry: &'a TypeMappingRegistry,
    options: PlannerOptions,
}

impl<'a> MigrationPlanner<'a> {
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, registry: &'a TypeMappingRegistry) -> Self {
        Self::with_options(dialect, registry, PlannerOptions::default())
    }

    #[must_use]
    pub const fn with_options(
        dialect: &'a dyn Dialect,
        registry: &'a TypeMappingRegistry,
        options: PlannerOptions,
    ) -> Self {
        Self {
            dialect,
            registry,
            options,
        }
    }

    /// Steps taking `actual` to `expected`. Identical schemas yield an
    /// empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MigrationPlanning`] when a rebuild needs a default
    /// value that cannot be produced.
    pub fn plan(&self, expected: &SchemaModel, actual: &SchemaModel) -> Result<MigrationPlan> {
        let order = dependency_order(expected, actual);
        let mut steps = Vec::new();

        if !self.options.preserve_unknown_tables {
            for name in order.iter().rev() {
                if expected.get_table(name).is_none() && actual.get_table(name).is_some() {
                    steps.push(MigrationStep::DropTable(name.clone()));
                }
            }
        }

        for name in &order {
            let Some(table) = expected.get_table(name) else {
                continue;
            };
            match actual.get_table(name) {
                None => steps.push(MigrationStep::CreateTable(table.clone())),
                Some(current) => self.diff_table(table, current, &mut steps)?,
            }
        }

        for step in &steps {
            debug!(table = step.table_name(), destructive = step.is_destructive(), "Planned {step:?}");
        }
        Ok(MigrationPlan::new(steps))
    }

    fn diff_table(
        &self,
        expected: &TableSchema,
        actual: &TableSchema,
        steps: &mut Vec<MigrationStep>,
    ) -> Result<()> {
        let native_drop = self
            .options
            .native_drop_column
            .unwrap_or_else(|| self.dialect.supports_drop_column());
        let mut rebuild = false;
        let mut added = Vec::new();
        let mut dropped = Vec::new();

        for column in &expected.columns {
            match actual.get_column(&column.name) {
                None if column.nullable && !column.primary_key => added.push(column),
                None => rebuild = true,
                Some(current) => rebuild |= column_changed(column, current),
            }
        }
        for current in &actual.columns {
            if expected.get_column(&current.name).is_none() {
                // Key and foreign key columns cannot be dropped in place.
                rebuild |= !native_drop || current.primary_key || current.references.is_some();
                dropped.push(current.name.clone());
            }
        }

        if rebuild {
            steps.push(MigrationStep::RebuildTable {
                table: expected.clone(),
                copy: self.copy_rules(expected, actual)?,
            });
        } else {
            steps.extend(added.into_iter().map(|column| MigrationStep::AddColumn {
                table: expected.name.clone(),
                column: column.clone(),
            }));
            steps.extend(dropped.into_iter().map(|column| MigrationStep::DropColumn {
                table: expected.name.clone(),
                column,
            }));
        }
        Ok(())
    }

    fn copy_rules(&self, expected: &TableSchema, actual: &TableSchema) -> Result<Vec<ColumnCopy>> {
        let mut rules = Vec::new();
        for column in &expected.columns {
            let source = match actual.get_column(&column.name) {
                Some(current) if current.nullable && !column.nullable => {
                    ColumnSource::ExistingOrDefault(self.default_for(&expected.name, column)?)
                }
                Some(_) => ColumnSource::Existing,
                None if column.nullable || column.auto_increment => continue,
                None => ColumnSource::Default(self.default_for(&expected.name, column)?),
            };
            rules.push(ColumnCopy {
                column: column.name.clone(),
                field_type: column.field_type,
                source,
            });
        }
        Ok(rules)
    }

    fn default_for(&self, table: &str, column: &ColumnSchema) -> Result<SqlValue> {
        let field_type = column.field_type.ok_or_else(|| {
            Error::MigrationPlanning(format!(
                "{table}.{} needs a default value but its field type is unknown",
                column.name
            ))
        })?;
        self.registry.default_value(field_type).map_err(|e| {
            Error::MigrationPlanning(format!("no default value for {table}.{}: {e}", column.name))
        })
    }
}

fn column_changed(expected: &ColumnSchema, actual: &ColumnSchema) -> bool {
    !expected.sql_type.eq_ignore_ascii_case(&actual.sql_type)
        || expected.nullable != actual.nullable
        || expected.primary_key != actual.primary_key
        || expected.references != actual.references
}

/// Every table of both schemas, referenced tables before referencing
/// ones. Ties and cycles fall back to name order.
fn dependency_order(expected: &SchemaModel, actual: &SchemaModel) -> Vec<String> {
    let mut remaining: BTreeSet<&str> = expected
        .table_names()
        .chain(actual.table_names())
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(remaining.len());
    while let Some(first) = remaining.first().copied() {
        let ready = remaining
            .iter()
            .copied()
            .find(|&name| {
                dependencies(name, expected, actual)
                    .iter()
                    .all(|dep| !remaining.contains(dep))
            })
            .unwrap_or(first);
        remaining.remove(ready);
        order.push(ready.to_string());
    }
    order
}

fn dependencies<'s>(name: &str, expected: &'s SchemaModel, actual: &'s SchemaModel) -> Vec<&'s str> {
    expected
        .get_table(name)
        .or_else(|| actual.get_table(name))
        .map(|table| table.referenced_tables().collect())
        .unwrap_or_default()
}
