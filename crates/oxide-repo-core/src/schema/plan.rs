//! Migration plans and their DDL.

use serde::{Deserialize, Serialize};

use crate::compiler::{CompiledStatement, Param};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::meta::FieldType;
use crate::value::SqlValue;

use super::model::{ColumnSchema, TableSchema};

/// Where a rebuilt table's column gets its values from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnSource {
    /// The same-named column of the old table.
    Existing,
    /// The old column, with NULLs replaced by a default.
    ExistingOrDefault(SqlValue),
    /// A constant for every row.
    Default(SqlValue),
}

/// Copy rule for one column of a rebuilt table. Columns without a rule
/// start out NULL (or generated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCopy {
    pub column: String,
    pub field_type: Option<FieldType>,
    pub source: ColumnSource,
}

/// One schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationStep {
    CreateTable(TableSchema),
    DropTable(String),
    AddColumn {
        table: String,
        column: ColumnSchema,
    },
    DropColumn {
        table: String,
        column: String,
    },
    /// Recreate `table` and copy the surviving data over.
    RebuildTable {
        table: TableSchema,
        copy: Vec<ColumnCopy>,
    },
}

impl MigrationStep {
    /// Table the step changes.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable(table) | Self::RebuildTable { table, .. } => &table.name,
            Self::DropTable(name) => name,
            Self::AddColumn { table, .. } | Self::DropColumn { table, .. } => table,
        }
    }

    /// Returns true for steps that discard stored data.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DropTable(_) | Self::DropColumn { .. } | Self::RebuildTable { .. }
        )
    }
}

/// Ordered steps taking an actual schema to an expected one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    #[must_use]
    pub const fn new(steps: Vec<MigrationStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Every statement of the plan, rendered up front so rendering errors
    /// surface before anything executes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MigrationPlanning`] for tables without columns.
    pub fn statements(&self, dialect: &dyn Dialect) -> Result<Vec<CompiledStatement>> {
        let ddl = DdlWriter { dialect };
        let mut statements = Vec::new();
        for step in &self.steps {
            statements.extend(ddl.step(step)?);
        }
        Ok(statements)
    }
}

impl IntoIterator for MigrationPlan {
    type Item = MigrationStep;
    type IntoIter = std::vec::IntoIter<MigrationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

struct DdlWriter<'d> {
    dialect: &'d dyn Dialect,
}

impl DdlWriter<'_> {
    fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn step(&self, step: &MigrationStep) -> Result<Vec<CompiledStatement>> {
        Ok(match step {
            MigrationStep::CreateTable(table) => {
                vec![CompiledStatement::raw(self.create_table(&table.name, table)?)]
            }
            MigrationStep::DropTable(name) => {
                vec![CompiledStatement::raw(format!("DROP TABLE {}", self.ident(name)))]
            }
            MigrationStep::AddColumn { table, column } => vec![CompiledStatement::raw(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                self.ident(table),
                self.column_definition(column, false)
            ))],
            MigrationStep::DropColumn { table, column } => vec![CompiledStatement::raw(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.ident(table),
                self.ident(column)
            ))],
            MigrationStep::RebuildTable { table, copy } => self.rebuild(table, copy)?,
        })
    }

    fn create_table(&self, name: &str, table: &TableSchema) -> Result<String> {
        if table.columns.is_empty() {
            return Err(Error::MigrationPlanning(format!(
                "table {} has no columns",
                table.name
            )));
        }
        let composite_key = table.primary_key().len() > 1;
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|column| self.column_definition(column, composite_key))
            .collect();
        if composite_key {
            let keys: Vec<String> = table
                .primary_key()
                .iter()
                .map(|column| self.ident(&column.name))
                .collect();
            definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        Ok(format!(
            "CREATE TABLE {} ({})",
            self.ident(name),
            definitions.join(", ")
        ))
    }

    fn column_definition(&self, column: &ColumnSchema, composite_key: bool) -> String {
        let mut parts = vec![self.ident(&column.name), column.sql_type.clone()];
        let inline_key = column.primary_key && !composite_key;
        if inline_key {
            parts.push(String::from("PRIMARY KEY"));
            if column.auto_increment {
                if let Some(keyword) = self.dialect.auto_increment_keyword() {
                    parts.push(String::from(keyword));
                }
            }
        }
        if !column.nullable && !inline_key {
            parts.push(String::from("NOT NULL"));
        }
        if let Some(fk) = &column.references {
            parts.push(format!(
                "REFERENCES {}({})",
                self.ident(&fk.table),
                self.ident(&fk.column)
            ));
        }
        parts.join(" ")
    }

    /// Create the new shape under a scratch name, copy rows, drop the old
    /// table, then move the new one into place.
    fn rebuild(&self, table: &TableSchema, copy: &[ColumnCopy]) -> Result<Vec<CompiledStatement>> {
        let scratch = self.dialect.rebuild_table_name(&table.name);
        let mut statements = vec![CompiledStatement::raw(self.create_table(&scratch, table)?)];

        if !copy.is_empty() {
            let mut params = Vec::new();
            let mut targets = Vec::with_capacity(copy.len());
            let mut sources = Vec::with_capacity(copy.len());
            for rule in copy {
                let column = self.ident(&rule.column);
                let source = match &rule.source {
                    ColumnSource::Existing => column.clone(),
                    ColumnSource::ExistingOrDefault(value) => {
                        params.push(default_param(rule, value)?);
                        format!("COALESCE({column}, {})", self.dialect.placeholder(params.len()))
                    }
                    ColumnSource::Default(value) => {
                        params.push(default_param(rule, value)?);
                        self.dialect.placeholder(params.len())
                    }
                };
                targets.push(column);
                sources.push(source);
            }
            statements.push(CompiledStatement::new(
                format!(
                    "INSERT INTO {} ({}) SELECT {} FROM {}",
                    self.ident(&scratch),
                    targets.join(", "),
                    sources.join(", "),
                    self.ident(&table.name)
                ),
                params,
            ));
        }

        statements.push(CompiledStatement::raw(format!(
            "DROP TABLE {}",
            self.ident(&table.name)
        )));
        statements.push(CompiledStatement::raw(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.ident(&scratch),
            self.ident(&table.name)
        )));
        Ok(statements)
    }
}

fn default_param(rule: &ColumnCopy, value: &SqlValue) -> Result<Param> {
    let field_type = rule.field_type.ok_or_else(|| {
        Error::MigrationPlanning(format!(
            "column {} needs a default but has no field type",
            rule.column
        ))
    })?;
    Ok(Param::new(field_type, value.clone()))
}
