//! SQL statement compilation.
//!
//! [`SqlCompiler`] turns query specifications into parameterized SQL for
//! a [`Dialect`]. Parameters are collected in the order their placeholders
//! appear in the text, so `params[i]` always binds the `i`-th placeholder.
//!
//! Columns are qualified with their table only when a condition reaches
//! into a related table. SELECT and COUNT reach related tables through one
//! LEFT JOIN per relation path, aliased when several joins reach the same
//! table; UPDATE and DELETE use `IN (SELECT ...)`.

mod predicate;
mod statement;

pub use statement::{CompiledStatement, Param};

use tracing::trace;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::field::FieldRef;
use crate::meta::EntityMeta;
use crate::query::QuerySpec;
use crate::value::SqlValue;
use crate::visitor::ConditionVisitor;

use predicate::{ensure_member, resolve_joins, Join, PredicateCompiler, RelationMode, Writer};

/// Compiles query specifications into statements for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'d> {
    dialect: &'d dyn Dialect,
}

/// Rendered FROM/WHERE tail shared by the statement kinds.
struct Filter {
    joins: Vec<Join>,
    clause: Option<String>,
    qualify: bool,
}

impl<'d> SqlCompiler<'d> {
    #[must_use]
    pub const fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub const fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// SELECT of every field of the spec's entity, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] when a condition or ordering names
    /// a field the entity does not declare.
    pub fn select(&self, spec: &QuerySpec) -> Result<CompiledStatement> {
        let entity = spec.entity();
        let fields: Vec<FieldRef> = entity
            .fields
            .iter()
            .map(|field| FieldRef::new(entity, field))
            .collect();
        self.select_fields(spec, &fields)
    }

    /// SELECT of the given fields only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty projection and
    /// [`Error::SchemaMismatch`] for fields outside the entity.
    pub fn select_fields(&self, spec: &QuerySpec, fields: &[FieldRef]) -> Result<CompiledStatement> {
        let entity = spec.entity();
        if fields.is_empty() {
            return Err(Error::invalid_argument("select needs at least one field"));
        }
        for field in fields {
            ensure_member(field, entity)?;
        }
        let mut writer = Writer::new(self.dialect);
        let filter = self.filter(&mut writer, spec, RelationMode::Join)?;

        let columns: Vec<String> = fields
            .iter()
            .map(|field| self.column(&writer, &filter, field))
            .collect();
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), writer.ident(entity.table));
        self.push_tail(&writer, &filter, &mut sql);

        if !spec.ordering().is_empty() {
            let mut terms = Vec::with_capacity(spec.ordering().len());
            for order in spec.ordering() {
                ensure_member(&order.field, entity)?;
                terms.push(format!(
                    "{} {}",
                    self.column(&writer, &filter, &order.field),
                    order.direction.as_sql()
                ));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        if let Some(clause) = spec
            .pagination()
            .and_then(|p| self.dialect.pagination_clause(p))
        {
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok(self.finish(sql, writer))
    }

    /// COUNT of the rows the spec selects, pagination included.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SqlCompiler::select`].
    pub fn count(&self, spec: &QuerySpec) -> Result<CompiledStatement> {
        let entity = spec.entity();
        let mut writer = Writer::new(self.dialect);
        let filter = self.filter(&mut writer, spec, RelationMode::Join)?;
        let table = writer.ident(entity.table);
        let page = spec
            .pagination()
            .and_then(|p| self.dialect.pagination_clause(p));

        let sql = if let Some(page) = page {
            let mut inner = format!("SELECT 1 FROM {table}");
            self.push_tail(&writer, &filter, &mut inner);
            format!(
                "SELECT COUNT(*) FROM ({inner} {page}) AS {}",
                writer.ident("page")
            )
        } else {
            let mut sql = format!("SELECT COUNT(*) FROM {table}");
            self.push_tail(&writer, &filter, &mut sql);
            sql
        };
        Ok(self.finish(sql, writer))
    }

    /// Multi-row INSERT. Each row holds one value per entity field, in
    /// declaration order. Generated keys are left out and, when the dialect
    /// allows it, returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `rows` is empty or a row has
    /// the wrong number of values.
    pub fn insert(&self, entity: &'static EntityMeta, rows: &[Vec<SqlValue>]) -> Result<CompiledStatement> {
        if rows.is_empty() {
            return Err(Error::invalid_argument("insert needs at least one row"));
        }
        let mut writer = Writer::new(self.dialect);
        let inserted: Vec<(usize, _)> = entity
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !(field.primary_key && field.generated))
            .collect();
        let columns: Vec<String> = inserted
            .iter()
            .map(|(_, field)| writer.ident(field.column))
            .collect();

        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != entity.fields.len() {
                return Err(Error::invalid_argument(format!(
                    "{} row has {} values, expected {}",
                    entity.name,
                    row.len(),
                    entity.fields.len()
                )));
            }
            let placeholders: Vec<String> = inserted
                .iter()
                .map(|(index, field)| writer.bind(field.field_type, row[*index].clone()))
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            writer.ident(entity.table),
            columns.join(", "),
            tuples.join(", ")
        );
        if let Some(key) = entity.key().filter(|key| key.generated) {
            if self.dialect.supports_returning() {
                sql.push_str(" RETURNING ");
                sql.push_str(&writer.ident(key.column));
            }
        }
        Ok(self.finish(sql, writer))
    }

    /// UPDATE of the spec's assignments, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] without assignments and
    /// [`Error::SchemaMismatch`] for fields outside the entity.
    pub fn update(&self, spec: &QuerySpec) -> Result<CompiledStatement> {
        let entity = spec.entity();
        if spec.assignments().is_empty() {
            return Err(Error::invalid_argument("update needs at least one assignment"));
        }
        let mut writer = Writer::new(self.dialect);
        let mut sets = Vec::with_capacity(spec.assignments().len());
        for assignment in spec.assignments() {
            ensure_member(&assignment.field, entity)?;
            let placeholder = writer.bind(assignment.field.field.field_type, assignment.value.clone());
            sets.push(format!("{} = {placeholder}", writer.ident(assignment.field.column())));
        }
        let filter = self.filter(&mut writer, spec, RelationMode::Subquery)?;
        let mut sql = format!("UPDATE {} SET {}", writer.ident(entity.table), sets.join(", "));
        self.push_tail(&writer, &filter, &mut sql);
        Ok(self.finish(sql, writer))
    }

    /// DELETE of the rows matching the spec's predicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] for fields outside the entity.
    pub fn delete(&self, spec: &QuerySpec) -> Result<CompiledStatement> {
        let mut writer = Writer::new(self.dialect);
        let filter = self.filter(&mut writer, spec, RelationMode::Subquery)?;
        let mut sql = format!("DELETE FROM {}", writer.ident(spec.entity().table));
        self.push_tail(&writer, &filter, &mut sql);
        Ok(self.finish(sql, writer))
    }

    fn filter(&self, writer: &mut Writer<'_>, spec: &QuerySpec, mode: RelationMode) -> Result<Filter> {
        let Some(condition) = spec.predicate() else {
            return Ok(Filter {
                joins: Vec::new(),
                clause: None,
                qualify: false,
            });
        };
        let joins = resolve_joins(condition, spec.entity())?;
        let qualify = !joins.is_empty();
        let fragment =
            PredicateCompiler::new(writer, qualify, mode, spec.entity(), &joins).visit(condition)?;
        Ok(Filter {
            joins: if mode == RelationMode::Join { joins } else { Vec::new() },
            clause: Some(fragment.sql),
            qualify,
        })
    }

    fn column(&self, writer: &Writer<'_>, filter: &Filter, field: &FieldRef) -> String {
        if filter.qualify {
            writer.qualified(field.table(), field.column())
        } else {
            writer.ident(field.column())
        }
    }

    /// Appends joins and the WHERE clause.
    fn push_tail(&self, writer: &Writer<'_>, filter: &Filter, sql: &mut String) {
        for join in &filter.joins {
            let parent = join
                .parent
                .map_or(join.relation.table(), |index| filter.joins[index].alias.as_str());
            sql.push_str(" LEFT JOIN ");
            sql.push_str(&writer.ident(join.target.table));
            if join.is_aliased() {
                sql.push_str(" AS ");
                sql.push_str(&writer.ident(&join.alias));
            }
            sql.push_str(&format!(
                " ON {} = {}",
                writer.qualified(parent, join.relation.column()),
                writer.qualified(&join.alias, join.target_key.column)
            ));
        }
        if let Some(clause) = &filter.clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
    }

    fn finish(&self, sql: String, writer: Writer<'_>) -> CompiledStatement {
        let statement = CompiledStatement::new(sql, writer.into_params());
        trace!(dialect = self.dialect.name(), sql = %statement.sql, "Compiled statement");
        statement
    }
}
