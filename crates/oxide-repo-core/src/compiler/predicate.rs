//! WHERE clause compilation.

use crate::condition::{
    BinaryOp, CollectionOp, CompositeOp, Condition, TernaryOp, UnaryOp,
};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::field::FieldRef;
use crate::meta::{EntityMeta, FieldMeta, FieldType};
use crate::value::SqlValue;
use crate::visitor::ConditionVisitor;

use super::statement::Param;

/// Accumulates parameters while SQL text is assembled.
pub(crate) struct Writer<'d> {
    pub(crate) dialect: &'d dyn Dialect,
    params: Vec<Param>,
}

impl<'d> Writer<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Records a parameter and returns its placeholder.
    pub(crate) fn bind(&mut self, field_type: FieldType, value: SqlValue) -> String {
        self.params.push(Param::new(field_type, value));
        self.dialect.placeholder(self.params.len())
    }

    pub(crate) fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    pub(crate) fn qualified(&self, table: &str, column: &str) -> String {
        format!("{}.{}", self.ident(table), self.ident(column))
    }

    pub(crate) fn into_params(self) -> Vec<Param> {
        self.params
    }
}

/// How relational conditions reach the related table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelationMode {
    /// The related table is LEFT JOINed once per relation path.
    Join,
    /// `fk IN (SELECT key FROM related WHERE ...)`, for statements that
    /// cannot join.
    Subquery,
}

/// A join required by relational conditions.
#[derive(Debug, Clone)]
pub(crate) struct Join {
    /// Join this relation is reached through, `None` for the root table.
    pub(crate) parent: Option<usize>,
    pub(crate) relation: FieldRef,
    pub(crate) target: &'static EntityMeta,
    pub(crate) target_key: &'static FieldMeta,
    /// Name the joined table is referenced by; equal to the table name
    /// unless another join reaches the same table.
    pub(crate) alias: String,
}

impl Join {
    pub(crate) fn is_aliased(&self) -> bool {
        self.alias != self.target.table
    }
}

/// Checks that every field belongs to the entity its node is rooted at and
/// collects the joins the tree needs, one per relation path, in the order
/// they are first met.
pub(crate) fn resolve_joins(
    condition: &Condition,
    root: &'static EntityMeta,
) -> Result<Vec<Join>> {
    let mut joins = Vec::new();
    resolve_in_scope(condition, root, root, None, &mut joins)?;
    assign_aliases(&mut joins);
    Ok(joins)
}

fn resolve_in_scope(
    condition: &Condition,
    root: &'static EntityMeta,
    scope: &'static EntityMeta,
    parent: Option<usize>,
    joins: &mut Vec<Join>,
) -> Result<()> {
    match condition {
        Condition::Unary { field, .. }
        | Condition::Binary { field, .. }
        | Condition::Ternary { field, .. }
        | Condition::Collection { field, .. } => ensure_member(field, scope),
        Condition::Relational {
            relation,
            condition: inner,
        } => {
            ensure_member(relation, scope)?;
            let join = relation_join(relation, parent)?;
            if join.target.table == root.table {
                return Err(Error::invalid_argument(format!(
                    "relation {relation:?} points back at {}; self-referencing conditions are not supported",
                    root.table
                )));
            }
            let target = join.target;
            let index = if let Some(index) = find_join(joins, parent, relation) {
                index
            } else {
                joins.push(join);
                joins.len() - 1
            };
            resolve_in_scope(inner, root, target, Some(index), joins)
        }
        Condition::Composite { children, .. } => children
            .iter()
            .try_for_each(|child| resolve_in_scope(child, root, scope, parent, joins)),
    }
}

fn find_join(joins: &[Join], parent: Option<usize>, relation: &FieldRef) -> Option<usize> {
    joins
        .iter()
        .position(|join| join.parent == parent && join.relation == *relation)
}

/// Tables reached by a single join keep their name; the rest are aliased
/// `<table>__<fk column>`, suffixed with the join index on collision.
fn assign_aliases(joins: &mut [Join]) {
    let mut aliases: Vec<String> = Vec::with_capacity(joins.len());
    for (index, join) in joins.iter().enumerate() {
        let table = join.target.table;
        let shared = joins.iter().filter(|j| j.target.table == table).count() > 1;
        let mut alias = if shared {
            format!("{table}__{}", join.relation.column())
        } else {
            String::from(table)
        };
        if aliases.contains(&alias) {
            alias = format!("{alias}_{index}");
        }
        aliases.push(alias);
    }
    for (join, alias) in joins.iter_mut().zip(aliases) {
        join.alias = alias;
    }
}

/// Fails unless `field` is declared by `entity`.
pub(crate) fn ensure_member(field: &FieldRef, entity: &EntityMeta) -> Result<()> {
    if field.entity.same_as(entity) && entity.contains(field.field) {
        Ok(())
    } else {
        Err(Error::schema_mismatch(format!(
            "field {field:?} does not belong to entity {}",
            entity.name
        )))
    }
}

fn relation_join(relation: &FieldRef, parent: Option<usize>) -> Result<Join> {
    let target = relation.field.references.ok_or_else(|| {
        Error::schema_mismatch(format!("field {relation:?} is not a relation"))
    })?;
    let target_key = target.key().ok_or_else(|| {
        Error::schema_mismatch(format!("entity {} has no key field", target.name))
    })?;
    Ok(Join {
        parent,
        relation: *relation,
        target,
        target_key,
        alias: String::from(target.table),
    })
}

/// Rendered condition plus whether it needs parentheses when nested.
#[derive(Debug)]
pub(crate) struct Fragment {
    pub(crate) sql: String,
    compound: bool,
}

impl Fragment {
    const fn simple(sql: String) -> Self {
        Self {
            sql,
            compound: false,
        }
    }
}

/// Relation scope the compiler is currently inside.
#[derive(Debug)]
struct Scope {
    join: Option<usize>,
    qualifier: String,
}

/// Renders a validated condition tree, binding operands as it goes.
pub(crate) struct PredicateCompiler<'w, 'd, 'j> {
    writer: &'w mut Writer<'d>,
    qualify: bool,
    mode: RelationMode,
    root: &'static EntityMeta,
    joins: &'j [Join],
    scopes: Vec<Scope>,
}

impl<'w, 'd, 'j> PredicateCompiler<'w, 'd, 'j> {
    pub(crate) fn new(
        writer: &'w mut Writer<'d>,
        qualify: bool,
        mode: RelationMode,
        root: &'static EntityMeta,
        joins: &'j [Join],
    ) -> Self {
        Self {
            writer,
            qualify,
            mode,
            root,
            joins,
            scopes: Vec::new(),
        }
    }

    fn qualifier(&self) -> &str {
        self.scopes
            .last()
            .map_or(self.root.table, |scope| scope.qualifier.as_str())
    }

    fn column(&self, field: &FieldRef) -> String {
        if self.qualify {
            self.writer.qualified(self.qualifier(), field.column())
        } else {
            self.writer.ident(field.column())
        }
    }
}

fn comparison(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "=",
        BinaryOp::NotEq => "<>",
        BinaryOp::GreaterThan => ">",
        BinaryOp::LessThan => "<",
        BinaryOp::GreaterOrEq => ">=",
        BinaryOp::LessOrEq => "<=",
        BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Contains => "LIKE",
        BinaryOp::NotStartsWith | BinaryOp::NotEndsWith | BinaryOp::NotContains => "NOT LIKE",
    }
}

fn like_pattern(op: BinaryOp, text: &str) -> String {
    match op {
        BinaryOp::StartsWith | BinaryOp::NotStartsWith => format!("{text}%"),
        BinaryOp::EndsWith | BinaryOp::NotEndsWith => format!("%{text}"),
        _ => format!("%{text}%"),
    }
}

impl ConditionVisitor for PredicateCompiler<'_, '_, '_> {
    type Output = Fragment;

    fn visit_unary(&mut self, field: &FieldRef, op: UnaryOp) -> Result<Fragment> {
        let test = match op {
            UnaryOp::IsNull => "IS NULL",
            UnaryOp::IsNotNull => "IS NOT NULL",
        };
        Ok(Fragment::simple(format!("{} {test}", self.column(field))))
    }

    fn visit_binary(&mut self, field: &FieldRef, op: BinaryOp, operand: &SqlValue) -> Result<Fragment> {
        let column = self.column(field);
        if operand.is_null() {
            return match op {
                BinaryOp::Eq => Ok(Fragment::simple(format!("{column} IS NULL"))),
                BinaryOp::NotEq => Ok(Fragment::simple(format!("{column} IS NOT NULL"))),
                _ => Err(Error::invalid_argument(format!(
                    "{op:?} on {field:?} needs a non-null operand"
                ))),
            };
        }
        let placeholder = if op.is_pattern() {
            let SqlValue::Text(text) = operand else {
                return Err(Error::invalid_argument(format!(
                    "{op:?} on {field:?} needs a text operand"
                )));
            };
            self.writer.bind(FieldType::Text, SqlValue::Text(like_pattern(op, text)))
        } else {
            self.writer.bind(field.field.field_type, operand.clone())
        };
        Ok(Fragment::simple(format!("{column} {} {placeholder}", comparison(op))))
    }

    fn visit_ternary(
        &mut self,
        field: &FieldRef,
        op: TernaryOp,
        first: &SqlValue,
        second: &SqlValue,
    ) -> Result<Fragment> {
        let column = self.column(field);
        match op {
            TernaryOp::Between => {
                let low = self.writer.bind(field.field.field_type, first.clone());
                let high = self.writer.bind(field.field.field_type, second.clone());
                Ok(Fragment::simple(format!("{column} BETWEEN {low} AND {high}")))
            }
        }
    }

    fn visit_collection(
        &mut self,
        field: &FieldRef,
        op: CollectionOp,
        operands: &[SqlValue],
    ) -> Result<Fragment> {
        if operands.is_empty() {
            // Nothing is in the empty set.
            let constant = match op {
                CollectionOp::In => "1 = 0",
                CollectionOp::NotIn => "1 = 1",
            };
            return Ok(Fragment::simple(String::from(constant)));
        }
        let column = self.column(field);
        let placeholders: Vec<String> = operands
            .iter()
            .map(|value| self.writer.bind(field.field.field_type, value.clone()))
            .collect();
        let keyword = match op {
            CollectionOp::In => "IN",
            CollectionOp::NotIn => "NOT IN",
        };
        Ok(Fragment::simple(format!(
            "{column} {keyword} ({})",
            placeholders.join(", ")
        )))
    }

    fn enter_relational(&mut self, relation: &FieldRef) -> Result<()> {
        let scope = match self.mode {
            RelationMode::Join => {
                let parent = self.scopes.last().and_then(|scope| scope.join);
                let index = find_join(self.joins, parent, relation).ok_or_else(|| {
                    Error::schema_mismatch(format!("no join resolved for relation {relation:?}"))
                })?;
                Scope {
                    join: Some(index),
                    qualifier: self.joins[index].alias.clone(),
                }
            }
            RelationMode::Subquery => Scope {
                join: None,
                qualifier: String::from(relation_join(relation, None)?.target.table),
            },
        };
        self.scopes.push(scope);
        Ok(())
    }

    fn visit_relational(
        &mut self,
        relation: &FieldRef,
        _inner: &Condition,
        output: Fragment,
    ) -> Result<Fragment> {
        self.scopes.pop();
        match self.mode {
            RelationMode::Join => Ok(output),
            RelationMode::Subquery => {
                let join = relation_join(relation, None)?;
                Ok(Fragment::simple(format!(
                    "{} IN (SELECT {} FROM {} WHERE {})",
                    self.column(relation),
                    self.writer.qualified(join.target.table, join.target_key.column),
                    self.writer.ident(join.target.table),
                    output.sql
                )))
            }
        }
    }

    fn visit_composite(
        &mut self,
        op: CompositeOp,
        children: &[Condition],
        outputs: Vec<Fragment>,
    ) -> Result<Fragment> {
        if outputs.is_empty() {
            let constant = match op {
                CompositeOp::And => "1 = 1",
                CompositeOp::Or => "1 = 0",
            };
            return Ok(Fragment::simple(String::from(constant)));
        }
        if let ([_], [single]) = (children, outputs.as_slice()) {
            return Ok(Fragment {
                sql: single.sql.clone(),
                compound: single.compound,
            });
        }
        let separator = match op {
            CompositeOp::And => " AND ",
            CompositeOp::Or => " OR ",
        };
        let parts: Vec<String> = outputs
            .into_iter()
            .map(|part| {
                if part.compound {
                    format!("({})", part.sql)
                } else {
                    part.sql
                }
            })
            .collect();
        Ok(Fragment {
            sql: parts.join(separator),
            compound: true,
        })
    }
}
