//! Condition trees.
//!
//! A [`Condition`] is an immutable tree describing which rows a query
//! touches. Leaves compare one field against operands; composites combine
//! two or more children with AND or OR; relational nodes apply a condition
//! to the entity a foreign key points at.
//!
//! [`Predicate`] is the typed face of a condition: it remembers which
//! entity the condition is rooted at so builders only accept conditions
//! about their own entity.

use std::fmt;
use std::marker::PhantomData;

use crate::field::FieldRef;
use crate::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    GreaterThan,
    LessThan,
    GreaterOrEq,
    LessOrEq,
    StartsWith,
    EndsWith,
    Contains,
    NotStartsWith,
    NotEndsWith,
    NotContains,
}

impl BinaryOp {
    /// Pattern operators, compiled to `LIKE`.
    #[must_use]
    pub const fn is_pattern(self) -> bool {
        matches!(
            self,
            Self::StartsWith
                | Self::EndsWith
                | Self::Contains
                | Self::NotStartsWith
                | Self::NotEndsWith
                | Self::NotContains
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryOp {
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOp {
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    And,
    Or,
}

/// Node kind tag, reported by visitors that cannot handle a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Unary,
    Binary,
    Ternary,
    Collection,
    Relational,
    Composite,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unary => "unary",
            Self::Binary => "binary",
            Self::Ternary => "ternary",
            Self::Collection => "collection",
            Self::Relational => "relational",
            Self::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Unary {
        field: FieldRef,
        op: UnaryOp,
    },
    Binary {
        field: FieldRef,
        op: BinaryOp,
        operand: SqlValue,
    },
    Ternary {
        field: FieldRef,
        op: TernaryOp,
        first: SqlValue,
        second: SqlValue,
    },
    Collection {
        field: FieldRef,
        op: CollectionOp,
        operands: Vec<SqlValue>,
    },
    /// `condition` is rooted at the entity `relation` references.
    Relational {
        relation: FieldRef,
        condition: Box<Condition>,
    },
    Composite {
        op: CompositeOp,
        children: Vec<Condition>,
    },
}

impl Condition {
    #[must_use]
    pub const fn kind(&self) -> ConditionKind {
        match self {
            Self::Unary { .. } => ConditionKind::Unary,
            Self::Binary { .. } => ConditionKind::Binary,
            Self::Ternary { .. } => ConditionKind::Ternary,
            Self::Collection { .. } => ConditionKind::Collection,
            Self::Relational { .. } => ConditionKind::Relational,
            Self::Composite { .. } => ConditionKind::Composite,
        }
    }

    /// Combines two conditions, merging children of composites that
    /// already use `op` so the tree stays flat.
    #[must_use]
    pub fn combine(op: CompositeOp, left: Self, right: Self) -> Self {
        let mut children = Vec::new();
        for side in [left, right] {
            match side {
                Self::Composite {
                    op: side_op,
                    children: nested,
                } if side_op == op => children.extend(nested),
                other => children.push(other),
            }
        }
        Self::Composite { op, children }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::combine(CompositeOp::And, self, other)
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::combine(CompositeOp::Or, self, other)
    }

    /// Returns true when the tree contains a relational node.
    #[must_use]
    pub fn has_relations(&self) -> bool {
        match self {
            Self::Relational { .. } => true,
            Self::Composite { children, .. } => children.iter().any(Self::has_relations),
            _ => false,
        }
    }
}

/// A condition rooted at entity `E`.
pub struct Predicate<E> {
    condition: Condition,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Predicate<E> {
    /// Wraps a condition whose fields belong to `E`.
    ///
    /// Field membership is checked when the predicate is compiled.
    #[must_use]
    pub const fn from_condition(condition: Condition) -> Self {
        Self {
            condition,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn condition(&self) -> &Condition {
        &self.condition
    }

    #[must_use]
    pub fn into_condition(self) -> Condition {
        self.condition
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::from_condition(self.condition.and(other.condition))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::from_condition(self.condition.or(other.condition))
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::from_condition(self.condition.clone())
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.condition).finish()
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition
    }
}

impl<E> From<Predicate<E>> for Condition {
    fn from(predicate: Predicate<E>) -> Self {
        predicate.condition
    }
}

/// Conjunction of two predicates.
#[must_use]
pub fn and<E>(left: Predicate<E>, right: Predicate<E>) -> Predicate<E> {
    left.and(right)
}

/// Disjunction of two predicates.
#[must_use]
pub fn or<E>(left: Predicate<E>, right: Predicate<E>) -> Predicate<E> {
    left.or(right)
}
