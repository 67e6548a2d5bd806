//! Typed field handles.
//!
//! Each entity exposes its fields as `const` [`Field`] values. A field
//! knows its entity and value type, so condition builders only accept
//! operands of the right type and string matching is only offered on text
//! fields:
//!
//! ```rust
//! use oxide_repo_core::field::{EntityType, Field};
//! use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
//!
//! struct Person;
//!
//! const NAME: FieldMeta = FieldMeta::new("name", FieldType::Text);
//! const AGE: FieldMeta = FieldMeta::new("age", FieldType::Integer);
//! const PERSON: EntityMeta = EntityMeta::new("Person", "people", &[NAME, AGE]);
//!
//! impl EntityType for Person {
//!     const META: &'static EntityMeta = &PERSON;
//! }
//!
//! impl Person {
//!     const NAME: Field<Self, String> = Field::new(&NAME);
//!     const AGE: Field<Self, i32> = Field::new(&AGE);
//! }
//!
//! let adults = Person::AGE.greater_or_eq(18).and(Person::NAME.starts_with("J"));
//! # let _ = adults;
//! ```

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use crate::condition::{
    BinaryOp, CollectionOp, Condition, Predicate, TernaryOp, UnaryOp,
};
use crate::meta::{EntityMeta, FieldMeta};
use crate::value::{SqlValue, ToSqlValue};

/// Implemented by types that carry entity metadata.
pub trait EntityType: 'static {
    const META: &'static EntityMeta;
}

/// Untyped reference to a field of a specific entity.
#[derive(Clone, Copy)]
pub struct FieldRef {
    pub entity: &'static EntityMeta,
    pub field: &'static FieldMeta,
}

impl FieldRef {
    #[must_use]
    pub const fn new(entity: &'static EntityMeta, field: &'static FieldMeta) -> Self {
        Self { entity, field }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.field.name
    }

    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.field.column
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.entity.table
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_as(other.entity) && self.field.name == other.field.name
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity.name, self.field.name)
    }
}

/// Anything that names a field of entity `E`, used for ordering and
/// projections that mix field value types.
pub trait FieldOf<E> {
    fn field_ref(&self) -> FieldRef;
}

/// Rust types usable as field values, with the operand type conditions
/// compare them against. Nullable fields compare against the inner type.
pub trait FieldValue {
    type Operand: ToSqlValue;
}

macro_rules! plain_field_values {
    ($($ty:ty),* $(,)?) => {
        $(impl FieldValue for $ty {
            type Operand = $ty;
        })*
    };
}

plain_field_values!(String, bool, i16, i32, i64, u32, f32, f64, Vec<u8>, DateTime<Utc>, SqlValue);

impl<T: FieldValue> FieldValue for Option<T> {
    type Operand = T::Operand;
}

/// A persisted field of entity `E` holding values of type `T`.
pub struct Field<E, T> {
    meta: &'static FieldMeta,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> fmt::Debug for Field<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.meta.name).finish()
    }
}

impl<E, T> Field<E, T> {
    #[must_use]
    pub const fn new(meta: &'static FieldMeta) -> Self {
        Self {
            meta,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn meta(&self) -> &'static FieldMeta {
        self.meta
    }
}

impl<E: EntityType, T> FieldOf<E> for Field<E, T> {
    fn field_ref(&self) -> FieldRef {
        FieldRef::new(E::META, self.meta)
    }
}

#[allow(clippy::should_implement_trait)]
impl<E: EntityType, T: FieldValue> Field<E, T> {
    #[must_use]
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(E::META, self.meta)
    }

    fn binary(&self, op: BinaryOp, operand: SqlValue) -> Predicate<E> {
        Predicate::from_condition(Condition::Binary {
            field: self.field_ref(),
            op,
            operand,
        })
    }

    fn collection<V, I>(&self, op: CollectionOp, values: I) -> Predicate<E>
    where
        V: Into<T::Operand>,
        I: IntoIterator<Item = V>,
    {
        Predicate::from_condition(Condition::Collection {
            field: self.field_ref(),
            op,
            operands: values
                .into_iter()
                .map(|v| v.into().to_sql_value())
                .collect(),
        })
    }

    fn unary(&self, op: UnaryOp) -> Predicate<E> {
        Predicate::from_condition(Condition::Unary {
            field: self.field_ref(),
            op,
        })
    }

    #[must_use]
    pub fn eq(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::Eq, value.into().to_sql_value())
    }

    #[must_use]
    pub fn not_eq(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::NotEq, value.into().to_sql_value())
    }

    #[must_use]
    pub fn greater_than(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::GreaterThan, value.into().to_sql_value())
    }

    #[must_use]
    pub fn less_than(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::LessThan, value.into().to_sql_value())
    }

    #[must_use]
    pub fn greater_or_eq(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::GreaterOrEq, value.into().to_sql_value())
    }

    #[must_use]
    pub fn less_or_eq(&self, value: impl Into<T::Operand>) -> Predicate<E> {
        self.binary(BinaryOp::LessOrEq, value.into().to_sql_value())
    }

    /// Inclusive range.
    #[must_use]
    pub fn between(
        &self,
        low: impl Into<T::Operand>,
        high: impl Into<T::Operand>,
    ) -> Predicate<E> {
        Predicate::from_condition(Condition::Ternary {
            field: self.field_ref(),
            op: TernaryOp::Between,
            first: low.into().to_sql_value(),
            second: high.into().to_sql_value(),
        })
    }

    #[must_use]
    pub fn is_in<V, I>(&self, values: I) -> Predicate<E>
    where
        V: Into<T::Operand>,
        I: IntoIterator<Item = V>,
    {
        self.collection(CollectionOp::In, values)
    }

    #[must_use]
    pub fn not_in<V, I>(&self, values: I) -> Predicate<E>
    where
        V: Into<T::Operand>,
        I: IntoIterator<Item = V>,
    {
        self.collection(CollectionOp::NotIn, values)
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate<E> {
        self.unary(UnaryOp::IsNull)
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate<E> {
        self.unary(UnaryOp::IsNotNull)
    }
}

impl<E: EntityType, T: FieldValue<Operand = String>> Field<E, T> {
    fn pattern(&self, op: BinaryOp, value: &str) -> Predicate<E> {
        self.binary(op, SqlValue::Text(value.to_string()))
    }

    #[must_use]
    pub fn starts_with(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::StartsWith, value)
    }

    #[must_use]
    pub fn ends_with(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::EndsWith, value)
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::Contains, value)
    }

    #[must_use]
    pub fn not_starts_with(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::NotStartsWith, value)
    }

    #[must_use]
    pub fn not_ends_with(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::NotEndsWith, value)
    }

    #[must_use]
    pub fn not_contains(&self, value: &str) -> Predicate<E> {
        self.pattern(BinaryOp::NotContains, value)
    }
}

/// A foreign key field of `E` pointing at entity `R`.
pub struct RelationField<E, R> {
    meta: &'static FieldMeta,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E, R> Clone for RelationField<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for RelationField<E, R> {}

impl<E, R> fmt::Debug for RelationField<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelationField").field(&self.meta.name).finish()
    }
}

impl<E, R> RelationField<E, R> {
    #[must_use]
    pub const fn new(meta: &'static FieldMeta) -> Self {
        Self {
            meta,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn meta(&self) -> &'static FieldMeta {
        self.meta
    }
}

impl<E: EntityType, R> FieldOf<E> for RelationField<E, R> {
    fn field_ref(&self) -> FieldRef {
        FieldRef::new(E::META, self.meta)
    }
}

impl<E: EntityType, R: EntityType> RelationField<E, R> {
    #[must_use]
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(E::META, self.meta)
    }

    /// Rows whose related `R` matches `condition`.
    #[must_use]
    pub fn is(&self, condition: Predicate<R>) -> Predicate<E> {
        Predicate::from_condition(Condition::Relational {
            relation: self.field_ref(),
            condition: Box::new(condition.into_condition()),
        })
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate<E> {
        Predicate::from_condition(Condition::Unary {
            field: self.field_ref(),
            op: UnaryOp::IsNull,
        })
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate<E> {
        Predicate::from_condition(Condition::Unary {
            field: self.field_ref(),
            op: UnaryOp::IsNotNull,
        })
    }
}
