//! Field type mappings.
//!
//! A [`TypeMapping`] tells a backend how to declare a column for a logical
//! [`FieldType`], how to encode values of that type before binding, and
//! which value fills the column when existing rows need one during a
//! migration. Mappings are installed in layers: generic defaults first,
//! then backend overrides. The last registration for a type wins.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::compiler::Param;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::meta::FieldType;
use crate::value::SqlValue;

/// Converts a value into the form a backend stores.
pub type Encoder = fn(SqlValue) -> SqlValue;

#[derive(Debug, Clone)]
pub struct TypeMapping {
    /// Column type used in DDL.
    pub column_type: String,
    pub encode: Encoder,
    /// Filler for existing rows when a non-null column is introduced.
    pub default_value: SqlValue,
}

impl TypeMapping {
    #[must_use]
    pub fn new(column_type: impl Into<String>, default_value: SqlValue) -> Self {
        Self {
            column_type: column_type.into(),
            encode: identity,
            default_value,
        }
    }

    #[must_use]
    pub fn with_encoder(mut self, encode: Encoder) -> Self {
        self.encode = encode;
        self
    }
}

fn identity(value: SqlValue) -> SqlValue {
    value
}

#[derive(Debug, Clone, Default)]
pub struct TypeMappingRegistry {
    mappings: HashMap<FieldType, TypeMapping>,
}

impl TypeMappingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated by `dialect`'s mapping layers.
    #[must_use]
    pub fn for_dialect(dialect: &dyn Dialect) -> Self {
        let mut registry = Self::new();
        dialect.install_type_mappings(&mut registry);
        registry
    }

    /// Registers a mapping, returning the one it replaces.
    pub fn register(&mut self, field_type: FieldType, mapping: TypeMapping) -> Option<TypeMapping> {
        trace!(%field_type, column_type = %mapping.column_type, "Registering type mapping");
        self.mappings.insert(field_type, mapping)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`] when nothing is registered for
    /// `field_type`.
    pub fn get(&self, field_type: FieldType) -> Result<&TypeMapping> {
        self.mappings
            .get(&field_type)
            .ok_or(Error::UnmappedType(field_type))
    }

    #[must_use]
    pub fn contains(&self, field_type: FieldType) -> bool {
        self.mappings.contains_key(&field_type)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`] for unregistered types.
    pub fn column_type(&self, field_type: FieldType) -> Result<&str> {
        self.get(field_type).map(|m| m.column_type.as_str())
    }

    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`] for unregistered types.
    pub fn default_value(&self, field_type: FieldType) -> Result<SqlValue> {
        self.get(field_type).map(|m| m.default_value.clone())
    }

    /// Storage form of a bound parameter. NULL is passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`] for unregistered types.
    pub fn encode(&self, param: &Param) -> Result<SqlValue> {
        if param.value.is_null() {
            return Ok(SqlValue::Null);
        }
        let mapping = self.get(param.field_type)?;
        Ok((mapping.encode)(param.value.clone()))
    }
}

/// A layer of type mappings.
pub trait TypeMappings {
    fn install(&self, registry: &mut TypeMappingRegistry);
}

/// Backend-neutral defaults using standard SQL column types.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTypeMappings;

impl TypeMappings for GenericTypeMappings {
    fn install(&self, registry: &mut TypeMappingRegistry) {
        registry.register(
            FieldType::Text,
            TypeMapping::new("TEXT", SqlValue::Text(String::new())),
        );
        registry.register(FieldType::Integer, TypeMapping::new("BIGINT", SqlValue::Int(0)));
        registry.register(
            FieldType::Real,
            TypeMapping::new("DOUBLE PRECISION", SqlValue::Float(0.0)),
        );
        registry.register(
            FieldType::Boolean,
            TypeMapping::new("BOOLEAN", SqlValue::Bool(false)),
        );
        registry.register(
            FieldType::Date,
            TypeMapping::new("TIMESTAMP", SqlValue::Timestamp(DateTime::<Utc>::UNIX_EPOCH)),
        );
        registry.register(
            FieldType::Enum,
            TypeMapping::new("VARCHAR(255)", SqlValue::Text(String::new())),
        );
        registry.register(FieldType::Blob, TypeMapping::new("BLOB", SqlValue::Blob(Vec::new())));
    }
}
