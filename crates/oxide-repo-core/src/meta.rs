//! Static entity descriptors.
//!
//! Metadata is declared once per entity as `const` items and shared by
//! every query, statement and schema derived from it:
//!
//! ```rust
//! use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
//!
//! const ID: FieldMeta = FieldMeta::new("id", FieldType::Integer).primary_key().generated();
//! const DESCRIPTION: FieldMeta = FieldMeta::new("description", FieldType::Text);
//!
//! const ROLE: EntityMeta = EntityMeta::new("Role", "roles", &[ID, DESCRIPTION]);
//!
//! assert_eq!(ROLE.key().map(|f| f.column), Some("id"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logical type of a persisted field.
///
/// Backends map each logical type to a column type and a storage
/// encoding through the [`TypeMappingRegistry`](crate::types::TypeMappingRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Boolean,
    /// Point in time.
    Date,
    /// Enumeration stored by variant name.
    Enum,
    Blob,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Enum => "enum",
            Self::Blob => "blob",
        };
        f.write_str(name)
    }
}

/// Descriptor of one persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Field name, unique within its entity.
    pub name: &'static str,
    /// Column the field is stored in.
    pub column: &'static str,
    pub field_type: FieldType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Key value is assigned by the database on insert.
    pub generated: bool,
    /// Entity this field points at, for foreign keys.
    pub references: Option<&'static EntityMeta>,
}

impl FieldMeta {
    /// Creates a non-null field stored in a column of the same name.
    #[must_use]
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            column: name,
            field_type,
            nullable: false,
            primary_key: false,
            generated: false,
            references: None,
        }
    }

    #[must_use]
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Marks the field as a foreign key to `entity`'s key column.
    #[must_use]
    pub const fn references(mut self, entity: &'static EntityMeta) -> Self {
        self.references = Some(entity);
        self
    }
}

/// Descriptor of an entity and the table it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    pub name: &'static str,
    pub table: &'static str,
    /// Fields in declaration order; this is also column order.
    pub fields: &'static [FieldMeta],
}

impl EntityMeta {
    #[must_use]
    pub const fn new(name: &'static str, table: &'static str, fields: &'static [FieldMeta]) -> Self {
        Self {
            name,
            table,
            fields,
        }
    }

    /// Returns the first primary key field, if any.
    #[must_use]
    pub fn key(&self) -> Option<&'static FieldMeta> {
        let fields = self.fields;
        fields.iter().find(|f| f.primary_key)
    }

    /// Looks up a field by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the entity has no such field.
    pub fn field(&self, name: &str) -> Result<&'static FieldMeta> {
        let fields = self.fields;
        fields.iter().find(|f| f.name == name).ok_or_else(|| {
            Error::schema_mismatch(format!("entity {} has no field '{name}'", self.name))
        })
    }

    /// Returns true when `field` is one of this entity's fields.
    #[must_use]
    pub fn contains(&self, field: &FieldMeta) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == field.name && f.column == field.column)
    }

    /// Foreign key fields paired with the entity they reference.
    pub fn relations(&self) -> impl Iterator<Item = (&'static FieldMeta, &'static EntityMeta)> {
        let fields = self.fields;
        fields
            .iter()
            .filter_map(|f| f.references.map(|target| (f, target)))
    }

    /// Same entity, compared by name and table.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.name == other.name && self.table == other.table
    }
}
