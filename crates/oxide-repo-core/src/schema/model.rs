//! Schema representation types.
//!
//! The same types describe what the entity metadata expects and what a
//! backend reports, so the differ can compare them column by column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::meta::{EntityMeta, FieldType};
use crate::types::TypeMappingRegistry;

/// Target of a foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Backend column type, as declared in DDL.
    pub sql_type: String,
    /// Logical type, known for columns derived from entity metadata.
    pub field_type: Option<FieldType>,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnSchema {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            field_type: None,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            references: None,
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    #[must_use]
    pub fn with_field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Tables this table's foreign keys point at, self excluded.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref())
            .map(|fk| fk.table.as_str())
            .filter(move |table| *table != self.name)
    }

    /// Table derived from entity metadata, with column types resolved
    /// through `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`](crate::error::Error::UnmappedType)
    /// when a field type has no mapping.
    pub fn from_entity(entity: &EntityMeta, registry: &TypeMappingRegistry) -> Result<Self> {
        let mut table = Self::new(entity.table);
        for field in entity.fields {
            let mut column = ColumnSchema::new(field.column, registry.column_type(field.field_type)?)
                .with_field_type(field.field_type);
            if !field.nullable {
                column = column.not_null();
            }
            if field.primary_key {
                column = column.primary_key();
                if field.generated {
                    column = column.auto_increment();
                }
            }
            if let Some(target) = field.references {
                let target_column = target.key().map_or("id", |key| key.column);
                column = column.references(target.table, target_column);
            }
            table.columns.push(column);
        }
        Ok(table)
    }
}

/// A set of tables keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected schema of `entities`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmappedType`](crate::error::Error::UnmappedType)
    /// when a field type has no mapping.
    pub fn from_entities(entities: &[&EntityMeta], registry: &TypeMappingRegistry) -> Result<Self> {
        let mut model = Self::new();
        for entity in entities {
            model.add_table(TableSchema::from_entity(entity, registry)?);
        }
        Ok(model)
    }

    #[must_use]
    pub fn table(mut self, table: TableSchema) -> Self {
        self.add_table(table);
        self
    }

    /// Adds or replaces a table.
    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), table);
    }

    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
