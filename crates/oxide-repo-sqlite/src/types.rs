//! SQLite storage of field types.
//!
//! SQLite has five storage classes. Booleans become `0`/`1` integers and
//! dates become epoch milliseconds so they sort and compare numerically.

use chrono::{DateTime, Utc};
use oxide_repo_core::meta::FieldType;
use oxide_repo_core::types::{TypeMapping, TypeMappingRegistry, TypeMappings};
use oxide_repo_core::value::SqlValue;

/// SQLite mappings, installed over the generic ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTypeMappings;

impl TypeMappings for SqliteTypeMappings {
    fn install(&self, registry: &mut TypeMappingRegistry) {
        registry.register(
            FieldType::Text,
            TypeMapping::new("TEXT", SqlValue::Text(String::new())),
        );
        registry.register(FieldType::Integer, TypeMapping::new("INTEGER", SqlValue::Int(0)));
        registry.register(FieldType::Real, TypeMapping::new("REAL", SqlValue::Float(0.0)));
        registry.register(
            FieldType::Boolean,
            TypeMapping::new("INTEGER", SqlValue::Bool(false)).with_encoder(encode_bool),
        );
        registry.register(
            FieldType::Date,
            TypeMapping::new("INTEGER", SqlValue::Timestamp(DateTime::<Utc>::UNIX_EPOCH))
                .with_encoder(encode_date),
        );
        registry.register(
            FieldType::Enum,
            TypeMapping::new("TEXT", SqlValue::Text(String::new())),
        );
        registry.register(FieldType::Blob, TypeMapping::new("BLOB", SqlValue::Blob(Vec::new())));
    }
}

fn encode_bool(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Bool(b) => SqlValue::Int(i64::from(b)),
        other => other,
    }
}

fn encode_date(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Timestamp(at) => SqlValue::Int(at.timestamp_millis()),
        other => other,
    }
}
