//! Error types shared by condition building, SQL compilation and migration
//! planning.

use thiserror::Error;

use crate::condition::ConditionKind;
use crate::meta::FieldType;

/// Errors raised before anything reaches a database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A caller-supplied argument is out of range or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A field, table or relation does not belong to the entity metadata
    /// it is used with.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A visitor was asked to handle a condition kind it does not support.
    #[error("unsupported condition kind: {0}")]
    UnsupportedConditionKind(ConditionKind),

    /// No type mapping is registered for a field type.
    #[error("no type mapping registered for {0}")]
    UnmappedType(FieldType),

    /// A stored value cannot be converted to the requested Rust type.
    #[error("cannot convert {found} value to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The schema differ could not produce a plan.
    #[error("migration planning failed: {0}")]
    MigrationPlanning(String),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
