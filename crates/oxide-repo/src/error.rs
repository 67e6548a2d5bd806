//! Error types for repositories.

use thiserror::Error;

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Building, compiling or planning failed before reaching the backend.
    #[error(transparent)]
    Core(#[from] oxide_repo_core::Error),

    /// A single-result query matched more than one row.
    #[error("query returned more than one row where at most one was expected")]
    MultipleResults,

    /// An insert into a table with a generated key did not return exactly
    /// one key.
    #[error("insert into {entity} returned {returned} generated key rows, expected 1")]
    GeneratedKey { entity: &'static str, returned: usize },

    /// A row could not be turned into an entity.
    #[error("cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The backend failed while executing a statement.
    #[error("executor error: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepoError {
    pub fn executor<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Executor(Box::new(error))
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;
