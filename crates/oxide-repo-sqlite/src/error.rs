//! Error types for the SQLite backend.

use oxide_repo::RepoError;

/// Errors raised by the SQLite backend.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// Database error reported by sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository-level failure while running a schema operation.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Compilation or planning failure.
    #[error(transparent)]
    Core(#[from] oxide_repo_core::Error),

    /// The catalog holds something the schema model cannot describe.
    #[error("Schema introspection failed: {0}")]
    Introspection(String),

    /// Rows violate foreign keys after a schema upgrade.
    #[error("Foreign key check failed with {0} violating row(s)")]
    ForeignKeyViolation(usize),
}

impl From<SqliteError> for RepoError {
    fn from(error: SqliteError) -> Self {
        match error {
            SqliteError::Repo(inner) => inner,
            SqliteError::Core(inner) => Self::Core(inner),
            other => Self::executor(other),
        }
    }
}

/// Result type alias for SQLite backend operations.
pub type Result<T> = std::result::Result<T, SqliteError>;
