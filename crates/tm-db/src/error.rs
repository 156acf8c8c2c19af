//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table, view or its schema not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Unique/primary key or other constraint violated (D004)
    #[error("[D004] Constraint violated: {0}")]
    ConstraintViolation(String),

    /// BEGIN/COMMIT/ROLLBACK failed (D005)
    #[error("[D005] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// A batch failed and its ROLLBACK failed too (D007)
    ///
    /// Statements before the failure may already be committed.
    #[error("[D007] Batch failed and could not be rolled back; earlier statements may have been applied: {0}")]
    PartiallyApplied(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured kind for these cases; classify
        // on the message with narrow patterns.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || msg.contains("Schema with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else if msg.contains("Constraint Error") || msg.contains("Duplicate key") {
            DbError::ConstraintViolation(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
