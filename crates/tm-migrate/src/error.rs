//! Error types for the migration engine.

use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Failures of the ledger's own bookkeeping.
///
/// Every variant is fatal to a run: once the ledger cannot be trusted, going
/// on risks re-applying or double-applying migrations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Ledger table could not be created, read or written (L001).
    #[error("[L001] Migration ledger unavailable during {operation}: {source}")]
    Unavailable {
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// A second record for the same migration was inserted (L002).
    #[error("[L002] Migration '{name}' is already recorded in the ledger")]
    Duplicate { name: String },

    /// A ledger row could not be decoded (L003).
    #[error("[L003] Malformed ledger row: {message}")]
    Corrupt { message: String },
}

/// Result type alias for [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that stop a run (or a snapshot) before it produces a report.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration or source problem, raised before the database is touched.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Ledger bootstrap or read failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Inspection query failed as a whole.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Broad error class, matching the categories users act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Source,
    Ledger,
    Execution,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Core(e) if e.is_configuration_error() => ErrorKind::Configuration,
            MigrateError::Core(_) => ErrorKind::Source,
            MigrateError::Ledger(_) => ErrorKind::Ledger,
            MigrateError::Db(_) => ErrorKind::Execution,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
