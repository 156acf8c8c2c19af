//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// TM001: Failed to parse configuration file
    #[error("[TM001] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// TM002: Invalid configuration value
    #[error("[TM002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// TM003: No connection string supplied
    #[error("[TM003] No database connection string: pass --database-url or set {env_var}")]
    MissingDatabaseUrl { env_var: String },

    /// TM004: Two migration units share an ordinal
    #[error("[TM004] Ambiguous migration order: '{first}' and '{second}' both have ordinal {ordinal}")]
    AmbiguousOrdinal {
        ordinal: u64,
        first: String,
        second: String,
    },

    /// TM005: Migration name does not follow `<ordinal>_<description>`
    #[error("[TM005] Invalid migration name '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// TM006: Migrations directory does not exist
    #[error("[TM006] Migrations directory not found: {path}")]
    SourceNotFound { path: String },

    /// TM007: A migration script could not be read
    #[error("[TM007] Cannot read migration {path}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TM008: Requested target migration is not in the source
    #[error("[TM008] Target migration '{name}' not found in source")]
    UnknownTarget { name: String },

    /// TM009: A transactional script issues its own BEGIN/COMMIT/ROLLBACK
    #[error("[TM009] Migration '{name}' controls its own transaction ('{statement}'); remove the statement or start the script with '-- tidemark:no-transaction'")]
    TransactionControl { name: String, statement: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this error belongs to the configuration class (bad settings or
    /// ambiguous ordering) rather than an unreadable or malformed source.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CoreError::ConfigParseError { .. }
                | CoreError::ConfigInvalid { .. }
                | CoreError::MissingDatabaseUrl { .. }
                | CoreError::AmbiguousOrdinal { .. }
                | CoreError::UnknownTarget { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
