//! tm-migrate - Migration engine for Tidemark
//!
//! This crate applies ordered migration units to a database exactly once
//! each, keeps the ledger of applied units inside that database, and
//! snapshots the resulting schema.

pub mod error;
pub mod inspector;
pub mod ledger;
pub mod report;
pub mod runner;

pub use error::{ErrorKind, LedgerError, LedgerResult, MigrateError, MigrateResult};
pub use inspector::{RowCount, SchemaInspector, SchemaSnapshot, TableSnapshot};
pub use ledger::{audit, LedgerEntry, LedgerWarning, MigrationLedger};
pub use report::{HaltReason, RunReport, RunResult, UnitStatus};
pub use runner::{MigrationRunner, RunOptions};
