//! tm-core - Core library for Tidemark
//!
//! This crate provides the types shared by every Tidemark component:
//! configuration parsing, migration names and units, and the sources that
//! discover and order migration units.

pub mod checksum;
pub mod config;
pub mod error;
pub mod migration;
pub mod migration_name;
pub mod source;
pub mod sql_utils;

pub use checksum::compute_checksum;
pub use config::{Config, FailurePolicy};
pub use error::{CoreError, CoreResult};
pub use migration::{MigrationUnit, NO_TRANSACTION_DIRECTIVE};
pub use migration_name::MigrationName;
pub use source::{order_units, select_through, DirectorySource, MigrationSource, StaticSource};
