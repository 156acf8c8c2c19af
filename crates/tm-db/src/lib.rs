//! tm-db - Database abstraction layer for Tidemark
//!
//! This crate provides the `Database` connection traits and the DuckDB
//! implementation migrations are applied through.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, DatabaseCore, DatabaseSchema};
