//! Database trait definitions
//!
//! The trait is split by concern: [`DatabaseCore`] executes SQL and manages
//! transactions, [`DatabaseSchema`] reads back catalog and row data.
//! [`Database`] is the union every backend provides.

use crate::error::{DbError, DbResult};
use async_trait::async_trait;

/// SQL execution and transaction control.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait DatabaseCore: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute one or more `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Open an explicit transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Run `sql` as one atomic unit: `BEGIN`, the whole batch, `COMMIT`.
    ///
    /// The transaction is rolled back on any failure, including a failed
    /// `COMMIT`, so no exit path leaves it open. If the batch fails and the
    /// `ROLLBACK` fails as well, the transaction already ended inside the
    /// batch and the result is [`DbError::PartiallyApplied`].
    async fn execute_in_transaction(&self, sql: &str) -> DbResult<()> {
        self.begin().await?;

        if let Err(err) = self.execute_batch(sql).await {
            return match self.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => Err(DbError::PartiallyApplied(format!(
                    "{err}; ROLLBACK: {rollback_err}"
                ))),
            };
        }

        if let Err(commit_err) = self.commit().await {
            if let Err(rollback_err) = self.rollback().await {
                log::warn!("ROLLBACK after failed COMMIT also failed: {rollback_err}");
            }
            return Err(DbError::TransactionError(format!(
                "COMMIT failed: {commit_err}"
            )));
        }
        Ok(())
    }
}

/// Catalog and data read-back.
#[async_trait]
pub trait DatabaseSchema: Send + Sync {
    /// Count the rows produced by a query
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Run a query and return every row as text.
    ///
    /// Columns must be textual; cast anything else to `VARCHAR` in the SQL.
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Base tables in `schema`, sorted by name
    async fn list_tables(&self, schema: &str) -> DbResult<Vec<String>>;

    /// Check if a table or view exists; `name` may be schema-qualified
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;
}

/// Full connection to a migration target.
pub trait Database: DatabaseCore + DatabaseSchema {}

impl<T: DatabaseCore + DatabaseSchema + ?Sized> Database for T {}
