//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{DatabaseCore, DatabaseSchema};
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tm_core::sql_utils::{quote_literal, split_qualified};

/// URL scheme accepted in front of a DuckDB file path.
pub const DUCKDB_URL_SCHEME: &str = "duckdb://";

/// DuckDB database backend
///
/// The connection is shared behind a mutex but used strictly sequentially;
/// an open transaction belongs to whichever caller issued `begin`.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open from a connection string: `:memory:`, `duckdb://<path>` or a bare path
    pub fn from_url(url: &str) -> DbResult<Self> {
        let target = url.strip_prefix(DUCKDB_URL_SCHEME).unwrap_or(url).trim();
        if target.is_empty() {
            return Err(DbError::ConnectionError(format!(
                "connection string '{url}' has no database path"
            )));
        }
        if target == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(target))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, []).map_err(DbError::from)
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn transaction_sync(&self, stmt: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(stmt)
            .map_err(|e| DbError::TransactionError(format!("{stmt} failed: {e}")))
    }

    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_strings)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

/// Read every column of `row` as optional text, stopping at the first index
/// past the end of the row.
fn row_to_strings(row: &duckdb::Row<'_>) -> duckdb::Result<Vec<Option<String>>> {
    let mut values = Vec::new();
    loop {
        match row.get::<_, Option<String>>(values.len()) {
            Ok(value) => values.push(value),
            Err(duckdb::Error::InvalidColumnIndex(_)) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(values)
}

#[async_trait]
impl DatabaseCore for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl DatabaseSchema for DuckDbBackend {
    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        self.query_rows_sync(sql)
    }

    async fn list_tables(&self, schema: &str) -> DbResult<Vec<String>> {
        let sql = format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = {} AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            quote_literal(schema)
        );
        let rows = self.query_rows_sync(&sql)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(name, "main");
        let sql = format!(
            "SELECT * FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
            quote_literal(schema),
            quote_literal(table)
        );
        Ok(self.query_count_sync(&sql)? > 0)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
