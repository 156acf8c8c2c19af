//! Post-run schema inspection
//!
//! Snapshots are built from live catalog queries every time; nothing is
//! cached between calls.

use crate::error::MigrateResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tm_core::sql_utils::{quote_ident, split_qualified};
use tm_db::Database;

/// Schema unqualified relation names resolve to.
const DEFAULT_SCHEMA: &str = "main";

/// Row count of one table, or why it could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowCount {
    Rows(usize),
    Unavailable { reason: String },
}

impl RowCount {
    pub fn rows(&self) -> Option<usize> {
        match self {
            RowCount::Rows(n) => Some(*n),
            RowCount::Unavailable { .. } => None,
        }
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Rows(n) => write!(f, "{n}"),
            RowCount::Unavailable { reason } => write!(f, "unavailable ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub name: String,
    pub row_count: RowCount,
}

/// Tables of one schema with their row counts, in name order.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSnapshot {
    pub schema: String,
    pub taken_at: DateTime<Utc>,
    pub tables: Vec<TableSnapshot>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// True if any table's count is unavailable.
    pub fn is_partial(&self) -> bool {
        self.tables.iter().any(|t| t.row_count.rows().is_none())
    }

    /// Sum of every available count.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().filter_map(|t| t.row_count.rows()).sum()
    }
}

/// Lists base tables and row counts of one schema.
pub struct SchemaInspector {
    db: Arc<dyn Database>,
    schema: String,
    ignored: Vec<(String, String)>,
}

impl SchemaInspector {
    pub fn new(db: Arc<dyn Database>, schema: impl Into<String>) -> Self {
        Self {
            db,
            schema: schema.into(),
            ignored: Vec::new(),
        }
    }

    /// Leave `table` out of snapshots. Unqualified names live in `main`.
    pub fn ignoring(mut self, table: &str) -> Self {
        let (schema, name) = split_qualified(table, DEFAULT_SCHEMA);
        self.ignored.push((schema.to_string(), name.to_string()));
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn is_ignored(&self, table: &str) -> bool {
        self.ignored
            .iter()
            .any(|(schema, name)| schema == &self.schema && name == table)
    }

    /// Take a fresh snapshot.
    ///
    /// Failing to list the tables is an error; failing to count one table is
    /// recorded on that table and the snapshot continues.
    pub async fn snapshot(&self) -> MigrateResult<SchemaSnapshot> {
        let names = self.db.list_tables(&self.schema).await?;
        let mut tables = Vec::with_capacity(names.len());

        for name in names {
            if self.is_ignored(&name) {
                continue;
            }
            let sql = format!(
                "SELECT * FROM {}.{}",
                quote_ident(&self.schema),
                quote_ident(&name)
            );
            let row_count = match self.db.query_count(&sql).await {
                Ok(n) => RowCount::Rows(n),
                Err(e) => {
                    log::warn!("Row count for {}.{} unavailable: {e}", self.schema, name);
                    RowCount::Unavailable {
                        reason: e.to_string(),
                    }
                }
            };
            tables.push(TableSnapshot { name, row_count });
        }

        Ok(SchemaSnapshot {
            schema: self.schema.clone(),
            taken_at: Utc::now(),
            tables,
        })
    }
}

#[cfg(test)]
#[path = "inspector_test.rs"]
mod tests;
