//! Migration ledger: the durable record of applied migrations.
//!
//! The ledger lives in a table inside the database being migrated, so schema
//! state and bookkeeping commit to the same storage and survive restarts
//! together. The `name` column is the primary key: a second runner racing on
//! the same unit fails on insert instead of recording it twice.

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tm_core::sql_utils::{quote_literal, quote_qualified, split_qualified};
use tm_core::MigrationUnit;
use tm_db::{Database, DbError};

/// `applied_at` layout on write; DuckDB timestamps hold microseconds.
const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// `applied_at` layout on read; the fraction is omitted when zero.
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One applied migration as recorded in the ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub checksum: Option<String>,
}

/// Handle on the ledger table.
pub struct MigrationLedger {
    db: Arc<dyn Database>,
    table: String,
}

impl MigrationLedger {
    /// `table` may be schema-qualified (`ops.tidemark_migrations`).
    pub fn new(db: Arc<dyn Database>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn quoted_table(&self) -> String {
        quote_qualified(&self.table)
    }

    /// Create the ledger table (and its schema) if it does not exist yet.
    pub async fn ensure(&self) -> LedgerResult<()> {
        let unavailable = |source| LedgerError::Unavailable {
            operation: "bootstrap",
            source,
        };

        if let Some(pos) = self.table.rfind('.') {
            let schema = &self.table[..pos];
            self.db
                .execute_batch(&format!(
                    "CREATE SCHEMA IF NOT EXISTS {}",
                    quote_qualified(schema)
                ))
                .await
                .map_err(unavailable)?;
        }

        self.db
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     name       VARCHAR PRIMARY KEY,
                     applied_at TIMESTAMP NOT NULL,
                     checksum   VARCHAR
                 )",
                self.quoted_table()
            ))
            .await
            .map_err(unavailable)?;
        log::debug!("Ledger table {} ready", self.table);
        Ok(())
    }

    /// Whether the ledger table exists, without creating it.
    pub async fn exists(&self) -> LedgerResult<bool> {
        self.db
            .relation_exists(&self.table)
            .await
            .map_err(|source| LedgerError::Unavailable {
                operation: "existence check",
                source,
            })
    }

    /// Whether `name` has a ledger row.
    pub async fn has_applied(&self, name: &str) -> LedgerResult<bool> {
        let sql = format!(
            "SELECT name FROM {} WHERE name = {}",
            self.quoted_table(),
            quote_literal(name)
        );
        let count = self
            .db
            .query_count(&sql)
            .await
            .map_err(|source| LedgerError::Unavailable {
                operation: "lookup",
                source,
            })?;
        Ok(count > 0)
    }

    /// Insert the ledger row for a unit whose body has committed.
    pub async fn record_applied(
        &self,
        name: &str,
        applied_at: DateTime<Utc>,
        checksum: &str,
    ) -> LedgerResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, applied_at, checksum) VALUES ({}, TIMESTAMP {}, {})",
            self.quoted_table(),
            quote_literal(name),
            quote_literal(&applied_at.naive_utc().format(TIMESTAMP_WRITE_FORMAT).to_string()),
            quote_literal(checksum)
        );
        match self.db.execute(&sql).await {
            Ok(_) => Ok(()),
            Err(DbError::ConstraintViolation(_)) => Err(LedgerError::Duplicate {
                name: name.to_string(),
            }),
            Err(source) => Err(LedgerError::Unavailable {
                operation: "record",
                source,
            }),
        }
    }

    /// Every ledger row, ordered by name.
    pub async fn entries(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT name, CAST(applied_at AS VARCHAR), checksum FROM {} ORDER BY name",
            self.quoted_table()
        );
        let rows = self
            .db
            .query_rows(&sql)
            .await
            .map_err(|source| LedgerError::Unavailable {
                operation: "read",
                source,
            })?;
        rows.into_iter().map(decode_entry).collect()
    }

    /// Ledger rows if the table exists, otherwise an empty list. Never writes.
    pub async fn entries_if_exists(&self) -> LedgerResult<Vec<LedgerEntry>> {
        match self.entries().await {
            Err(LedgerError::Unavailable {
                source: DbError::TableNotFound(_),
                ..
            }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Unqualified table name and its schema, defaulting to `default_schema`.
    pub fn location<'a>(&'a self, default_schema: &'a str) -> (&'a str, &'a str) {
        split_qualified(&self.table, default_schema)
    }
}

impl fmt::Debug for MigrationLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationLedger")
            .field("table", &self.table)
            .field("db", &self.db.db_type())
            .finish()
    }
}

fn decode_entry(row: Vec<Option<String>>) -> LedgerResult<LedgerEntry> {
    let mut cols = row.into_iter();
    let name = cols.next().flatten().ok_or_else(|| LedgerError::Corrupt {
        message: "row without a name".to_string(),
    })?;
    let raw_ts = cols.next().flatten().ok_or_else(|| LedgerError::Corrupt {
        message: format!("{name}: missing applied_at"),
    })?;
    let applied_at = NaiveDateTime::parse_from_str(&raw_ts, TIMESTAMP_READ_FORMAT)
        .map_err(|e| LedgerError::Corrupt {
            message: format!("{name}: applied_at '{raw_ts}': {e}"),
        })?
        .and_utc();
    let checksum = cols.next().flatten();
    Ok(LedgerEntry {
        name,
        applied_at,
        checksum,
    })
}

/// Inconsistency between the ordered source and the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerWarning {
    /// `missing` is not applied although the later `applied_later` is.
    Gap {
        missing: String,
        applied_later: String,
    },
    /// A ledger row names a migration the source does not contain.
    Unknown { name: String },
    /// The script changed after it was applied.
    ChecksumDrift { name: String },
}

impl fmt::Display for LedgerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerWarning::Gap {
                missing,
                applied_later,
            } => write!(
                f,
                "'{missing}' is not applied but later migration '{applied_later}' is"
            ),
            LedgerWarning::Unknown { name } => {
                write!(f, "ledger records '{name}' which is not in the migration source")
            }
            LedgerWarning::ChecksumDrift { name } => {
                write!(f, "'{name}' changed after it was applied")
            }
        }
    }
}

/// Compare the ordered units against ledger rows.
pub fn audit(units: &[MigrationUnit], entries: &[LedgerEntry]) -> Vec<LedgerWarning> {
    let recorded: HashMap<&str, &LedgerEntry> =
        entries.iter().map(|e| (e.name.as_str(), e)).collect();
    let mut warnings = Vec::new();

    for (idx, unit) in units.iter().enumerate() {
        match recorded.get(unit.name().as_str()) {
            Some(entry) => {
                let drifted = entry
                    .checksum
                    .as_deref()
                    .is_some_and(|sum| sum != unit.checksum());
                if drifted {
                    warnings.push(LedgerWarning::ChecksumDrift {
                        name: unit.name().to_string(),
                    });
                }
            }
            None => {
                let later = units[idx + 1..]
                    .iter()
                    .find(|u| recorded.contains_key(u.name().as_str()));
                if let Some(later) = later {
                    warnings.push(LedgerWarning::Gap {
                        missing: unit.name().to_string(),
                        applied_later: later.name().to_string(),
                    });
                }
            }
        }
    }

    for entry in entries {
        if !units.iter().any(|u| u.name() == entry.name.as_str()) {
            warnings.push(LedgerWarning::Unknown {
                name: entry.name.clone(),
            });
        }
    }
    warnings
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
