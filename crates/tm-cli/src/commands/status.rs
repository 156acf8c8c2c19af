//! Status command implementation
//!
//! Compares the migration source against the ledger without writing
//! anything; a database with no ledger table reads as nothing applied.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tm_core::{MigrationSource, MigrationUnit};
use tm_migrate::{audit, LedgerEntry, LedgerWarning};

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UnitState {
    Applied,
    Pending,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Applied => write!(f, "applied"),
            UnitState::Pending => write!(f, "pending"),
        }
    }
}

/// One row of `tidemark status`
#[derive(Debug, Serialize)]
pub(crate) struct StatusRow {
    pub(crate) name: String,
    pub(crate) state: UnitState,
    pub(crate) applied_at: Option<DateTime<Utc>>,
    pub(crate) drifted: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    ledger_table: String,
    applied_count: usize,
    pending_count: usize,
    units: Vec<StatusRow>,
    warnings: Vec<LedgerWarning>,
}

/// Join the ordered units with the ledger rows.
pub(crate) fn build_rows(units: &[MigrationUnit], entries: &[LedgerEntry]) -> Vec<StatusRow> {
    let recorded: HashMap<&str, &LedgerEntry> =
        entries.iter().map(|e| (e.name.as_str(), e)).collect();
    units
        .iter()
        .map(|unit| match recorded.get(unit.name().as_str()) {
            Some(entry) => StatusRow {
                name: unit.name().to_string(),
                state: UnitState::Applied,
                applied_at: Some(entry.applied_at),
                drifted: entry
                    .checksum
                    .as_deref()
                    .is_some_and(|sum| sum != unit.checksum()),
            },
            None => StatusRow {
                name: unit.name().to_string(),
                state: UnitState::Pending,
                applied_at: None,
                drifted: false,
            },
        })
        .collect()
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let units = project
        .source()
        .list()
        .context("Failed to load migrations")?;

    let db = common::connect(&project, global)?;
    let entries = project
        .ledger(&db)
        .entries_if_exists()
        .await
        .context("Failed to read migration ledger")?;

    let warnings = audit(&units, &entries);
    let rows = build_rows(&units, &entries);
    let applied_count = rows.iter().filter(|r| r.state == UnitState::Applied).count();

    match args.output {
        OutputFormat::Json => common::print_json(&StatusOutput {
            ledger_table: project.config.ledger_table.clone(),
            applied_count,
            pending_count: rows.len() - applied_count,
            units: rows,
            warnings,
        })?,
        OutputFormat::Text => {
            println!(
                "{} migration(s): {} applied, {} pending\n",
                rows.len(),
                applied_count,
                rows.len() - applied_count
            );
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.name.clone(),
                        if r.drifted {
                            "applied (changed)".to_string()
                        } else {
                            r.state.to_string()
                        },
                        r.applied_at
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            common::print_table(&["MIGRATION", "STATE", "APPLIED AT"], &table);

            if !warnings.is_empty() {
                println!();
                for warning in &warnings {
                    println!("  ! {warning}");
                }
            }
        }
    }
    Ok(())
}
