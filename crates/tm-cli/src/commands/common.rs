//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tm_core::{Config, DirectorySource};
use tm_db::{Database, DuckDbBackend};
use tm_migrate::MigrationLedger;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs maps it to the process status without
        // printing anything.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Project directory plus its loaded configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_dir_absolute(&self.root)
    }

    pub(crate) fn source(&self) -> DirectorySource {
        DirectorySource::new(self.migrations_dir())
    }

    pub(crate) fn ledger(&self, db: &Arc<dyn Database>) -> MigrationLedger {
        MigrationLedger::new(db.clone(), self.config.ledger_table.clone())
    }
}

/// Load the project config from `--config` or the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load configuration")?;
    log::debug!("Loaded configuration for {}", root.display());
    Ok(Project { root, config })
}

/// Resolve the connection string and open the database.
///
/// A missing connection string fails here, before any connection attempt.
pub(crate) fn connect(project: &Project, global: &GlobalArgs) -> Result<Arc<dyn Database>> {
    let url = project
        .config
        .resolve_database_url(global.database_url.as_deref())?;
    let db = DuckDbBackend::from_url(&url)
        .with_context(|| format!("Failed to open database '{url}'"))?;
    log::info!("Connected to {url}");
    Ok(Arc::new(db))
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
///
/// For each column, returns the maximum width across the header and all
/// row values so that data aligns when printed with left-padding.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Render a table: header row, dashed separator, then each data row.
/// Columns are separated by two spaces and trailing padding is trimmed.
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(headers.iter().map(|h| h.to_string()).collect()));
    lines.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        lines.push(line(row.clone()));
    }
    lines
}

/// Print a formatted table to stdout.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in render_table(headers, rows) {
        println!("{line}");
    }
}

/// Serialize `data` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
