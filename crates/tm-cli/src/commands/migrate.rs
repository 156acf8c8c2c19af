//! Migrate command implementation
//!
//! Runs every pending migration, then snapshots the resulting schema.
//! Exits non-zero when a unit failed or ended ambiguous, or when the ledger
//! halted the run.

use anyhow::{Context, Result};
use serde::Serialize;
use tm_core::{FailurePolicy, MigrationSource};
use tm_migrate::{MigrationRunner, RunOptions, RunReport, SchemaInspector, SchemaSnapshot};

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{self, ExitCode};
use crate::commands::format_helpers::{print_report, print_snapshot};

/// JSON document printed with `--output json`
#[derive(Debug, Serialize)]
struct MigrateOutput<'a> {
    success: bool,
    report: &'a RunReport,
    snapshot: &'a SchemaSnapshot,
}

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let source = project.source();

    // Source problems (unreadable scripts, duplicate ordinals) fail before
    // the database is opened.
    let units = source.list().context("Failed to load migrations")?;
    log::info!("Found {} migration(s) in {}", units.len(), source.describe());

    let policy = if args.continue_on_failure {
        FailurePolicy::Continue
    } else {
        project.config.failure_policy
    };

    let db = common::connect(&project, global)?;
    let runner = MigrationRunner::new(db.clone(), Box::new(source), project.ledger(&db))
        .with_options(RunOptions {
            policy,
            target: args.target.clone(),
            dry_run: args.dry_run,
        });
    let report = runner.run().await.context("Migration run failed")?;

    let snapshot = SchemaInspector::new(db, project.config.schema.clone())
        .ignoring(&project.config.ledger_table)
        .snapshot()
        .await
        .context("Failed to inspect schema")?;

    match args.output {
        OutputFormat::Json => common::print_json(&MigrateOutput {
            success: report.is_success(),
            report: &report,
            snapshot: &snapshot,
        })?,
        OutputFormat::Text => {
            print_report(&report);
            println!();
            print_snapshot(&snapshot);
        }
    }

    if !report.is_success() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
