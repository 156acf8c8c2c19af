//! Inspect command implementation

use anyhow::{Context, Result};
use tm_migrate::SchemaInspector;

use crate::cli::{GlobalArgs, InspectArgs, OutputFormat};
use crate::commands::common;
use crate::commands::format_helpers::print_snapshot;

/// Execute the inspect command
pub async fn execute(args: &InspectArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let db = common::connect(&project, global)?;

    let schema = args
        .schema
        .clone()
        .unwrap_or_else(|| project.config.schema.clone());
    let snapshot = SchemaInspector::new(db, schema)
        .ignoring(&project.config.ledger_table)
        .snapshot()
        .await
        .context("Failed to inspect schema")?;

    match args.output {
        OutputFormat::Json => common::print_json(&snapshot)?,
        OutputFormat::Text => print_snapshot(&snapshot),
    }
    Ok(())
}
