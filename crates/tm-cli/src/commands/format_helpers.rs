//! Text rendering of run reports and schema snapshots.

use tm_migrate::{RunReport, RunResult, SchemaSnapshot, UnitStatus};

/// Status marker shown in front of each unit line.
fn status_symbol(status: UnitStatus) -> &'static str {
    match status {
        UnitStatus::Applied => "✓",
        UnitStatus::Skipped => "-",
        UnitStatus::Failed | UnitStatus::ApplyAmbiguous => "✗",
        UnitStatus::Pending | UnitStatus::Applying => "·",
    }
}

pub(crate) fn format_result_line(result: &RunResult) -> String {
    let mut line = format!(
        "  {} {} ({})",
        status_symbol(result.status),
        result.name,
        result.status
    );
    if matches!(result.status, UnitStatus::Applied | UnitStatus::Failed) {
        line.push_str(&format!(" [{}ms]", result.duration_ms));
    }
    if !result.transactional {
        line.push_str(" [no transaction]");
    }
    if let Some(error) = &result.error {
        line.push_str(&format!(" - {error}"));
    }
    line
}

pub(crate) fn format_summary(report: &RunReport) -> String {
    let mut summary = format!(
        "Completed: {} applied, {} skipped, {} failed",
        report.count(UnitStatus::Applied),
        report.count(UnitStatus::Skipped),
        report.count(UnitStatus::Failed)
    );
    let ambiguous = report.count(UnitStatus::ApplyAmbiguous);
    if ambiguous > 0 {
        summary.push_str(&format!(", {ambiguous} ambiguous"));
    }
    let pending = report.count(UnitStatus::Pending);
    if pending > 0 {
        summary.push_str(&format!(", {pending} not attempted"));
    }
    summary
}

pub(crate) fn print_report(report: &RunReport) {
    let verb = if report.dry_run { "Planning" } else { "Running" };
    println!(
        "{verb} {} migration(s) (run {})...\n",
        report.results.len(),
        report.run_id
    );

    for warning in &report.warnings {
        println!("  ! {warning}");
    }
    if !report.warnings.is_empty() {
        println!();
    }

    for result in &report.results {
        println!("{}", format_result_line(result));
    }

    if let Some(halted) = &report.halted {
        println!("\n  Halted: {halted}");
    }
    println!("\n{}", format_summary(report));
}

pub(crate) fn snapshot_rows(snapshot: &SchemaSnapshot) -> Vec<Vec<String>> {
    snapshot
        .tables
        .iter()
        .map(|t| vec![t.name.clone(), t.row_count.to_string()])
        .collect()
}

pub(crate) fn print_snapshot(snapshot: &SchemaSnapshot) {
    println!(
        "Schema '{}': {} table(s)\n",
        snapshot.schema,
        snapshot.tables.len()
    );
    if snapshot.tables.is_empty() {
        println!("  (no tables)");
        return;
    }
    super::common::print_table(&["TABLE", "ROWS"], &snapshot_rows(snapshot));
}

#[cfg(test)]
#[path = "format_helpers_test.rs"]
mod tests;
