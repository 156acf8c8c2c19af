//! Migration runner
//!
//! Applies the ordered units of a [`MigrationSource`] one at a time. Each unit
//! is either skipped (already in the ledger) or executed and then recorded;
//! the ledger write happens only after the unit's transaction has committed
//! and is never part of it.

use crate::error::MigrateResult;
use crate::ledger::{audit, MigrationLedger};
use crate::report::{HaltReason, RunReport, RunResult, UnitStatus};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tm_core::{select_through, FailurePolicy, MigrationSource, MigrationUnit};
use tm_db::{Database, DbError, DbResult};
use uuid::Uuid;

/// Per-invocation knobs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    /// Stop after this unit (inclusive).
    pub target: Option<String>,
    /// Plan only; nothing is executed or written.
    pub dry_run: bool,
}

/// Drives the ordered units of a source against one database.
pub struct MigrationRunner {
    db: Arc<dyn Database>,
    source: Box<dyn MigrationSource>,
    ledger: MigrationLedger,
    options: RunOptions,
}

impl MigrationRunner {
    pub fn new(
        db: Arc<dyn Database>,
        source: Box<dyn MigrationSource>,
        ledger: MigrationLedger,
    ) -> Self {
        Self {
            db,
            source,
            ledger,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.policy = policy;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    /// Ordered units this runner would consider, after applying `target`.
    pub fn plan(&self) -> MigrateResult<Vec<MigrationUnit>> {
        let units = self.source.list()?;
        match &self.options.target {
            Some(target) => Ok(select_through(units, target)?),
            None => Ok(units),
        }
    }

    /// Execute the plan and return the per-unit report.
    ///
    /// Source and configuration problems are returned as errors before the
    /// database is touched. Everything that happens once units are being
    /// evaluated is captured in the report instead.
    pub async fn run(&self) -> MigrateResult<RunReport> {
        let units = self.plan()?;
        let run_id = Uuid::new_v4().to_string()[..8].to_string();
        log::info!(
            "Run {}: {} unit(s) from {} (policy: {}{})",
            run_id,
            units.len(),
            self.source.describe(),
            self.options.policy,
            if self.options.dry_run { ", dry run" } else { "" }
        );

        let entries = if self.options.dry_run {
            self.ledger.entries_if_exists().await?
        } else {
            self.ledger.ensure().await?;
            self.ledger.entries().await?
        };

        let warnings = audit(&units, &entries);
        for warning in &warnings {
            log::warn!("{warning}");
        }

        let mut report = RunReport {
            run_id,
            started_at: Utc::now(),
            policy: self.options.policy,
            dry_run: self.options.dry_run,
            results: units.iter().map(RunResult::pending).collect(),
            halted: None,
            warnings,
        };

        if self.options.dry_run {
            let recorded: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            for result in &mut report.results {
                if recorded.contains(result.name.as_str()) {
                    transition(result, UnitStatus::Skipped);
                }
            }
            return Ok(report);
        }

        for (idx, unit) in units.iter().enumerate() {
            let name = unit.name().as_str();
            let result = &mut report.results[idx];

            match self.ledger.has_applied(name).await {
                Ok(true) => {
                    transition(result, UnitStatus::Skipped);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("Ledger lookup for {name} failed: {e}");
                    report.halted = Some(HaltReason::LedgerUnavailable {
                        unit: name.to_string(),
                        message: e.to_string(),
                    });
                    break;
                }
            }

            transition(result, UnitStatus::Applying);
            let started = Instant::now();
            let executed = self.execute_body(unit).await;

            if let Err(e) = executed {
                result.duration_ms = elapsed_ms(started);
                result.error = Some(e.to_string());
                if matches!(e, DbError::PartiallyApplied(_)) {
                    log::error!("{name} failed after part of it was committed: {e}");
                    transition(result, UnitStatus::ApplyAmbiguous);
                    report.halted = Some(HaltReason::ApplyAmbiguous {
                        unit: name.to_string(),
                    });
                    break;
                }
                transition(result, UnitStatus::Failed);
                if unit.is_transactional() {
                    log::warn!("{name} failed and was rolled back: {e}");
                } else {
                    log::warn!("{name} failed: {e}");
                }
                if self.options.policy == FailurePolicy::Abort {
                    report.halted = Some(HaltReason::FailurePolicy {
                        unit: name.to_string(),
                    });
                    break;
                }
                continue;
            }

            let recorded = self
                .ledger
                .record_applied(name, Utc::now(), unit.checksum())
                .await;
            result.duration_ms = elapsed_ms(started);
            match recorded {
                Ok(()) => transition(result, UnitStatus::Applied),
                Err(e) => {
                    log::error!("{name} committed but could not be recorded: {e}");
                    result.error = Some(e.to_string());
                    transition(result, UnitStatus::ApplyAmbiguous);
                    report.halted = Some(HaltReason::ApplyAmbiguous {
                        unit: name.to_string(),
                    });
                    break;
                }
            }
        }

        Ok(report)
    }

    async fn execute_body(&self, unit: &MigrationUnit) -> DbResult<()> {
        if unit.body().trim().is_empty() {
            log::debug!("{} has an empty body", unit.name());
            return Ok(());
        }
        if unit.is_transactional() {
            self.db.execute_in_transaction(unit.body()).await
        } else {
            log::warn!(
                "{} runs without a transaction; a failure can leave it partially applied",
                unit.name()
            );
            self.db.execute_batch(unit.body()).await
        }
    }
}

fn transition(result: &mut RunResult, to: UnitStatus) {
    log::debug!("{}: {} -> {}", result.name, result.status, to);
    result.status = to;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
