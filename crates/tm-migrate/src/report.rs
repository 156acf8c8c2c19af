//! Run report types
//!
//! A [`RunReport`] is the ordered, per-unit record of one runner invocation.
//! It is built incrementally by the runner and handed back whole; nothing
//! else mutates it.

use crate::ledger::LedgerWarning;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tm_core::{FailurePolicy, MigrationUnit};

/// Lifecycle state of one migration unit within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Not attempted (yet).
    Pending,
    /// Body is executing.
    Applying,
    Applied,
    /// Already recorded in the ledger.
    Skipped,
    /// Body failed and was rolled back.
    Failed,
    /// Some or all of the body committed but the unit is not recorded.
    ApplyAmbiguous,
}

impl UnitStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitStatus::Applied
                | UnitStatus::Skipped
                | UnitStatus::Failed
                | UnitStatus::ApplyAmbiguous
        )
    }

    pub fn is_error(self) -> bool {
        matches!(self, UnitStatus::Failed | UnitStatus::ApplyAmbiguous)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Pending => write!(f, "not attempted"),
            UnitStatus::Applying => write!(f, "applying"),
            UnitStatus::Applied => write!(f, "applied"),
            UnitStatus::Skipped => write!(f, "skipped"),
            UnitStatus::Failed => write!(f, "failed"),
            UnitStatus::ApplyAmbiguous => write!(f, "apply ambiguous"),
        }
    }
}

/// Outcome for a single unit
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub name: String,
    pub ordinal: u64,
    pub status: UnitStatus,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub transactional: bool,
}

impl RunResult {
    pub(crate) fn pending(unit: &MigrationUnit) -> Self {
        Self {
            name: unit.name().to_string(),
            ordinal: unit.ordinal(),
            status: UnitStatus::Pending,
            error: None,
            duration_ms: 0,
            transactional: unit.is_transactional(),
        }
    }
}

/// Why a run stopped before reaching the end of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// `abort` policy stopped after this unit failed.
    FailurePolicy { unit: String },
    /// The ledger could not be consulted for this unit.
    LedgerUnavailable { unit: String, message: String },
    /// This unit's body committed, fully or in part, but was not recorded.
    ApplyAmbiguous { unit: String },
}

impl HaltReason {
    /// Halts that happen whatever the failure policy says.
    pub fn overrides_policy(&self) -> bool {
        !matches!(self, HaltReason::FailurePolicy { .. })
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::FailurePolicy { unit } => {
                write!(f, "stopped after '{unit}' failed (failure_policy: abort)")
            }
            HaltReason::LedgerUnavailable { unit, message } => {
                write!(f, "ledger unavailable while checking '{unit}': {message}")
            }
            HaltReason::ApplyAmbiguous { unit } => write!(
                f,
                "'{unit}' may be partly or fully applied but is not recorded; inspect the database before rerunning"
            ),
        }
    }
}

/// Authoritative record of one runner invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub policy: FailurePolicy,
    pub dry_run: bool,
    pub results: Vec<RunResult>,
    pub halted: Option<HaltReason>,
    pub warnings: Vec<LedgerWarning>,
}

impl RunReport {
    /// Whether the run is clean: no unit failed or ended ambiguous and the
    /// ledger never halted it.
    pub fn is_success(&self) -> bool {
        let forced_halt = self.halted.as_ref().is_some_and(HaltReason::overrides_policy);
        !forced_halt && !self.results.iter().any(|r| r.status.is_error())
    }

    pub fn count(&self, status: UnitStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Statuses in plan order.
    pub fn statuses(&self) -> Vec<UnitStatus> {
        self.results.iter().map(|r| r.status).collect()
    }

    pub fn result(&self, name: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statuses: &[UnitStatus], halted: Option<HaltReason>) -> RunReport {
        RunReport {
            run_id: "abcd1234".to_string(),
            started_at: Utc::now(),
            policy: FailurePolicy::Abort,
            dry_run: false,
            results: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| RunResult {
                    name: format!("{:03}_m", i + 1),
                    ordinal: i as u64 + 1,
                    status: *status,
                    error: None,
                    duration_ms: 0,
                    transactional: true,
                })
                .collect(),
            halted,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_success_requires_no_error_states() {
        assert!(report(&[UnitStatus::Applied, UnitStatus::Skipped], None).is_success());
        assert!(!report(&[UnitStatus::Applied, UnitStatus::Failed], None).is_success());
        assert!(!report(&[UnitStatus::ApplyAmbiguous], None).is_success());
    }

    #[test]
    fn test_ledger_halt_is_failure_even_without_failed_units() {
        let halted = HaltReason::LedgerUnavailable {
            unit: "001_m".to_string(),
            message: "gone".to_string(),
        };
        assert!(!report(&[UnitStatus::Pending], Some(halted)).is_success());
    }

    #[test]
    fn test_counts_and_lookup() {
        let r = report(
            &[UnitStatus::Applied, UnitStatus::Failed, UnitStatus::Pending],
            Some(HaltReason::FailurePolicy {
                unit: "002_m".to_string(),
            }),
        );
        assert_eq!(r.count(UnitStatus::Applied), 1);
        assert_eq!(r.count(UnitStatus::Pending), 1);
        assert_eq!(r.result("002_m").unwrap().status, UnitStatus::Failed);
        assert!(r.result("009_m").is_none());
    }

    #[test]
    fn test_pending_displays_as_not_attempted() {
        assert_eq!(UnitStatus::Pending.to_string(), "not attempted");
        assert!(!UnitStatus::Pending.is_terminal());
        assert!(!UnitStatus::Applying.is_terminal());
        assert!(UnitStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_report_serializes_snake_case() {
        let r = report(&[UnitStatus::ApplyAmbiguous], None);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["results"][0]["status"], "apply_ambiguous");
        assert_eq!(json["policy"], "abort");
    }
}
