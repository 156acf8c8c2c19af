//! Migration unit definition

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::migration_name::MigrationName;
use crate::sql_utils::split_statements;
use serde::Serialize;

/// Directive that opts a migration body out of the per-unit transaction.
///
/// Must appear as the first non-blank line of the script.
pub const NO_TRANSACTION_DIRECTIVE: &str = "-- tidemark:no-transaction";

/// Leading keywords of statements that open or close a transaction.
const TRANSACTION_KEYWORDS: &[&str] = &["BEGIN", "COMMIT", "END", "ROLLBACK", "ABORT"];

/// One named, ordered schema-change script.
///
/// Immutable once loaded; the checksum and transaction mode are derived from
/// the body at construction time.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationUnit {
    name: MigrationName,
    #[serde(skip)]
    body: String,
    checksum: String,
    transactional: bool,
}

impl MigrationUnit {
    /// Build a unit from a raw name and SQL body.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> CoreResult<Self> {
        let name = MigrationName::parse(name)?;
        Self::from_parts(name, body.into())
    }

    /// Build a unit from an already-validated name.
    ///
    /// A transactional body may not open or close transactions itself: the
    /// unit's statements must commit or roll back together.
    pub fn from_parts(name: MigrationName, body: String) -> CoreResult<Self> {
        let transactional = !has_no_transaction_directive(&body);
        if transactional {
            if let Some(statement) = transaction_control_statement(&body) {
                return Err(CoreError::TransactionControl {
                    name: name.into_inner(),
                    statement,
                });
            }
        }
        let checksum = compute_checksum(&body);
        Ok(Self {
            name,
            body,
            checksum,
            transactional,
        })
    }

    pub fn name(&self) -> &MigrationName {
        &self.name
    }

    pub fn ordinal(&self) -> u64 {
        self.name.ordinal()
    }

    /// The SQL text executed when this unit is applied.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// SHA-256 of the body, stored in the ledger for drift detection.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Whether the body is applied inside a single transaction.
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }
}

fn has_no_transaction_directive(body: &str) -> bool {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.eq_ignore_ascii_case(NO_TRANSACTION_DIRECTIVE))
}

/// First statement of `body` that starts or ends a transaction.
fn transaction_control_statement(body: &str) -> Option<String> {
    split_statements(body).into_iter().find(|stmt| {
        let mut words = stmt.split_whitespace();
        let keyword = words.next().unwrap_or_default();
        if keyword.eq_ignore_ascii_case("START") {
            return words
                .next()
                .is_some_and(|w| w.eq_ignore_ascii_case("TRANSACTION"));
        }
        TRANSACTION_KEYWORDS
            .iter()
            .any(|k| keyword.eq_ignore_ascii_case(k))
    })
}
