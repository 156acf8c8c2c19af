//! Migration sources: where ordered migration units come from.
//!
//! A source only reads. Ordering is always recomputed from the unit ordinals,
//! never taken from filesystem iteration order, and a source that yields two
//! units with the same ordinal is rejected before anything executes.

use crate::error::{CoreError, CoreResult};
use crate::migration::MigrationUnit;
use crate::migration_name::MigrationName;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension recognised as a migration script.
pub const MIGRATION_EXTENSION: &str = "sql";

/// Anything that can produce the ordered list of migration units.
pub trait MigrationSource: Send + Sync {
    /// Load every unit, ordered by ascending ordinal.
    fn list(&self) -> CoreResult<Vec<MigrationUnit>>;

    /// Short human description used in log lines.
    fn describe(&self) -> String;
}

/// Sort units by ordinal and reject duplicate ordinals.
pub fn order_units(mut units: Vec<MigrationUnit>) -> CoreResult<Vec<MigrationUnit>> {
    units.sort_by(|a, b| a.name().cmp(b.name()));
    for pair in units.windows(2) {
        if pair[0].ordinal() == pair[1].ordinal() {
            return Err(CoreError::AmbiguousOrdinal {
                ordinal: pair[0].ordinal(),
                first: pair[0].name().to_string(),
                second: pair[1].name().to_string(),
            });
        }
    }
    Ok(units)
}

/// Keep units up to and including `target`.
pub fn select_through(
    mut units: Vec<MigrationUnit>,
    target: &str,
) -> CoreResult<Vec<MigrationUnit>> {
    let Some(pos) = units.iter().position(|u| u.name() == target) else {
        return Err(CoreError::UnknownTarget {
            name: target.to_string(),
        });
    };
    units.truncate(pos + 1);
    Ok(units)
}

/// Reads `*.sql` files directly inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn script_paths(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(CoreError::SourceNotFound {
                path: self.dir.display().to_string(),
            });
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| CoreError::SourceUnreadable {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_script = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(MIGRATION_EXTENSION));
            if is_script {
                paths.push(path);
            } else {
                log::debug!("Ignoring non-migration entry {}", path.display());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl MigrationSource for DirectorySource {
    fn list(&self) -> CoreResult<Vec<MigrationUnit>> {
        let mut units = Vec::new();
        for path in self.script_paths()? {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| CoreError::InvalidMigrationName {
                    name: path.display().to_string(),
                    reason: "file name is not valid UTF-8".to_string(),
                })?;
            let name = MigrationName::parse(stem)?;
            let body = fs::read_to_string(&path).map_err(|e| CoreError::SourceUnreadable {
                path: path.display().to_string(),
                source: e,
            })?;
            units.push(MigrationUnit::from_parts(name, body)?);
        }
        order_units(units)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

/// In-memory `(name, body)` pairs, for embedding applications and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    scripts: Vec<(String, String)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script, builder style.
    pub fn with(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.scripts.push((name.into(), body.into()));
        self
    }
}

impl MigrationSource for StaticSource {
    fn list(&self) -> CoreResult<Vec<MigrationUnit>> {
        let units = self
            .scripts
            .iter()
            .map(|(name, body)| MigrationUnit::new(name.as_str(), body.as_str()))
            .collect::<CoreResult<Vec<_>>>()?;
        order_units(units)
    }

    fn describe(&self) -> String {
        format!("{} in-memory script(s)", self.scripts.len())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
