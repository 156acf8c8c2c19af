//! New command implementation
//!
//! Creates `<NNN>_<description>.sql` in the migrations directory, numbered
//! one past the highest existing ordinal.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tm_core::{MigrationName, MigrationSource};

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common;

/// Lower-case the description and collapse everything else into `_`.
pub(crate) fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Next migration name: zero-padded to three digits, one past `highest`.
pub(crate) fn next_name(highest: Option<u64>, slug: &str) -> Result<MigrationName> {
    let ordinal = highest.map_or(Ok(1), |n| {
        n.checked_add(1)
            .with_context(|| format!("Ordinal {n} cannot be incremented"))
    })?;
    Ok(MigrationName::parse(format!("{ordinal:03}_{slug}"))?)
}

/// Execute the new command
pub fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let slug = slugify(&args.description);
    if slug.is_empty() {
        anyhow::bail!(
            "Description '{}' has no usable characters for a file name",
            args.description
        );
    }

    let dir = project.migrations_dir();
    let highest = if dir.is_dir() {
        project
            .source()
            .list()
            .context("Failed to load existing migrations")?
            .last()
            .map(|unit| unit.ordinal())
    } else {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        None
    };

    let name = next_name(highest, &slug)?;
    let path = dir.join(format!("{name}.sql"));
    write_template(&path, &name)?;

    println!("Created {}", path.display());
    Ok(())
}

fn write_template(path: &Path, name: &MigrationName) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writeln!(file, "-- Migration: {name}\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add username auth"), "add_username_auth");
        assert_eq!(slugify("  orders: index!! "), "orders_index");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_next_name_pads_and_increments() {
        assert_eq!(next_name(None, "init").unwrap().as_str(), "001_init");
        assert_eq!(next_name(Some(6), "seed").unwrap().as_str(), "007_seed");
        assert_eq!(next_name(Some(1234), "big").unwrap().as_str(), "1235_big");
    }

    #[test]
    fn test_next_name_overflow() {
        assert!(next_name(Some(u64::MAX), "x").is_err());
    }
}
