//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names searched for in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tidemark.yml", "tidemark.yaml"];

/// Environment variable consulted for the connection string by default.
pub const DEFAULT_DATABASE_URL_ENV: &str = "TIDEMARK_DATABASE_URL";

/// Project configuration from tidemark.yml
///
/// Every key has a default, so a project without a config file behaves as if
/// an empty one were present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<ordinal>_<description>.sql` scripts
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Table recording applied migrations; may be schema-qualified
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Schema enumerated by the inspector
    #[serde(default = "default_schema")]
    pub schema: String,

    /// What to do after a migration fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Name of the environment variable holding the connection string
    #[serde(default = "default_database_url_env")]
    pub database_url_env: String,
}

/// Behaviour of a run after one unit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failed unit; later units are not attempted.
    #[default]
    Abort,
    /// Record the failure and carry on with the next unit.
    Continue,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_ledger_table() -> String {
    "tidemark_migrations".to_string()
}

fn default_schema() -> String {
    "main".to_string()
}

fn default_database_url_env() -> String {
    DEFAULT_DATABASE_URL_ENV.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_table: default_ledger_table(),
            schema: default_schema(),
            failure_policy: FailurePolicy::default(),
            database_url_env: default_database_url_env(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory, falling back to defaults
    /// when no config file exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
        {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No config file in {}, using defaults", dir.display());
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }
        if self.ledger_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "ledger_table cannot be empty".to_string(),
            });
        }
        if self.ledger_table.split('.').any(|part| part.is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: format!("ledger_table '{}' is malformed", self.ledger_table),
            });
        }
        if self.schema.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "schema cannot be empty".to_string(),
            });
        }
        if self.database_url_env.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database_url_env cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the absolute migrations directory relative to a project root
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Resolve the connection string: CLI value first, then the configured
    /// environment variable. Missing or blank is a configuration error.
    pub fn resolve_database_url(&self, cli_url: Option<&str>) -> CoreResult<String> {
        cli_url
            .map(String::from)
            .or_else(|| std::env::var(&self.database_url_env).ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CoreError::MissingDatabaseUrl {
                env_var: self.database_url_env.clone(),
            })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
