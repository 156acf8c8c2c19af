//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tidemark - apply ordered SQL migrations exactly once
#[derive(Parser, Debug)]
#[command(name = "tidemark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Connection string; overrides the configured environment variable
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations and report the resulting schema
    Migrate(MigrateArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),

    /// List tables and row counts of the target schema
    Inspect(InspectArgs),

    /// Create the next numbered migration file
    New(NewArgs),
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Keep applying later migrations after one fails
    #[arg(long)]
    pub continue_on_failure: bool,

    /// Stop after this migration (inclusive)
    #[arg(long)]
    pub target: Option<String>,

    /// Show what would be applied without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Schema to inspect (default: from config)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used in the file name
    pub description: String,
}
