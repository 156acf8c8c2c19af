//! Tidemark CLI - apply ordered SQL migrations exactly once

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, GlobalArgs};
use commands::common::ExitCode;
use commands::{inspect, migrate, new, status};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match dispatch(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::ExitCode::from(u8::try_from(code.0).unwrap_or(1)),
            None => {
                eprintln!("Error: {err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::Inspect(args) => inspect::execute(args, &cli.global).await,
        cli::Commands::New(args) => new::execute(args, &cli.global),
    }
}

/// `warn` by default, `info` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(global: &GlobalArgs) {
    let default_level = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
