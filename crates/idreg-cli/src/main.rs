//! # idreg CLI entry point
//!
//! Parses global flags, installs the tracing subscriber, dispatches to
//! [`idreg_cli::commands::run`], and prints the JSON result.
//!
//! Exit codes: 0 success, 1 the registry rejected the call, 2 any other
//! failure (I/O, parse, integrity).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use idreg_cli::commands::{run, Command, Globals};
use idreg_cli::{exit_code, rejection};
use idreg_core::Address;

/// Student identity registry.
///
/// Issues non-transferable student identity tokens and manages their
/// lifecycle. State lives in a single JSON file.
#[derive(Parser, Debug)]
#[command(name = "idreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to the registry state file.
    #[arg(long, global = true, default_value = "idreg-state.json")]
    state: PathBuf,

    /// Registry configuration (YAML). Read by `init` only.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Caller address for mutating commands.
    #[arg(long = "as", global = true, value_name = "ADDRESS")]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    tracing::debug!(
        state = %cli.state.display(),
        mutating = cli.command.is_mutating(),
        "idreg starting"
    );

    let globals = Globals {
        state: cli.state,
        config: cli.config,
        caller: cli.caller,
    };

    match run(&globals, cli.command) {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match rejection(&e) {
                Some(rejected) => {
                    let body = json!({
                        "error": rejected.kind().as_str(),
                        "message": rejected.to_string(),
                    });
                    println!("{body:#}");
                }
                None => tracing::error!("{e:#}"),
            }
            ExitCode::from(exit_code(&e))
        }
    }
}
