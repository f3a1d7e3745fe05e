use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::{CommandContext, CommandError};
use dispatch::{QueryDispatch, RunCommand, SetupDispatch};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", error_json(&e));
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    if let Some(dispatch) = SetupDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    match QueryDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx),
        None => Ok(()),
    }
}

/// Sets up logging to stderr. `RUST_LOG` overrides the level picked by flags.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Builds the JSON error document printed with `--json`.
fn error_json(e: &CommandError) -> String {
    let mut error = serde_json::json!({
        "code": e.code(),
        "message": e.to_string(),
    });
    if let CommandError::Query(query_error) = e {
        let extra = query_error.extra();
        if !extra.is_empty() {
            error["extra"] = serde_json::json!(extra);
        }
    }

    let document = serde_json::json!({ "error": error });
    serde_json::to_string_pretty(&document).unwrap_or_else(|_| document.to_string())
}
