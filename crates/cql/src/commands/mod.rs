//! Command implementations for the cql CLI.

pub mod assets;
pub mod compile;
pub mod completions;
pub mod config;
pub mod eval;
pub mod inspect;
pub mod parse;

use std::path::PathBuf;

use contactql::QueryError;

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Query parsing, validation or compilation error.
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Assets or contact file error.
    #[error("invalid input: {0}")]
    Input(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Returns the error code string for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Query(e) => e.code(),
            CommandError::Config(_) => "CONFIG_ERROR",
            CommandError::Input(_) => "INPUT_ERROR",
            CommandError::Io(_) => "IO_ERROR",
            CommandError::Json(_) => "JSON_ERROR",
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Query(_) => 1,
            CommandError::Input(_) | CommandError::Json(_) => 2,
            CommandError::Io(_) => 3,
            CommandError::Config(_) => 5,
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Config file given on the command line or in `CQL_CONFIG`.
    pub config_path: Option<PathBuf>,
    /// Assets file given on the command line.
    pub assets_path: Option<PathBuf>,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
            quiet: cli.quiet,
            verbose: cli.verbose,
            config_path: cli.config.clone(),
            assets_path: cli.assets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_codes_pass_through() {
        let err = CommandError::from(QueryError::invalid_number("abc"));
        assert_eq!(err.code(), "invalid_number");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), QueryError::invalid_number("abc").to_string());
    }

    #[test]
    fn test_config_error() {
        let err = CommandError::Config("bad".to_string());
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.to_string(), "configuration error: bad");
    }
}
