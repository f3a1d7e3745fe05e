//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands fall into two groups: setup commands that never read the config
//! or assets, and query commands that work on a query or sort key.

use std::path::Path;

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};

/// A command that can be executed with a context.
pub trait RunCommand {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Commands that don't load config or assets.
#[derive(Debug)]
pub enum SetupDispatch<'a> {
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> SetupDispatch<'a> {
    /// Try to create a setup dispatch from the CLI command.
    /// Returns None if the command works on a query.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            None => Some(Self::Help),
            _ => None,
        }
    }
}

impl RunCommand for SetupDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("cql - contact query tool");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
    }
}

/// Commands that work on a query or sort key.
#[derive(Debug)]
pub enum QueryDispatch<'a> {
    Parse {
        query: &'a str,
    },
    Inspect {
        query: &'a str,
    },
    Eval {
        query: &'a str,
        contact: &'a Path,
    },
    Compile {
        query: &'a str,
        sort: Option<&'a str>,
    },
    Sort {
        key: &'a str,
    },
}

impl<'a> QueryDispatch<'a> {
    /// Create a query dispatch from the CLI command.
    /// Returns None for setup commands.
    pub fn from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Parse { query }) => Some(Self::Parse { query }),
            Some(Commands::Inspect { query }) => Some(Self::Inspect { query }),
            Some(Commands::Eval { query, contact }) => Some(Self::Eval { query, contact }),
            Some(Commands::Compile { query, sort }) => Some(Self::Compile {
                query,
                sort: sort.as_deref(),
            }),
            Some(Commands::Sort { key }) => Some(Self::Sort { key }),
            _ => None,
        }
    }
}

impl RunCommand for QueryDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse { query } => commands::parse::execute(ctx, query),
            Self::Inspect { query } => commands::inspect::execute(ctx, query),
            Self::Eval { query, contact } => commands::eval::execute(ctx, query, contact),
            Self::Compile { query, sort } => commands::compile::execute(ctx, query, *sort),
            Self::Sort { key } => commands::compile::execute_sort(ctx, key),
        }
    }
}
