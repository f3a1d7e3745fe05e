//! CLI argument parsing using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// cql - Parse, inspect, evaluate and compile contact queries
#[derive(Parser, Debug)]
#[command(name = "cql")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use (default: ~/.config/cql/config.toml)
    #[arg(long, global = true, env = "CQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Assets file with fields, groups and flows (overrides config)
    #[arg(short, long, global = true)]
    pub assets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a query and print its canonical form
    #[command(alias = "p")]
    Parse {
        /// Query text
        query: String,
    },

    /// Show the attributes, schemes, fields and groups a query uses
    #[command(alias = "i")]
    Inspect {
        /// Query text
        query: String,
    },

    /// Check whether a contact matches a query
    #[command(alias = "e")]
    Eval {
        /// Query text
        query: String,

        /// JSON file of property values
        #[arg(short, long)]
        contact: PathBuf,
    },

    /// Compile a query into an Elasticsearch query
    #[command(alias = "c")]
    Compile {
        /// Query text
        query: String,

        /// Also compile a sort (e.g. "-created_on")
        #[arg(short, long, allow_hyphen_values = true)]
        sort: Option<String>,
    },

    /// Compile a sort key into an Elasticsearch sort
    Sort {
        /// Sort key, with a leading '-' for descending
        #[arg(default_value = "", allow_hyphen_values = true)]
        key: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
