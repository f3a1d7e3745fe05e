//! Parse command implementation.
//!
//! Parses and validates a query and prints its canonical form.

use contactql::parse_query;

use super::assets::{load_assets, resolver};
use super::config::load_config;
use super::{CommandContext, Result};
use crate::output::{format_parsed_json, format_parsed_text};

/// Executes the parse command.
pub fn execute(ctx: &CommandContext, text: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let assets = load_assets(ctx, &config)?;

    let query = parse_query(&config.environment, text, resolver(assets.as_ref()))?;

    if ctx.json_output {
        println!("{}", format_parsed_json(&query)?);
    } else if !ctx.quiet {
        print!("{}", format_parsed_text(&query, ctx.verbose));
    }

    Ok(())
}
