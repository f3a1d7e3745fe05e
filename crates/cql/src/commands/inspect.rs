//! Inspect command implementation.

use contactql::parse_query;

use super::assets::{load_assets, resolver};
use super::config::load_config;
use super::{CommandContext, Result};
use crate::output::{format_inspection_json, format_inspection_table};

/// Executes the inspect command.
pub fn execute(ctx: &CommandContext, text: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let assets = load_assets(ctx, &config)?;

    let query = parse_query(&config.environment, text, resolver(assets.as_ref()))?;
    let inspection = query.inspect();

    if ctx.json_output {
        println!("{}", format_inspection_json(&inspection)?);
    } else if !ctx.quiet {
        print!("{}", format_inspection_table(&inspection, ctx.use_colors));
    }

    Ok(())
}
