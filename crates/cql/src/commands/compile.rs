//! Compile and sort command implementations.
//!
//! Compiling needs an assets file: groups and flows are indexed by integer
//! IDs that only the assets know. Sorting on attributes works without one.

use contactql::es::{to_elastic_query, to_elastic_sort};
use contactql::{parse_query, Resolver, StaticResolver};
use serde_json::{json, Map, Value};

use super::assets::{load_assets, resolver, Assets};
use super::config::load_config;
use super::{CommandContext, Result};

/// Executes the compile command.
pub fn execute(ctx: &CommandContext, text: &str, sort: Option<&str>) -> Result<()> {
    let config = load_config(ctx)?;
    let assets = load_assets(ctx, &config)?;
    let env = &config.environment;

    let query = parse_query(env, text, resolver(assets.as_ref()))?;
    let empty = Assets::default();
    let mapper = assets.as_ref().unwrap_or(&empty);

    let mut output = Map::new();
    output.insert("query".to_string(), to_elastic_query(env, mapper, &query)?);
    if let Some(sort) = sort {
        output.insert(
            "sort".to_string(),
            json!([to_elastic_sort(sort, &mapper.resolver)?]),
        );
    }

    if !ctx.quiet || ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    }
    Ok(())
}

/// Executes the sort command.
pub fn execute_sort(ctx: &CommandContext, key: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let assets = load_assets(ctx, &config)?;

    let empty = StaticResolver::default();
    let resolver: &dyn Resolver = match &assets {
        Some(assets) => &assets.resolver,
        None => &empty,
    };

    let sort = to_elastic_sort(key, resolver)?;

    if !ctx.quiet || ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&sort)?);
    }
    Ok(())
}
