//! Eval command implementation.
//!
//! Matches a query against a contact read from a JSON file. The file is an
//! object of property key to value, or to a list of values:
//!
//! ```json
//! {"name": "Bob", "age": 36, "tel": ["+250788123123"], "created_on": "2020-01-24T13:24:30Z"}
//! ```
//!
//! Strings in RFC 3339 form are read as dates, numbers as numbers and
//! everything else as text.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use contactql::parse_query;
use contactql::query::Value;
use rust_decimal::Decimal;

use super::assets::{load_assets, resolver};
use super::config::load_config;
use super::{CommandContext, CommandError, Result};
use crate::output::{format_eval_json, format_eval_text};

/// A contact as a map of property key to values.
pub type Contact = HashMap<String, Vec<Value>>;

/// Executes the eval command.
pub fn execute(ctx: &CommandContext, text: &str, contact_path: &Path) -> Result<()> {
    let config = load_config(ctx)?;
    let assets = load_assets(ctx, &config)?;
    let contact = load_contact(contact_path)?;

    let env = &config.environment;
    let query = parse_query(env, text, resolver(assets.as_ref()))?;
    let matched = query.evaluate(env, &contact)?;

    tracing::debug!(query = %query, matched, "evaluated query");

    if ctx.json_output {
        println!("{}", format_eval_json(&query, matched)?);
    } else if !ctx.quiet {
        print!("{}", format_eval_text(matched, ctx.use_colors));
    }

    Ok(())
}

/// Reads a contact file.
pub fn load_contact(path: &Path) -> Result<Contact> {
    let content = fs::read_to_string(path).map_err(|e| {
        CommandError::Input(format!("Failed to read contact {}: {}", path.display(), e))
    })?;
    parse_contact(&content)
}

/// Parses a contact file's contents.
pub fn parse_contact(content: &str) -> Result<Contact> {
    let json: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| CommandError::Input(format!("Failed to parse contact: {}", e)))?;

    let serde_json::Value::Object(object) = json else {
        return Err(CommandError::Input(
            "contact must be a JSON object".to_string(),
        ));
    };

    let mut contact = Contact::new();
    for (key, value) in object {
        let values = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| to_value(&key, item).transpose())
                .collect::<Result<Vec<_>>>()?,
            other => to_value(&key, other)?.into_iter().collect(),
        };
        contact.insert(key.to_lowercase(), values);
    }

    Ok(contact)
}

/// Converts one JSON value. Nulls are unset and give `None`.
fn to_value(key: &str, json: serde_json::Value) -> Result<Option<Value>> {
    match json {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
            Ok(date) => Ok(Some(Value::from(date.with_timezone(&Utc)))),
            Err(_) => Ok(Some(Value::from(s))),
        },
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(|d| Some(Value::from(d)))
                .map_err(|_| {
                    CommandError::Input(format!("'{}' has an unsupported number: {}", key, text))
                })
        }
        serde_json::Value::Bool(b) => Ok(Some(Value::from(b.to_string()))),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(CommandError::Input(
            format!("'{}' must be a string, number or list of those", key),
        )),
    }
}
