//! Parsed query, inspection and evaluation output formatting.

use contactql::query::{BoolOperator, QueryNode};
use contactql::{ContactQuery, Inspection};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::{json, Value};

use super::helpers::{join_or_none, label, yes_no};

/// Builds the JSON form of a query tree.
fn node_json(node: &QueryNode) -> Value {
    match node {
        QueryNode::Condition(c) => json!({
            "type": c.property_type(),
            "key": c.property_key(),
            "operator": c.operator().as_str(),
            "value": c.value(),
        }),
        QueryNode::BoolCombination(combination) => {
            let key = match combination.operator() {
                BoolOperator::And => "and",
                BoolOperator::Or => "or",
            };
            let children: Vec<Value> = combination.children().iter().map(node_json).collect();
            json!({ key: children })
        }
    }
}

/// Writes an indented tree, one node per line.
fn write_tree(node: &QueryNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        QueryNode::Condition(c) => {
            out.push_str(&format!("{}{}\n", indent, c));
        }
        QueryNode::BoolCombination(combination) => {
            out.push_str(&format!("{}{}\n", indent, combination.operator()));
            for child in combination.children() {
                write_tree(child, depth + 1, out);
            }
        }
    }
}

/// JSON output structure for the parse command.
#[derive(Serialize)]
struct ParsedOutput {
    query: String,
    resolved: bool,
    tree: Value,
}

/// Formats a parsed query as JSON.
pub fn format_parsed_json(query: &ContactQuery<'_>) -> Result<String, serde_json::Error> {
    let output = ParsedOutput {
        query: query.to_string(),
        resolved: query.is_resolved(),
        tree: node_json(query.root()),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a parsed query as its canonical text, with the tree when verbose.
pub fn format_parsed_text(query: &ContactQuery<'_>, verbose: bool) -> String {
    let mut output = format!("{}\n", query);
    if verbose {
        output.push('\n');
        write_tree(query.root(), 0, &mut output);
    }
    output
}

/// Formats an inspection as JSON.
pub fn format_inspection_json(inspection: &Inspection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(inspection)
}

/// Formats an inspection as a table.
pub fn format_inspection_table(inspection: &Inspection, use_colors: bool) -> String {
    let fields = inspection
        .fields
        .iter()
        .map(|f| {
            if f.name.is_empty() {
                f.key.clone()
            } else {
                format!("{} ({})", f.key, f.name)
            }
        })
        .collect::<Vec<_>>();

    let groups = inspection
        .groups
        .iter()
        .map(|g| match (&g.name, &g.name_match) {
            (Some(name), _) => name.clone(),
            (None, Some(name_match)) => format!("~{}", name_match),
            (None, None) => String::new(),
        })
        .collect::<Vec<_>>();

    let rows = [
        ("Attributes", join_or_none(&inspection.attributes)),
        ("Schemes", join_or_none(&inspection.schemes)),
        ("Fields", join_or_none(fields)),
        ("Groups", join_or_none(groups)),
        ("Allow as group", yes_no(inspection.allow_as_group, use_colors)),
    ];

    let mut output = String::new();
    for (name, value) in rows {
        let name = label(&format!("{:<15}", format!("{}:", name)), use_colors);
        output.push_str(&format!("{} {}\n", name, value));
    }
    output
}

/// Formats an evaluation result as JSON.
pub fn format_eval_json(query: &ContactQuery<'_>, matched: bool) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "query": query.to_string(),
        "matches": matched,
    }))
}

/// Formats an evaluation result.
pub fn format_eval_text(matched: bool, use_colors: bool) -> String {
    let text = if matched { "match" } else { "no match" };
    match (use_colors, matched) {
        (false, _) => format!("{}\n", text),
        (true, true) => format!("{}\n", text.green()),
        (true, false) => format!("{}\n", text.red()),
    }
}
