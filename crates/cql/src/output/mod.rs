//! Output formatting utilities for the cql CLI.
//!
//! - [`query`] - Parsed query, inspection and evaluation output
//! - [`helpers`] - Common formatting utilities

pub mod helpers;
mod query;

pub use query::{
    format_eval_json, format_eval_text, format_inspection_json, format_inspection_table,
    format_parsed_json, format_parsed_text,
};
