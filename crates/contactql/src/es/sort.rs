use serde_json::{json, Value};

use super::query::{keyed, term};
use crate::assets::Resolver;
use crate::query::attributes;
use crate::query::{QueryError, QueryResult};

/// Converts a sort key such as `name` or `-age` into an Elasticsearch sort.
///
/// An empty key sorts by most recently created first. A leading `-` makes
/// the sort descending, otherwise it is ascending.
///
/// # Errors
///
/// Returns `QueryError::NoSuchField` if the key isn't an attribute and no
/// field with that key exists.
pub fn to_elastic_sort(sort_by: &str, resolver: &dyn Resolver) -> QueryResult<Value> {
    if sort_by.is_empty() {
        return Ok(json!({"id": {"order": "desc"}}));
    }

    let (key, order) = match sort_by.strip_prefix('-') {
        Some(key) => (key, "desc"),
        None => (sort_by, "asc"),
    };
    let key = key.to_lowercase();

    match key.as_str() {
        attributes::NAME => return Ok(keyed("name.keyword", json!({"order": order}))),
        attributes::ID
        | attributes::CREATED_ON
        | attributes::LAST_SEEN_ON
        | attributes::LANGUAGE => return Ok(keyed(&key, json!({"order": order}))),
        _ => {}
    }

    let field = resolver
        .resolve_field(&key)
        .ok_or_else(|| QueryError::NoSuchField { field: key.clone() })?;

    let index_key = if field.field_type.is_location() {
        format!("fields.{}_keyword", field.field_type)
    } else {
        format!("fields.{}", field.field_type)
    };

    Ok(keyed(
        &index_key,
        json!({
            "nested": {
                "filter": term("fields.field", field.uuid.as_str()),
                "path": "fields",
            },
            "order": order,
        }),
    ))
}
