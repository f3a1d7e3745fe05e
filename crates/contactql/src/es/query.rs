//! Builders for Elasticsearch query documents.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

/// Builds `{key: value}`.
pub fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Matches if any of the queries match.
pub fn any(queries: Vec<Value>) -> Value {
    json!({"bool": {"should": queries}})
}

/// Matches if all of the queries match.
pub fn all(queries: Vec<Value>) -> Value {
    json!({"bool": {"must": queries}})
}

/// Matches if the query doesn't.
pub fn not(query: Value) -> Value {
    json!({"bool": {"must_not": query}})
}

/// Matches documents with any of the given IDs.
pub fn ids(values: &[&str]) -> Value {
    json!({"ids": {"values": values}})
}

pub fn term(field: &str, value: impl Into<Value>) -> Value {
    json!({"term": keyed(field, value.into())})
}

pub fn exists(field: &str) -> Value {
    json!({"exists": {"field": field}})
}

/// Runs a query against nested documents at `path`.
pub fn nested(path: &str, query: Value) -> Value {
    json!({"nested": {"path": path, "query": query}})
}

pub fn match_query(field: &str, value: impl Into<Value>) -> Value {
    json!({"match": keyed(field, json!({"query": value.into()}))})
}

pub fn match_phrase(field: &str, value: &str) -> Value {
    json!({"match_phrase": keyed(field, json!({"query": value}))})
}

fn range(field: &str, from: Value, to: Value, include_lower: bool, include_upper: bool) -> Value {
    json!({"range": keyed(field, json!({
        "from": from,
        "include_lower": include_lower,
        "include_upper": include_upper,
        "to": to,
    }))})
}

pub fn greater_than(field: &str, value: Value) -> Value {
    range(field, value, Value::Null, false, true)
}

pub fn greater_than_or_equal(field: &str, value: Value) -> Value {
    range(field, value, Value::Null, true, true)
}

pub fn less_than(field: &str, value: Value) -> Value {
    range(field, Value::Null, value, true, false)
}

pub fn less_than_or_equal(field: &str, value: Value) -> Value {
    range(field, Value::Null, value, true, true)
}

/// Matches values in `[from, to)`.
pub fn between(field: &str, from: Value, to: Value) -> Value {
    range(field, from, to, true, false)
}

/// Converts a decimal to a JSON number, as an integer when it has no fractional part.
pub fn number(value: Decimal) -> Value {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        if let Some(i) = normalized.to_i64() {
            return json!(i);
        }
    }
    match normalized.to_f64() {
        Some(f) => json!(f),
        None => json!(normalized.to_string()),
    }
}

/// Converts a timestamp to an RFC 3339 UTC string.
pub fn datetime(value: DateTime<Utc>) -> Value {
    json!(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_bool_helpers() {
        assert_eq!(
            all(vec![exists("a"), exists("b")]),
            json!({"bool": {"must": [{"exists": {"field": "a"}}, {"exists": {"field": "b"}}]}})
        );
        assert_eq!(
            any(vec![term("a", 1)]),
            json!({"bool": {"should": [{"term": {"a": 1}}]}})
        );
        assert_eq!(
            not(term("a", "x")),
            json!({"bool": {"must_not": {"term": {"a": "x"}}}})
        );
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            greater_than("age", json!(18)),
            json!({"range": {"age": {"from": 18, "include_lower": false, "include_upper": true, "to": null}}})
        );
        assert_eq!(
            less_than_or_equal("age", json!(18)),
            json!({"range": {"age": {"from": null, "include_lower": true, "include_upper": true, "to": 18}}})
        );
        assert_eq!(
            between("d", json!("a"), json!("b")),
            json!({"range": {"d": {"from": "a", "include_lower": true, "include_upper": false, "to": "b"}}})
        );
    }

    #[test]
    fn test_number() {
        assert_eq!(number(Decimal::from(18)), json!(18));
        assert_eq!(number(Decimal::from_str("18.00").unwrap()), json!(18));
        assert_eq!(number(Decimal::from_str("-2").unwrap()), json!(-2));
        assert_eq!(number(Decimal::from_str("18.5").unwrap()), json!(18.5));
    }

    #[test]
    fn test_datetime() {
        let value = Utc.with_ymd_and_hms(2020, 1, 2, 5, 0, 0).unwrap();
        assert_eq!(datetime(value), json!("2020-01-02T05:00:00Z"));
    }
}
