//! Query evaluation against contact-like objects.
//!
//! This module provides the [`QueryEvaluator`] for matching parsed queries
//! against anything implementing [`Queryable`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use contactql::env::Environment;
//! use contactql::query::{parse_query, QueryEvaluator, Value};
//!
//! let env = Environment::default();
//! let query = parse_query(&env, "name ~ smith OR twitter = bobby", None).unwrap();
//!
//! let mut contact: HashMap<String, Vec<Value>> = HashMap::new();
//! contact.insert("name".to_string(), vec![Value::from("Bob Smithwick")]);
//!
//! let evaluator = QueryEvaluator::new(&env, &query);
//! assert!(evaluator.matches(&contact).unwrap());
//! ```

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::ast::{BoolOperator, Condition, ContactQuery, Operator, PropertyType, QueryNode};
use super::attributes;
use super::error::{QueryError, QueryResult};
use super::validate::tokenize_name_value;
use crate::env::{day_to_utc_range, Environment};

/// Name tokens are compared on at most this many characters.
const NAME_TOKEN_MATCH_LENGTH: usize = 8;

/// A property value of a queryable object.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(Decimal),
    DateTime(DateTime<Utc>),
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Decimal> for Value {
    fn from(number: Decimal) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(Decimal::from(number))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Value::DateTime(timestamp)
    }
}

/// Something a query can be evaluated against.
pub trait Queryable {
    /// Returns every value of the given property. An unset property has no values.
    fn query_property(&self, env: &Environment, key: &str, property_type: PropertyType)
        -> Vec<Value>;
}

impl<S: BuildHasher> Queryable for HashMap<String, Vec<Value>, S> {
    fn query_property(&self, _: &Environment, key: &str, _: PropertyType) -> Vec<Value> {
        self.get(key).cloned().unwrap_or_default()
    }
}

/// Evaluator for matching a query against queryable objects.
pub struct QueryEvaluator<'a> {
    env: &'a Environment,
    root: &'a QueryNode,
}

impl<'a> QueryEvaluator<'a> {
    /// Creates a new evaluator for the given query.
    pub fn new(env: &'a Environment, query: &'a ContactQuery<'_>) -> Self {
        Self {
            env,
            root: query.root(),
        }
    }

    /// Returns true if the object matches the query.
    ///
    /// # Errors
    ///
    /// Fails if a condition can't be compared with one of the object's values,
    /// e.g. an ordering condition against a text value.
    pub fn matches<Q: Queryable + ?Sized>(&self, queryable: &Q) -> QueryResult<bool> {
        self.evaluate_node(self.root, queryable)
    }

    /// Returns the objects that match the query.
    pub fn filter<'b, Q: Queryable>(&self, items: &'b [Q]) -> QueryResult<Vec<&'b Q>> {
        let mut matching = Vec::new();
        for item in items {
            if self.matches(item)? {
                matching.push(item);
            }
        }
        Ok(matching)
    }

    fn evaluate_node<Q: Queryable + ?Sized>(
        &self,
        node: &QueryNode,
        queryable: &Q,
    ) -> QueryResult<bool> {
        match node {
            QueryNode::Condition(condition) => self.evaluate_condition(condition, queryable),
            QueryNode::BoolCombination(combination) => match combination.operator() {
                BoolOperator::And => {
                    for child in combination.children() {
                        if !self.evaluate_node(child, queryable)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                BoolOperator::Or => {
                    for child in combination.children() {
                        if self.evaluate_node(child, queryable)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            },
        }
    }

    fn evaluate_condition<Q: Queryable + ?Sized>(
        &self,
        condition: &Condition,
        queryable: &Q,
    ) -> QueryResult<bool> {
        // contacts can have many values for a property, e.g. several phone numbers
        let values = queryable.query_property(
            self.env,
            condition.property_key(),
            condition.property_type(),
        );

        if condition.is_existence_check() {
            return Ok(match condition.operator() {
                Operator::Equal => values.is_empty(),
                _ => !values.is_empty(),
            });
        }

        let mut any_true = false;
        let mut all_true = true;
        for value in &values {
            if self.compare(condition, value)? {
                any_true = true;
            } else {
                all_true = false;
            }
        }

        // x != y only holds if no value of x is y
        if condition.operator() == Operator::NotEqual {
            Ok(all_true)
        } else {
            Ok(any_true)
        }
    }

    fn compare(&self, condition: &Condition, value: &Value) -> QueryResult<bool> {
        match value {
            Value::Text(text) => text_comparison(condition, text),
            Value::Number(number) => {
                let query_number = match condition.number() {
                    Some(n) => n,
                    None => Decimal::from_str(condition.value().trim())
                        .map_err(|_| QueryError::invalid_number(condition.value()))?,
                };
                number_comparison(condition, *number, query_number)
            }
            Value::DateTime(timestamp) => {
                let query_day = match condition.date() {
                    Some(d) => *d,
                    None => self
                        .env
                        .parse_date(condition.value())
                        .ok_or_else(|| QueryError::invalid_date(condition.value()))?,
                };
                date_comparison(condition, timestamp, &query_day)
            }
        }
    }
}

fn text_comparison(condition: &Condition, object_value: &str) -> QueryResult<bool> {
    let object_value = object_value.trim().to_lowercase();
    let query_value = condition.value().trim().to_lowercase();

    match condition.operator() {
        Operator::Equal => Ok(object_value == query_value),
        Operator::NotEqual => Ok(object_value != query_value),
        Operator::Contains if condition.is_attribute(attributes::NAME) => Ok(
            tokenized_prefix_match(&object_value, &query_value, NAME_TOKEN_MATCH_LENGTH),
        ),
        Operator::Contains => Ok(object_value.contains(&query_value)),
        op => Err(QueryError::unsupported_comparison(
            condition.property_key(),
            op.as_str(),
        )),
    }
}

fn number_comparison(condition: &Condition, object_value: Decimal, query_value: Decimal) -> QueryResult<bool> {
    match condition.operator() {
        Operator::Equal => Ok(object_value == query_value),
        Operator::NotEqual => Ok(object_value != query_value),
        Operator::GreaterThan => Ok(object_value > query_value),
        Operator::GreaterThanOrEqual => Ok(object_value >= query_value),
        Operator::LessThan => Ok(object_value < query_value),
        Operator::LessThanOrEqual => Ok(object_value <= query_value),
        Operator::Contains => Err(QueryError::unsupported_contains(condition.property_key())),
    }
}

fn date_comparison(
    condition: &Condition,
    object_value: &DateTime<Utc>,
    query_day: &DateTime<Tz>,
) -> QueryResult<bool> {
    let (day_start, day_end) = day_to_utc_range(query_day);
    let within_day = *object_value >= day_start && *object_value < day_end;

    match condition.operator() {
        Operator::Equal => Ok(within_day),
        Operator::NotEqual => Ok(!within_day),
        Operator::GreaterThan => Ok(*object_value >= day_end),
        Operator::GreaterThanOrEqual => Ok(*object_value >= day_start),
        Operator::LessThan => Ok(*object_value < day_start),
        Operator::LessThanOrEqual => Ok(*object_value < day_end),
        Operator::Contains => Err(QueryError::unsupported_contains(condition.property_key())),
    }
}

/// Prefix matching of name tokens, equivalent to an edge n-gram index.
fn tokenized_prefix_match(object_value: &str, query_value: &str, length: usize) -> bool {
    let object_tokens = tokenize_name_value(object_value);
    let query_tokens = tokenize_name_value(query_value);

    object_tokens.iter().any(|object_token| {
        let object_token = truncate(object_token, length);
        query_tokens
            .iter()
            .any(|query_token| object_token.starts_with(truncate(query_token, length)))
    })
}

fn truncate(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
