//! Compiles contact queries into Elasticsearch query documents.

use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde_json::Value;

use super::query::{
    all, any, between, datetime, exists, greater_than, greater_than_or_equal, ids, less_than,
    less_than_or_equal, match_phrase, match_query, nested, not, number, term,
};
use super::AssetMapper;
use crate::assets::FieldType;
use crate::env::{day_to_utc_range, Environment};
use crate::query::attributes;
use crate::query::{
    BoolCombination, BoolOperator, Condition, ContactQuery, Operator, PropertyType, QueryError,
    QueryNode, QueryResult,
};

/// Converts a query into an Elasticsearch query document.
///
/// # Errors
///
/// Returns `QueryError::UnresolvedQuery` if the query was parsed without a resolver.
pub fn to_elastic_query(
    env: &Environment,
    mapper: &dyn AssetMapper,
    query: &ContactQuery<'_>,
) -> QueryResult<Value> {
    if !query.is_resolved() {
        return Err(QueryError::UnresolvedQuery);
    }

    tracing::debug!(query = %query, "compiling query");
    Compiler { env, mapper }.node(query.root())
}

struct Compiler<'a> {
    env: &'a Environment,
    mapper: &'a dyn AssetMapper,
}

impl Compiler<'_> {
    fn node(&self, node: &QueryNode) -> QueryResult<Value> {
        match node {
            QueryNode::BoolCombination(combination) => self.combination(combination),
            QueryNode::Condition(condition) => self.condition(condition),
        }
    }

    fn combination(&self, combination: &BoolCombination) -> QueryResult<Value> {
        let queries = combination
            .children()
            .iter()
            .map(|child| self.node(child))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(match combination.operator() {
            BoolOperator::And => all(queries),
            BoolOperator::Or => any(queries),
        })
    }

    fn condition(&self, c: &Condition) -> QueryResult<Value> {
        match c.property_type() {
            PropertyType::Field => self.field_condition(c),
            PropertyType::Attribute => self.attribute_condition(c),
            PropertyType::Scheme => scheme_condition(c),
        }
    }

    fn field_condition(&self, c: &Condition) -> QueryResult<Value> {
        let field = c.field().ok_or(QueryError::UnresolvedQuery)?;
        let field_type = field.field_type;
        let field_query = term("fields.field", field.uuid.as_str());

        if c.is_existence_check() {
            let query = nested(
                "fields",
                all(vec![
                    field_query,
                    exists(&format!("fields.{}", field_type)),
                ]),
            );
            return Ok(negate_if_unset(c, query));
        }

        match field_type {
            FieldType::Text => {
                let value = c.value().to_lowercase();
                match c.operator() {
                    Operator::Equal => Ok(nested(
                        "fields",
                        all(vec![field_query, term("fields.text", value)]),
                    )),
                    Operator::NotEqual => Ok(not(nested(
                        "fields",
                        all(vec![
                            field_query,
                            term("fields.text", value),
                            exists("fields.text"),
                        ]),
                    ))),
                    op => Err(unsupported(c, op)),
                }
            }
            FieldType::Number => {
                let value = number(condition_number(c)?);
                let query = match c.operator() {
                    Operator::Equal => match_query("fields.number", value),
                    Operator::NotEqual => {
                        return Ok(not(nested(
                            "fields",
                            all(vec![field_query, match_query("fields.number", value)]),
                        )))
                    }
                    Operator::Contains => return Err(unsupported(c, Operator::Contains)),
                    op => ordering("fields.number", op, value),
                };
                Ok(nested("fields", all(vec![field_query, query])))
            }
            FieldType::Datetime => {
                let day = self.condition_date(c)?;
                match date_query("fields.datetime", c, &day)? {
                    DateQuery::Negated(query) => Ok(not(nested(
                        "fields",
                        all(vec![field_query, query]),
                    ))),
                    DateQuery::Plain(query) => Ok(nested("fields", all(vec![field_query, query]))),
                }
            }
            FieldType::State | FieldType::District | FieldType::Ward => {
                let value = c.value().to_lowercase();
                let name = format!("fields.{}_keyword", field_type);
                match c.operator() {
                    Operator::Equal => Ok(nested(
                        "fields",
                        all(vec![field_query, term(&name, value)]),
                    )),
                    Operator::NotEqual => Ok(not(nested(
                        "fields",
                        all(vec![term(&name, value), exists(&name)]),
                    ))),
                    op => Err(unsupported(c, op)),
                }
            }
        }
    }

    fn attribute_condition(&self, c: &Condition) -> QueryResult<Value> {
        let key = c.property_key();
        let value = c.value().to_lowercase();

        if c.is_existence_check() {
            return Ok(negate_if_unset(c, attribute_exists(key)));
        }

        match key {
            attributes::UUID => text_attribute(c, "uuid", value),
            attributes::ID => match c.operator() {
                Operator::Equal => Ok(ids(&[value.as_str()])),
                Operator::NotEqual => Ok(not(ids(&[value.as_str()]))),
                Operator::Contains => Err(unsupported(c, Operator::Contains)),
                op => Ok(ordering("id", op, number(condition_number(c)?))),
            },
            attributes::NAME => match c.operator() {
                Operator::Equal => Ok(term("name.keyword", c.value())),
                Operator::NotEqual => Ok(not(term("name.keyword", c.value()))),
                Operator::Contains => Ok(match_query("name", value)),
                op => Err(unsupported(c, op)),
            },
            attributes::STATUS => {
                let code = attributes::status_code(c.value()).ok_or_else(|| {
                    QueryError::InvalidStatus {
                        value: c.value().to_string(),
                    }
                })?;
                text_attribute(c, "status", code.to_string())
            }
            attributes::LANGUAGE => text_attribute(c, "language", value),
            attributes::CREATED_ON | attributes::LAST_SEEN_ON => {
                let day = self.condition_date(c)?;
                Ok(match date_query(key, c, &day)? {
                    DateQuery::Negated(query) => not(query),
                    DateQuery::Plain(query) => query,
                })
            }
            attributes::URN => match c.operator() {
                Operator::Equal => Ok(nested("urns", term("urns.path.keyword", value))),
                Operator::NotEqual => Ok(not(nested("urns", term("urns.path.keyword", value)))),
                Operator::Contains => Ok(nested("urns", match_phrase("urns.path", &value))),
                op => Err(unsupported(c, op)),
            },
            attributes::GROUP => {
                let group = c.group().ok_or(QueryError::UnresolvedQuery)?;
                let query = term("group_ids", self.mapper.group(group));
                match c.operator() {
                    Operator::Equal => Ok(query),
                    Operator::NotEqual => Ok(not(query)),
                    op => Err(unsupported(c, op)),
                }
            }
            attributes::FLOW | attributes::HISTORY => {
                let flow = c.flow().ok_or(QueryError::UnresolvedQuery)?;
                let query = term(flow_index_field(key), self.mapper.flow(flow));
                match c.operator() {
                    Operator::Equal => Ok(query),
                    Operator::NotEqual => Ok(not(query)),
                    op => Err(unsupported(c, op)),
                }
            }
            attributes::TICKETS => {
                let value = number(condition_number(c)?);
                match c.operator() {
                    Operator::Equal => Ok(match_query("tickets", value)),
                    Operator::NotEqual => Ok(not(match_query("tickets", value))),
                    Operator::Contains => Err(unsupported(c, Operator::Contains)),
                    op => Ok(ordering("tickets", op, value)),
                }
            }
            _ => Err(QueryError::unknown_property(key)),
        }
    }

    fn condition_date(&self, c: &Condition) -> QueryResult<DateTime<Tz>> {
        match c.date() {
            Some(day) => Ok(*day),
            None => self
                .env
                .parse_date(c.value())
                .ok_or_else(|| QueryError::invalid_date(c.value())),
        }
    }
}

fn scheme_condition(c: &Condition) -> QueryResult<Value> {
    let key = c.property_key();
    let value = c.value().to_lowercase();

    if c.is_existence_check() {
        let query = nested(
            "urns",
            all(vec![term("urns.scheme", key), exists("urns.path")]),
        );
        return Ok(negate_if_unset(c, query));
    }

    let path_and_scheme = |path_query: Value| {
        nested("urns", all(vec![path_query, term("urns.scheme", key)]))
    };

    match c.operator() {
        Operator::Equal => Ok(path_and_scheme(term("urns.path.keyword", value.as_str()))),
        Operator::NotEqual => Ok(not(path_and_scheme(term(
            "urns.path.keyword",
            value.as_str(),
        )))),
        Operator::Contains => Ok(path_and_scheme(match_phrase("urns.path", &value))),
        op => Err(unsupported(c, op)),
    }
}

/// Query matching contacts where the attribute is set.
fn attribute_exists(key: &str) -> Value {
    match key {
        attributes::NAME | attributes::LANGUAGE => all(vec![
            exists(key),
            not(term(&format!("{}.keyword", key), "")),
        ]),
        attributes::URN => nested("urns", exists("urns.path")),
        attributes::GROUP => exists("group_ids"),
        attributes::FLOW | attributes::HISTORY => exists(flow_index_field(key)),
        _ => exists(key),
    }
}

fn flow_index_field(key: &str) -> &'static str {
    if key == attributes::HISTORY {
        "flow_history_ids"
    } else {
        "flow_id"
    }
}

/// Existence queries match set properties, so `x = ""` is their negation.
fn negate_if_unset(c: &Condition, query: Value) -> Value {
    if c.operator() == Operator::Equal {
        not(query)
    } else {
        query
    }
}

fn text_attribute(c: &Condition, name: &str, value: String) -> QueryResult<Value> {
    match c.operator() {
        Operator::Equal => Ok(term(name, value)),
        Operator::NotEqual => Ok(not(term(name, value))),
        op => Err(unsupported(c, op)),
    }
}

/// Range query for an ordering operator.
fn ordering(field: &str, op: Operator, value: Value) -> Value {
    match op {
        Operator::GreaterThan => greater_than(field, value),
        Operator::GreaterThanOrEqual => greater_than_or_equal(field, value),
        Operator::LessThan => less_than(field, value),
        _ => less_than_or_equal(field, value),
    }
}

enum DateQuery {
    Plain(Value),
    /// The query to negate, for `!=`.
    Negated(Value),
}

/// Range query on whole days in the query's timezone.
fn date_query(field: &str, c: &Condition, day: &DateTime<Tz>) -> QueryResult<DateQuery> {
    let (start, end) = day_to_utc_range(day);
    let (start, end) = (datetime(start), datetime(end));

    Ok(match c.operator() {
        Operator::Equal => DateQuery::Plain(between(field, start, end)),
        Operator::NotEqual => DateQuery::Negated(between(field, start, end)),
        Operator::GreaterThan => DateQuery::Plain(greater_than_or_equal(field, end)),
        Operator::GreaterThanOrEqual => DateQuery::Plain(greater_than_or_equal(field, start)),
        Operator::LessThan => DateQuery::Plain(less_than(field, start)),
        Operator::LessThanOrEqual => DateQuery::Plain(less_than(field, end)),
        Operator::Contains => return Err(unsupported(c, Operator::Contains)),
    })
}

fn condition_number(c: &Condition) -> QueryResult<Decimal> {
    match c.number() {
        Some(n) => Ok(n),
        None => c
            .value()
            .trim()
            .parse::<Decimal>()
            .map_err(|_| QueryError::invalid_number(c.value())),
    }
}

fn unsupported(c: &Condition, op: Operator) -> QueryError {
    match op {
        Operator::Contains => QueryError::unsupported_contains(c.property_key()),
        op => QueryError::unsupported_comparison(c.property_key(), op.as_str()),
    }
}
