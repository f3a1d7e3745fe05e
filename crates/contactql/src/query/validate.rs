//! Semantic resolution and validation of conditions.
//!
//! This is where a bare `key op value` becomes a typed [`Condition`]: the key
//! is classified as an attribute, URN scheme or field, the operator is checked
//! against the property's type and the literal is parsed or resolved.

use std::borrow::Cow;
use std::str::FromStr;

use isolang::Language;
use rust_decimal::Decimal;
use unicode_segmentation::UnicodeSegmentation;

use super::ast::{Condition, ContactQuery, Operator, PropertyType, ResolvedValue};
use super::attributes;
use super::builder::AstBuilder;
use super::error::{QueryError, QueryResult};
use super::parser::Parser;
use crate::assets::{FieldType, Resolver};
use crate::env::{Environment, RedactionPolicy};
use crate::urns;

/// Key the builder gives conditions written as a bare literal.
pub(crate) const IMPLICIT_KEY: &str = "*";

/// Minimum length of at least one name token in a `name ~ x` condition.
pub const MIN_NAME_TOKEN_LENGTH: usize = 2;

/// Minimum length of the value in a URN contains condition.
pub const MIN_URN_VALUE_LENGTH: usize = 3;

/// Parses and validates a contact query.
///
/// With a resolver, field keys, group names and flow names are resolved and
/// anything that doesn't resolve is an error. Without one, fields are assumed
/// to exist and groups and flows are left unresolved, which is enough to
/// inspect a query but not to compile it.
///
/// # Example
///
/// ```
/// use contactql::env::Environment;
/// use contactql::query::parse_query;
///
/// let env = Environment::default();
/// let query = parse_query(&env, "name = bob OR twitter = bobby", None).unwrap();
/// assert_eq!(query.to_string(), r#"name = "bob" OR twitter = "bobby""#);
/// ```
pub fn parse_query<'r>(
    env: &Environment,
    text: &str,
    resolver: Option<&'r dyn Resolver>,
) -> QueryResult<ContactQuery<'r>> {
    let text = preprocess(env, text.trim());

    let tree = Parser::parse(&text)?;
    let builder = AstBuilder::new(Validator::new(env, resolver));
    let root = builder.build(tree).inspect_err(|err| {
        tracing::debug!(query = %text, code = err.code(), "query failed validation");
    })?;

    Ok(ContactQuery::new(root, resolver))
}

/// Rewrites whole-query phone numbers and, under URN redaction, IDs.
fn preprocess<'t>(env: &Environment, text: &'t str) -> Cow<'t, str> {
    match env.redaction_policy {
        RedactionPolicy::None => {
            if let Some(number) = urns::parse_phone_number(text, env.default_country.as_deref()) {
                tracing::debug!(query = text, number = %number, "rewriting phone number query");
                return Cow::Owned(format!("{} = {}", urns::TEL_SCHEME, number));
            }
        }
        RedactionPolicy::Urns => {
            if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                tracing::debug!(query = text, "rewriting numeric query as ID lookup");
                return Cow::Owned(format!("{} = {}", attributes::ID, text));
            }
        }
    }
    Cow::Borrowed(text)
}

/// Splits a name into lowercase words, keeping those long enough to match on.
pub(crate) fn tokenize_name_value(value: &str) -> Vec<String> {
    value
        .to_lowercase()
        .unicode_words()
        .filter(|w| w.chars().count() >= MIN_NAME_TOKEN_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Turns raw conditions into validated ones.
pub(crate) struct Validator<'a> {
    env: &'a Environment,
    resolver: Option<&'a dyn Resolver>,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(env: &'a Environment, resolver: Option<&'a dyn Resolver>) -> Self {
        Self { env, resolver }
    }

    /// Classifies and validates a condition. `key` must already be lowercase.
    pub(crate) fn condition(
        &self,
        key: &str,
        operator: Operator,
        value: String,
    ) -> QueryResult<Condition> {
        let (property_type, key, operator, value) = if key == IMPLICIT_KEY {
            self.implicit(value)
        } else {
            let (property_type, key) = self.classify(key, &value)?;
            (property_type, key, operator, value)
        };

        self.validate(property_type, key, operator, value)
    }

    /// Decides what a bare literal is matched against.
    fn implicit(&self, value: String) -> (PropertyType, String, Operator, String) {
        if !self.env.redacts_urns() {
            if let Some((scheme, path)) = urns::parse_urn(&value) {
                return (PropertyType::Scheme, scheme, Operator::Equal, path);
            }

            if urns::looks_like_phone_number(&value) {
                let cleaned = urns::clean_phone_number(&value);
                return (
                    PropertyType::Scheme,
                    urns::TEL_SCHEME.to_string(),
                    Operator::Contains,
                    cleaned,
                );
            }
        }

        // only a contains if there's a token long enough to match on
        let operator = if tokenize_name_value(&value).is_empty() {
            Operator::Equal
        } else {
            Operator::Contains
        };

        (
            PropertyType::Attribute,
            attributes::NAME.to_string(),
            operator,
            value,
        )
    }

    /// Works out what kind of property a key refers to.
    fn classify(&self, key: &str, value: &str) -> QueryResult<(PropertyType, String)> {
        let redacted = self.env.redacts_urns() && !value.is_empty();

        if let Some((prefix, rest)) = key.split_once('.') {
            return match prefix {
                "fields" => Ok((PropertyType::Field, rest.to_string())),
                "urns" if redacted => Err(QueryError::RedactedUrns),
                "urns" => Ok((PropertyType::Scheme, rest.to_string())),
                _ => Err(QueryError::UnknownPropertyType {
                    property_type: prefix.to_string(),
                }),
            };
        }

        if attributes::is_attribute(key) {
            if key == attributes::URN && redacted {
                return Err(QueryError::RedactedUrns);
            }
            Ok((PropertyType::Attribute, key.to_string()))
        } else if urns::is_valid_scheme(key) {
            if redacted {
                return Err(QueryError::RedactedUrns);
            }
            Ok((PropertyType::Scheme, key.to_string()))
        } else {
            Ok((PropertyType::Field, key.to_string()))
        }
    }

    fn validate(
        &self,
        property_type: PropertyType,
        key: String,
        operator: Operator,
        mut value: String,
    ) -> QueryResult<Condition> {
        let mut field = None;
        let value_type = match property_type {
            PropertyType::Attribute => attributes::value_type(&key),
            PropertyType::Scheme => Some(FieldType::Text),
            PropertyType::Field => match self.resolver {
                Some(resolver) => {
                    let resolved = resolver
                        .resolve_field(&key)
                        .ok_or_else(|| QueryError::unknown_property(&key))?;
                    let field_type = resolved.field_type;
                    field = Some(resolved);
                    Some(field_type)
                }
                None => None,
            },
        };

        self.check_operator(property_type, &key, operator, &value, value_type)?;

        let resolved = if value.is_empty() {
            if operator.is_equality() {
                if property_type == PropertyType::Attribute
                    && attributes::ALWAYS_SET.contains(&key.as_str())
                {
                    return Err(QueryError::UnsupportedSetCheck {
                        property: key,
                        operator: operator.to_string(),
                    });
                }
                None
            } else if value_type == Some(FieldType::Datetime) {
                return Err(QueryError::invalid_date(value));
            } else {
                return Err(QueryError::invalid_number(value));
            }
        } else {
            self.resolve_value(property_type, &key, value_type, &mut value)?
        };

        Ok(Condition::new(property_type, key, operator, value)
            .with_field(field)
            .with_value_type(value_type)
            .with_resolved(resolved))
    }

    fn check_operator(
        &self,
        property_type: PropertyType,
        key: &str,
        operator: Operator,
        value: &str,
        value_type: Option<FieldType>,
    ) -> QueryResult<()> {
        if operator == Operator::Contains {
            let is_name = property_type == PropertyType::Attribute && key == attributes::NAME;
            let is_urn = property_type == PropertyType::Scheme
                || (property_type == PropertyType::Attribute && key == attributes::URN);

            if is_name {
                if tokenize_name_value(value).is_empty() {
                    return Err(QueryError::InvalidPartialName {
                        min_token_length: MIN_NAME_TOKEN_LENGTH,
                    });
                }
            } else if is_urn {
                if value.chars().count() < MIN_URN_VALUE_LENGTH {
                    return Err(QueryError::InvalidPartialUrn {
                        min_value_length: MIN_URN_VALUE_LENGTH,
                    });
                }
            } else {
                return Err(QueryError::unsupported_contains(key));
            }
        } else if operator.is_ordering() {
            if let Some(value_type) = value_type {
                if !value_type.is_orderable() {
                    return Err(QueryError::unsupported_comparison(key, operator.as_str()));
                }
            }
        }
        Ok(())
    }

    /// Parses or resolves a non-empty literal according to its property.
    fn resolve_value(
        &self,
        property_type: PropertyType,
        key: &str,
        value_type: Option<FieldType>,
        value: &mut String,
    ) -> QueryResult<Option<ResolvedValue>> {
        if property_type == PropertyType::Attribute {
            match key {
                attributes::GROUP => {
                    let Some(resolver) = self.resolver else {
                        return Ok(None);
                    };
                    let group = resolver.resolve_group(value).ok_or_else(|| {
                        QueryError::InvalidGroup {
                            value: value.clone(),
                        }
                    })?;
                    *value = group.name.clone();
                    return Ok(Some(ResolvedValue::Group(group)));
                }
                attributes::FLOW | attributes::HISTORY => {
                    let Some(resolver) = self.resolver else {
                        return Ok(None);
                    };
                    let flow = resolver.resolve_flow(value).ok_or_else(|| {
                        QueryError::InvalidFlow {
                            value: value.clone(),
                        }
                    })?;
                    *value = flow.name.clone();
                    return Ok(Some(ResolvedValue::Flow(flow)));
                }
                attributes::LANGUAGE => {
                    if Language::from_639_3(&value.to_lowercase()).is_none() {
                        return Err(QueryError::InvalidLanguage {
                            value: value.clone(),
                        });
                    }
                    return Ok(None);
                }
                attributes::STATUS => {
                    if attributes::status_code(value).is_none() {
                        return Err(QueryError::InvalidStatus {
                            value: value.clone(),
                        });
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }

        match value_type {
            Some(FieldType::Number) => Decimal::from_str(value.trim())
                .map(|n| Some(ResolvedValue::Number(n)))
                .map_err(|_| QueryError::invalid_number(value.as_str())),
            Some(FieldType::Datetime) => self
                .env
                .parse_date(value)
                .map(|d| Some(ResolvedValue::DateTime(d)))
                .ok_or_else(|| QueryError::invalid_date(value.as_str())),
            _ => Ok(None),
        }
    }
}
