//! Abstract syntax tree for validated contact queries.
//!
//! The [`fmt::Display`] impls render the canonical text form of a query,
//! which parses back to the same tree.

use std::fmt;
use std::sync::OnceLock;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::{Field, FieldType, Flow, Group, Resolver};
use crate::query::{attributes, lexer};
use crate::urns;

/// What kind of contact property a condition tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// A built-in attribute such as `name` or `created_on`.
    Attribute,
    /// A URN scheme such as `tel` or `twitter`.
    Scheme,
    /// A custom contact field.
    Field,
}

/// A condition comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// Word comparators and the operators they stand for.
const COMPARATOR_ALIASES: &[(&str, Operator)] =
    &[("is", Operator::Equal), ("has", Operator::Contains)];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Contains => "~",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
        }
    }

    /// Resolves comparator text, including the `is`/`has` aliases (case-insensitive).
    pub fn from_comparator(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if let Some((_, op)) = COMPARATOR_ALIASES.iter().find(|(alias, _)| *alias == text) {
            return Some(*op);
        }

        match text.as_str() {
            "=" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            "~" => Some(Operator::Contains),
            ">" => Some(Operator::GreaterThan),
            "<" => Some(Operator::LessThan),
            ">=" => Some(Operator::GreaterThanOrEqual),
            "<=" => Some(Operator::LessThanOrEqual),
            _ => None,
        }
    }

    /// Returns true for `=` and `!=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Equal | Operator::NotEqual)
    }

    /// Returns true for `>`, `<`, `>=` and `<=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::LessThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThanOrEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator joining the children of a [`BoolCombination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOperator {
    And,
    Or,
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOperator::And => f.write_str("AND"),
            BoolOperator::Or => f.write_str("OR"),
        }
    }
}

/// A condition value after it has been parsed or resolved against its property type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Number(Decimal),
    /// The start of the named day in the environment's timezone.
    DateTime(DateTime<Tz>),
    Group(Group),
    Flow(Flow),
}

/// A single `property operator value` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    property_type: PropertyType,
    property_key: String,
    field: Option<Field>,
    operator: Operator,
    value: String,
    value_type: Option<FieldType>,
    resolved: Option<ResolvedValue>,
}

impl Condition {
    pub(crate) fn new(
        property_type: PropertyType,
        property_key: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property_type,
            property_key: property_key.into(),
            field: None,
            operator,
            value: value.into(),
            value_type: None,
            resolved: None,
        }
    }

    pub(crate) fn with_field(mut self, field: Option<Field>) -> Self {
        self.field = field;
        self
    }

    pub(crate) fn with_value_type(mut self, value_type: Option<FieldType>) -> Self {
        self.value_type = value_type;
        self
    }

    pub(crate) fn with_resolved(mut self, resolved: Option<ResolvedValue>) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// The lowercased property key, without any `fields.` or `urns.` prefix.
    pub fn property_key(&self) -> &str {
        &self.property_key
    }

    /// The resolved field, for field conditions parsed with a resolver.
    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The literal value. Group and flow names are normalized to the resolved asset's name.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The type of the property's values, if known.
    pub fn value_type(&self) -> Option<FieldType> {
        self.value_type
    }

    pub fn resolved(&self) -> Option<&ResolvedValue> {
        self.resolved.as_ref()
    }

    pub fn number(&self) -> Option<Decimal> {
        match &self.resolved {
            Some(ResolvedValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<&DateTime<Tz>> {
        match &self.resolved {
            Some(ResolvedValue::DateTime(d)) => Some(d),
            _ => None,
        }
    }

    pub fn group(&self) -> Option<&Group> {
        match &self.resolved {
            Some(ResolvedValue::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn flow(&self) -> Option<&Flow> {
        match &self.resolved {
            Some(ResolvedValue::Flow(f)) => Some(f),
            _ => None,
        }
    }

    /// Returns true if this condition tests whether the property is set at all.
    pub fn is_existence_check(&self) -> bool {
        self.value.is_empty() && self.operator.is_equality()
    }

    /// Returns true if this is a test against the given attribute.
    pub fn is_attribute(&self, key: &str) -> bool {
        self.property_type == PropertyType::Attribute && self.property_key == key
    }

    /// The key as it must be written so that it parses back to the same property.
    fn canonical_key(&self) -> String {
        match self.property_type {
            PropertyType::Field
                if attributes::is_attribute(&self.property_key)
                    || urns::is_valid_scheme(&self.property_key)
                    || lexer::is_keyword(&self.property_key) =>
            {
                format!("fields.{}", self.property_key)
            }
            PropertyType::Scheme if !urns::is_valid_scheme(&self.property_key) => {
                format!("urns.{}", self.property_key)
            }
            _ => self.property_key.clone(),
        }
    }
}

fn bare_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number pattern is valid"))
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if bare_number_regex().is_match(value) {
        f.write_str(value)
    } else {
        write!(f, "\"{}\"", value.replace('"', "\"\""))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.canonical_key(), self.operator)?;
        write_value(f, &self.value)
    }
}

/// An AND or OR of two or more query nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolCombination {
    operator: BoolOperator,
    children: Vec<QueryNode>,
}

impl BoolCombination {
    pub(crate) fn new(operator: BoolOperator, children: Vec<QueryNode>) -> Self {
        Self { operator, children }
    }

    pub fn operator(&self) -> BoolOperator {
        self.operator
    }

    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    fn fmt_children(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{}", child)?;
        }
        Ok(())
    }
}

impl fmt::Display for BoolCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        self.fmt_children(f)?;
        f.write_str(")")
    }
}

/// A node in a query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Condition(Condition),
    BoolCombination(BoolCombination),
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Condition(c) => c.fmt(f),
            QueryNode::BoolCombination(b) => b.fmt(f),
        }
    }
}

/// A parsed and validated contact query.
///
/// Queries are immutable once parsed and can be evaluated, compiled and
/// inspected any number of times.
#[derive(Clone)]
pub struct ContactQuery<'r> {
    root: QueryNode,
    resolver: Option<&'r dyn Resolver>,
}

impl<'r> ContactQuery<'r> {
    pub(crate) fn new(root: QueryNode, resolver: Option<&'r dyn Resolver>) -> Self {
        Self { root, resolver }
    }

    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    /// The resolver the query was parsed with, if any.
    pub fn resolver(&self) -> Option<&'r dyn Resolver> {
        self.resolver
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_some()
    }
}

impl fmt::Debug for ContactQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactQuery")
            .field("root", &self.root)
            .field("resolved", &self.resolver.is_some())
            .finish()
    }
}

impl fmt::Display for ContactQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            QueryNode::BoolCombination(b) => b.fmt_children(f),
            QueryNode::Condition(c) => c.fmt(f),
        }
    }
}
