//! Error types for parsing, validating, evaluating and compiling queries.

use std::collections::BTreeMap;

use thiserror::Error;

/// A specialized Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while handling a contact query.
///
/// Every variant has a stable wire code (see [`QueryError::code`]) and carries
/// the data needed to explain the failure (see [`QueryError::extra`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query text is not well formed.
    #[error("{message}")]
    Syntax {
        /// Description of the problem.
        message: String,
    },

    /// A token appeared where it isn't allowed.
    #[error("mismatched input '{token}'")]
    UnexpectedToken {
        /// The offending token text.
        token: String,
    },

    /// A value compared against a number couldn't be parsed as one.
    #[error("can't convert '{value}' to a number")]
    InvalidNumber { value: String },

    /// A value compared against a date couldn't be parsed as one.
    #[error("can't convert '{value}' to a date")]
    InvalidDate { value: String },

    /// No group exists with the given name.
    #[error("'{value}' is not a valid group name")]
    InvalidGroup { value: String },

    /// No flow exists with the given name.
    #[error("'{value}' is not a valid flow name")]
    InvalidFlow { value: String },

    /// The value is not an ISO-639-3 language code.
    #[error("'{value}' is not a valid language code")]
    InvalidLanguage { value: String },

    /// The value is not a contact status.
    #[error("'{value}' is not a valid contact status")]
    InvalidStatus { value: String },

    /// A contains condition on name has no token long enough.
    #[error("contains operator on name requires token of minimum length {min_token_length}")]
    InvalidPartialName { min_token_length: usize },

    /// A contains condition on a URN has a value that is too short.
    #[error("contains operator on URN requires value of minimum length {min_value_length}")]
    InvalidPartialUrn { min_value_length: usize },

    /// The contains operator was used on a property that doesn't support it.
    #[error("contains conditions can only be used with name or URN values")]
    UnsupportedContains { property: String },

    /// An ordering operator was used on a property that doesn't support it.
    #[error("comparisons with {operator} can only be used with date and number fields")]
    UnsupportedComparison { property: String, operator: String },

    /// An existence check was used on a property that is always set.
    #[error("can't check whether '{property}' is set or not set")]
    UnsupportedSetCheck { property: String, operator: String },

    /// A dotted property used an unknown prefix.
    #[error("unknown property type '{property_type}'")]
    UnknownPropertyType { property_type: String },

    /// The property isn't an attribute, scheme or known field.
    #[error("can't resolve '{property}' to attribute, scheme or field")]
    UnknownProperty { property: String },

    /// URNs were queried while URNs are redacted.
    #[error("cannot query on redacted URNs")]
    RedactedUrns,

    /// The query was parsed without a resolver and can't be compiled.
    #[error("can't compile a query that was parsed without a resolver")]
    UnresolvedQuery,

    /// A sort referred to a field that doesn't exist.
    #[error("unable to find field with name: {field}")]
    NoSuchField { field: String },
}

impl QueryError {
    /// Returns the stable code identifying this kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Syntax { .. } => "syntax",
            QueryError::UnexpectedToken { .. } => "unexpected_token",
            QueryError::InvalidNumber { .. } => "invalid_number",
            QueryError::InvalidDate { .. } => "invalid_date",
            QueryError::InvalidGroup { .. } => "invalid_group",
            QueryError::InvalidFlow { .. } => "invalid_flow",
            QueryError::InvalidLanguage { .. } => "invalid_language",
            QueryError::InvalidStatus { .. } => "invalid_status",
            QueryError::InvalidPartialName { .. } => "invalid_partial_name",
            QueryError::InvalidPartialUrn { .. } => "invalid_partial_urn",
            QueryError::UnsupportedContains { .. } => "unsupported_contains",
            QueryError::UnsupportedComparison { .. } => "unsupported_comparison",
            QueryError::UnsupportedSetCheck { .. } => "unsupported_setcheck",
            QueryError::UnknownPropertyType { .. } => "unknown_property_type",
            QueryError::UnknownProperty { .. } => "unknown_property",
            QueryError::RedactedUrns => "redacted_urns",
            QueryError::UnresolvedQuery => "unresolved_query",
            QueryError::NoSuchField { .. } => "no_such_field",
        }
    }

    /// Returns the data carried by this error, keyed by name.
    pub fn extra(&self) -> BTreeMap<&'static str, String> {
        let mut extra = BTreeMap::new();
        match self {
            QueryError::Syntax { .. }
            | QueryError::RedactedUrns
            | QueryError::UnresolvedQuery => {}
            QueryError::UnexpectedToken { token } => {
                extra.insert("token", token.clone());
            }
            QueryError::InvalidNumber { value }
            | QueryError::InvalidDate { value }
            | QueryError::InvalidGroup { value }
            | QueryError::InvalidFlow { value }
            | QueryError::InvalidLanguage { value }
            | QueryError::InvalidStatus { value } => {
                extra.insert("value", value.clone());
            }
            QueryError::InvalidPartialName { min_token_length } => {
                extra.insert("min_token_length", min_token_length.to_string());
            }
            QueryError::InvalidPartialUrn { min_value_length } => {
                extra.insert("min_value_length", min_value_length.to_string());
            }
            QueryError::UnsupportedContains { property } => {
                extra.insert("property", property.clone());
            }
            QueryError::UnsupportedComparison { property, operator }
            | QueryError::UnsupportedSetCheck { property, operator } => {
                extra.insert("property", property.clone());
                extra.insert("operator", operator.clone());
            }
            QueryError::UnknownPropertyType { property_type } => {
                extra.insert("type", property_type.clone());
            }
            QueryError::UnknownProperty { property } => {
                extra.insert("property", property.clone());
            }
            QueryError::NoSuchField { field } => {
                extra.insert("field", field.clone());
            }
        }
        extra
    }

    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        QueryError::Syntax {
            message: message.into(),
        }
    }

    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        QueryError::UnexpectedToken {
            token: token.into(),
        }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(value: impl Into<String>) -> Self {
        QueryError::InvalidNumber {
            value: value.into(),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        QueryError::InvalidDate {
            value: value.into(),
        }
    }

    pub fn unsupported_contains(property: impl Into<String>) -> Self {
        QueryError::UnsupportedContains {
            property: property.into(),
        }
    }

    pub fn unsupported_comparison(property: impl Into<String>, operator: impl Into<String>) -> Self {
        QueryError::UnsupportedComparison {
            property: property.into(),
            operator: operator.into(),
        }
    }

    pub fn unknown_property(property: impl Into<String>) -> Self {
        QueryError::UnknownProperty {
            property: property.into(),
        }
    }
}
