//! Contact query parser, validator, evaluator and inspector.
//!
//! # Supported Syntax
//!
//! ## Conditions
//! - `name = "Bob Smith"` - Exact match (case-insensitive)
//! - `name != bob` - Not equal (true only if no value matches)
//! - `name ~ smi` - Contains (names match on word prefixes)
//! - `age > 18`, `age >= 18`, `age < 18`, `age <= 18` - Number and date ordering
//! - `name is bob`, `name has bob` - Aliases for `=` and `~`
//! - `email = ""` / `email != ""` - Property is unset / set
//!
//! ## Properties
//! - Attributes: `uuid`, `id`, `name`, `language`, `group`, `created_on`,
//!   `last_seen_on`, `urn`, `status`, `flow`, `history`, `tickets`
//! - URN schemes: `tel`, `twitter`, `whatsapp`, ...
//! - Custom fields by key: `age`, `district`, ...
//! - `fields.<key>` and `urns.<scheme>` force a property type
//!
//! ## Implicit Conditions
//! - `bob` - `name ~ "bob"`
//! - `tel:+250788123123` - `tel = "+250788123123"`
//! - `0788123` - `tel ~ 0788123`
//!
//! ## Boolean Operators
//! - `AND` (or just a space) - AND
//! - `OR` - OR
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use contactql::assets::{Field, FieldType, StaticResolver};
//! use contactql::env::Environment;
//! use contactql::query::parse_query;
//!
//! let resolver = StaticResolver::new(
//!     vec![Field::new("f1b5aea6-6586-41c7-9020-1a6326cc6565", "age", "Age", FieldType::Number)],
//!     vec![],
//!     vec![],
//! );
//! let env = Environment::default();
//!
//! let query = parse_query(&env, "age > 18 tel ~ 0788", Some(&resolver)).unwrap();
//! assert_eq!(query.to_string(), "age > 18 AND tel ~ 0788");
//!
//! let inspection = query.inspect();
//! assert_eq!(inspection.fields[0].name, "Age");
//! assert!(inspection.allow_as_group);
//! ```

pub mod attributes;

mod ast;
mod builder;
mod error;
mod evaluator;
mod inspect;
mod lexer;
mod parser;
mod validate;

pub use ast::{
    BoolCombination, BoolOperator, Condition, ContactQuery, Operator, PropertyType, QueryNode,
    ResolvedValue,
};
pub use error::{QueryError, QueryResult};
pub use evaluator::{QueryEvaluator, Queryable, Value};
pub use inspect::{inspect, Inspection};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Literal, ParseTree, Parser, MAX_DEPTH, MAX_TREE_DEPTH};
pub use validate::{parse_query, MIN_NAME_TOKEN_LENGTH, MIN_URN_VALUE_LENGTH};

impl ContactQuery<'_> {
    /// Evaluates this query against an object. See [`QueryEvaluator::matches`].
    pub fn evaluate<Q: Queryable + ?Sized>(
        &self,
        env: &crate::env::Environment,
        queryable: &Q,
    ) -> QueryResult<bool> {
        QueryEvaluator::new(env, self).matches(queryable)
    }
}

#[cfg(test)]
mod tests;
