//! ContactQL: a query language for searching contacts.
//!
//! Queries such as `age > 18 AND district = Gasabo OR tel ~ 0788` are parsed
//! and validated once into a [`ContactQuery`](query::ContactQuery), which can
//! then be:
//!
//! - evaluated in-process against any [`Queryable`](query::Queryable) object,
//! - compiled into an Elasticsearch query document (see [`es`]),
//! - inspected to find the attributes, schemes, fields and groups it uses,
//! - turned back into canonical query text with `to_string()`.
//!
//! Assets referenced by queries (fields, groups and flows) are looked up
//! through a [`Resolver`](assets::Resolver), and parsing is shaped by an
//! [`Environment`](env::Environment).

pub mod assets;
pub mod env;
pub mod es;
pub mod query;
pub mod urns;

pub use assets::{Field, FieldType, Flow, Group, Resolver, StaticResolver};
pub use env::Environment;
pub use query::{parse_query, ContactQuery, Inspection, QueryError, QueryResult};
