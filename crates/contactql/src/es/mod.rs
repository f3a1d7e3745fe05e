//! Elasticsearch query generation.
//!
//! Contacts are expected to be indexed with this layout:
//!
//! | Property        | Index field                                      |
//! |-----------------|--------------------------------------------------|
//! | id              | document `_id`                                   |
//! | uuid            | `uuid` (keyword)                                 |
//! | name            | `name` (text) and `name.keyword`                 |
//! | status          | `status` (single character code)                 |
//! | language        | `language` and `language.keyword`                |
//! | created_on      | `created_on` (date)                              |
//! | last_seen_on    | `last_seen_on` (date)                            |
//! | groups          | `group_ids` (integers)                           |
//! | flow / history  | `flow_id`, `flow_history_ids` (integers)         |
//! | tickets         | `tickets` (integer)                              |
//! | URNs            | nested `urns` with `scheme`, `path`, `path.keyword` |
//! | custom fields   | nested `fields` with `field` (uuid) and one of `text`, `number`, `datetime`, `state_keyword`, `district_keyword`, `ward_keyword` |
//!
//! Groups and flows are referenced in the index by integer IDs, which the
//! caller supplies through an [`AssetMapper`].

mod compiler;
pub mod query;
mod sort;


use crate::assets::{Flow, Group};

pub use compiler::to_elastic_query;
pub use sort::to_elastic_sort;

/// Maps assets to the IDs they are indexed under.
pub trait AssetMapper {
    fn flow(&self, flow: &Flow) -> i64;
    fn group(&self, group: &Group) -> i64;
}
