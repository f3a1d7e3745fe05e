//! The fixed contact attributes a query can test.

use crate::assets::FieldType;

pub const UUID: &str = "uuid";
pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const LANGUAGE: &str = "language";
pub const GROUP: &str = "group";
pub const CREATED_ON: &str = "created_on";
pub const LAST_SEEN_ON: &str = "last_seen_on";
pub const URN: &str = "urn";
pub const STATUS: &str = "status";
pub const FLOW: &str = "flow";
pub const HISTORY: &str = "history";
pub const TICKETS: &str = "tickets";

/// Every attribute and the type of its values.
const ATTRIBUTES: &[(&str, FieldType)] = &[
    (UUID, FieldType::Text),
    (ID, FieldType::Number),
    (NAME, FieldType::Text),
    (LANGUAGE, FieldType::Text),
    (GROUP, FieldType::Text),
    (CREATED_ON, FieldType::Datetime),
    (LAST_SEEN_ON, FieldType::Datetime),
    (URN, FieldType::Text),
    (STATUS, FieldType::Text),
    (FLOW, FieldType::Text),
    (HISTORY, FieldType::Text),
    (TICKETS, FieldType::Number),
];

/// Attributes every contact has, so they can't be checked for being set.
pub(crate) const ALWAYS_SET: &[&str] = &[UUID, ID, CREATED_ON, GROUP];

/// Attributes that stop a query from being saved as a dynamic group.
pub(crate) const UNSTABLE_FOR_GROUPS: &[&str] = &[ID, STATUS, GROUP, FLOW, HISTORY];

/// Contact statuses and their single character codes in the search index.
pub const STATUSES: &[(&str, &str)] = &[
    ("active", "A"),
    ("blocked", "B"),
    ("stopped", "S"),
    ("archived", "V"),
];

/// Returns true if `key` names an attribute.
pub fn is_attribute(key: &str) -> bool {
    value_type(key).is_some()
}

/// Returns the type of an attribute's values.
pub fn value_type(key: &str) -> Option<FieldType> {
    ATTRIBUTES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value_type)| *value_type)
}

/// Returns the index code for a status name (case-insensitive).
pub fn status_code(status: &str) -> Option<&'static str> {
    let status = status.to_lowercase();
    STATUSES
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, code)| *code)
}
