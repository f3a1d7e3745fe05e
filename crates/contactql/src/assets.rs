//! Workspace assets a query can reference: contact fields, groups and flows.
//!
//! Assets are looked up through a [`Resolver`]. Lookups are case-insensitive:
//! fields by key, groups and flows by name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value type of a contact field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Datetime,
    State,
    District,
    Ward,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Datetime => "datetime",
            FieldType::State => "state",
            FieldType::District => "district",
            FieldType::Ward => "ward",
        }
    }

    /// Returns true for the administrative boundary types.
    pub fn is_location(&self) -> bool {
        matches!(self, FieldType::State | FieldType::District | FieldType::Ward)
    }

    /// Returns true if values of this type can be ordered with `<`, `>`, `<=` and `>=`.
    pub fn is_orderable(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Datetime)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom contact field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub uuid: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(
        uuid: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            key: key.into(),
            name: name.into(),
            field_type,
        }
    }

    pub fn reference(&self) -> FieldReference {
        FieldReference::new(&self.key, &self.name)
    }
}

/// A contact group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: String,
    pub name: String,
}

impl Group {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }
}

/// A flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub uuid: String,
    pub name: String,
}

impl Flow {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }
}

/// A reference to a field from an inspected query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    pub key: String,
    pub name: String,
}

impl FieldReference {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// A reference to a group from an inspected query.
///
/// Resolved references carry the group's UUID and name. Unresolved references
/// only carry the text the query used to match the group's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_match: Option<String>,
}

impl GroupReference {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            name: Some(name.into()),
            name_match: None,
        }
    }

    pub fn variable(name_match: impl Into<String>) -> Self {
        Self {
            uuid: None,
            name: None,
            name_match: Some(name_match.into()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.uuid.is_some()
    }
}

impl From<&Group> for GroupReference {
    fn from(group: &Group) -> Self {
        Self::new(&group.uuid, &group.name)
    }
}

/// Looks up the assets a query refers to.
pub trait Resolver: Send + Sync {
    /// Finds a field by key.
    fn resolve_field(&self, key: &str) -> Option<Field>;

    /// Finds a group by name.
    fn resolve_group(&self, name: &str) -> Option<Group>;

    /// Finds a flow by name.
    fn resolve_flow(&self, name: &str) -> Option<Flow>;
}

/// A [`Resolver`] over fixed lists of assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticResolver {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl StaticResolver {
    pub fn new(fields: Vec<Field>, groups: Vec<Group>, flows: Vec<Flow>) -> Self {
        Self {
            fields,
            groups,
            flows,
        }
    }
}

impl Resolver for StaticResolver {
    fn resolve_field(&self, key: &str) -> Option<Field> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .cloned()
    }

    fn resolve_group(&self, name: &str) -> Option<Group> {
        let name = name.to_lowercase();
        self.groups
            .iter()
            .find(|g| g.name.to_lowercase() == name)
            .cloned()
    }

    fn resolve_flow(&self, name: &str) -> Option<Flow> {
        let name = name.to_lowercase();
        self.flows
            .iter()
            .find(|f| f.name.to_lowercase() == name)
            .cloned()
    }
}
