//! Static inspection of what a query refers to.

use std::collections::BTreeSet;

use serde::Serialize;

use super::ast::{Condition, ContactQuery, PropertyType, QueryNode};
use super::attributes;
use crate::assets::{FieldReference, GroupReference};

/// The attributes, schemes, fields and groups a query refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub attributes: BTreeSet<String>,
    pub schemes: BTreeSet<String>,
    pub fields: Vec<FieldReference>,
    pub groups: Vec<GroupReference>,
    /// Whether the query can be saved as a dynamic group.
    pub allow_as_group: bool,
}

impl Default for Inspection {
    fn default() -> Self {
        Self {
            attributes: BTreeSet::new(),
            schemes: BTreeSet::new(),
            fields: Vec::new(),
            groups: Vec::new(),
            allow_as_group: true,
        }
    }
}

impl Inspection {
    fn add_condition(&mut self, condition: &Condition) {
        let key = condition.property_key();

        match condition.property_type() {
            PropertyType::Attribute => {
                self.attributes.insert(key.to_string());

                if attributes::UNSTABLE_FOR_GROUPS.contains(&key) {
                    self.allow_as_group = false;
                }

                if key == attributes::GROUP && !condition.value().is_empty() {
                    let reference = match condition.group() {
                        Some(group) => GroupReference::from(group),
                        None => GroupReference::variable(condition.value()),
                    };
                    if !self.groups.contains(&reference) {
                        self.groups.push(reference);
                    }
                }
            }
            PropertyType::Scheme => {
                self.schemes.insert(key.to_string());
            }
            PropertyType::Field => {
                let reference = match condition.field() {
                    Some(field) => field.reference(),
                    None => FieldReference::new(key, ""),
                };
                if !self.fields.iter().any(|f| f.key == reference.key) {
                    self.fields.push(reference);
                }
            }
        }
    }

    fn add_node(&mut self, node: &QueryNode) {
        match node {
            QueryNode::Condition(condition) => self.add_condition(condition),
            QueryNode::BoolCombination(combination) => {
                for child in combination.children() {
                    self.add_node(child);
                }
            }
        }
    }
}

/// Inspects a parsed query.
pub fn inspect(query: &ContactQuery<'_>) -> Inspection {
    let mut inspection = Inspection::default();
    inspection.add_node(query.root());
    inspection
}

impl ContactQuery<'_> {
    /// Inspects this query. See [`inspect`].
    pub fn inspect(&self) -> Inspection {
        inspect(self)
    }
}
