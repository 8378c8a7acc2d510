use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::attribute::AttributeValue;

/// Field vocabulary of the normalized document.
pub mod fields {
    pub const ID: &str = "id";
    pub const SUMMARY: &str = "summary";
    pub const DESCRIPTION: &str = "description";
    pub const WORK_ITEM_TYPE: &str = "workItemType";
    pub const ACCEPTANCE_CRITERIA: &str = "acceptanceCriteria";
    pub const MODIFIED: &str = "modified";
    pub const CREATION_DATE: &str = "creationDate";
    pub const DUE_DATE: &str = "dueDate";
    pub const RESOLUTION_DATE: &str = "resolutionDate";
    pub const ARCHIVED: &str = "archived";
    pub const PRIORITY: &str = "priority";
    pub const SEVERITY: &str = "severity";
    pub const STATE: &str = "state";
    pub const RESOLUTION: &str = "resolution";
    pub const OWNER: &str = "owner";
    pub const CREATOR: &str = "creator";
    pub const MODIFIED_BY: &str = "modifiedBy";
    pub const RESOLVER: &str = "resolver";
    pub const CATEGORY: &str = "category";
    pub const PROJECT_AREA: &str = "projectArea";
    pub const TARGET: &str = "target";
    pub const COMMENTS: &str = "comments";
    pub const APPROVALS: &str = "approvals";
    pub const APPROVAL_DESCRIPTORS: &str = "approvalDescriptors";
    pub const TAGS: &str = "tags";
    pub const STORY_POINTS: &str = "storyPoints";
    pub const CUSTOM_ATTRIBUTES: &str = "customAttributes";
    pub const SUBSCRIPTIONS: &str = "subscriptions";

    pub const GITHUB_LINK: &str = "githubLink";
    pub const JIRA_LINK: &str = "jiraLink";

    /// Back-link fields written by exporters. They survive re-transformation.
    pub const LINK_FIELDS: [&str; 2] = [GITHUB_LINK, JIRA_LINK];
}

/// Semantic value stored under one document field. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Timestamp(i64),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Set(BTreeSet<String>),
    List(Vec<FieldValue>),
    Document(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Display form of a nested attribute value, used for sub-records
    /// whose exact shape is not interpreted by any strategy.
    pub fn from_attribute(value: &AttributeValue) -> Option<FieldValue> {
        match value {
            AttributeValue::Null => None,
            AttributeValue::String(s) => Some(FieldValue::Text(s.clone())),
            AttributeValue::Timestamp(t) => Some(FieldValue::Timestamp(*t)),
            AttributeValue::Number(n) => Some(FieldValue::Number(*n)),
            AttributeValue::Boolean(b) => Some(FieldValue::Boolean(*b)),
            AttributeValue::Reference(r) => Some(FieldValue::Text(r.display().to_string())),
            AttributeValue::List(items) => Some(FieldValue::List(
                items.iter().filter_map(FieldValue::from_attribute).collect(),
            )),
            AttributeValue::Record(map) => Some(FieldValue::Document(
                map.iter()
                    .filter_map(|(k, v)| FieldValue::from_attribute(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Timestamp(t) => write!(f, "timestamp {t}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Set(items) => {
                let parts: Vec<&str> = items.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            FieldValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FieldValue::Document(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Tracker-agnostic record for one source work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Writes a field. The id is fixed at construction and cannot be overwritten.
    pub fn set(&mut self, field: &str, value: FieldValue) {
        if field == fields::ID {
            tracing::warn!(work_item = %self.id, "Ignoring attempt to overwrite document id");
            return;
        }
        self.fields.insert(field.to_string(), value);
    }

    #[cfg(test)]
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[cfg(test)]
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Remote issue id recorded by a previous export. Zero counts as absent.
    pub fn link(&self, field: &str) -> Option<u64> {
        match self.fields.get(field) {
            Some(FieldValue::Integer(n)) if *n > 0 => Some(*n as u64),
            _ => None,
        }
    }

    pub fn set_link(&mut self, field: &str, remote_id: u64) {
        self.set(field, FieldValue::Integer(remote_id as i64));
    }

    /// Copies back-link fields from a previously stored version of this document.
    pub fn carry_links_from(&mut self, previous: &Document) {
        for field in fields::LINK_FIELDS {
            if self.contains(field) {
                continue;
            }
            if let Some(value) = previous.get(field) {
                self.fields.insert(field.to_string(), value.clone());
            }
        }
    }
}
