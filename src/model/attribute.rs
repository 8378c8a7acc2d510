use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One work item as surfaced by the source repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWorkItem {
    pub id: String,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAttribute {
    pub identifier: String,
    #[serde(default)]
    pub value: AttributeValue,
}

#[cfg(test)]
impl RawAttribute {
    pub fn new(identifier: &str, value: AttributeValue) -> Self {
        Self {
            identifier: identifier.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Contributor,
    Category,
    ProjectArea,
    Iteration,
    Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    /// Human readable form: the resolved name when known, the raw id otherwise.
    pub fn display(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Dynamically typed attribute value. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    #[default]
    Null,
    String(String),
    Timestamp(i64),
    Number(f64),
    Boolean(bool),
    Reference(Reference),
    List(Vec<AttributeValue>),
    Record(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::String(_) => "string",
            AttributeValue::Timestamp(_) => "timestamp",
            AttributeValue::Number(_) => "number",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Reference(_) => "reference",
            AttributeValue::List(_) => "list",
            AttributeValue::Record(_) => "record",
        }
    }
}
