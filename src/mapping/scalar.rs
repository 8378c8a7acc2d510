use chrono::{DateTime, Utc};

use super::{mismatch, Mapping};
use crate::error::MappingError;
use crate::model::attribute::{AttributeValue, RawAttribute, SourceWorkItem};
use crate::model::document::{Document, FieldValue};

/// Copies a string attribute into a document field.
pub struct StringMapping {
    field: &'static str,
    value: Option<String>,
}

impl StringMapping {
    pub fn new(field: &'static str) -> Self {
        Self { field, value: None }
    }
}

impl Mapping for StringMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::String(s) => {
                self.value = Some(s.clone());
                Ok(())
            }
            _ => Err(mismatch(attribute, "string")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(value) = self.value.take() {
            doc.set(self.field, FieldValue::Text(value));
        }
    }
}

/// Copies a timestamp attribute, keeping full precision.
pub struct TimestampMapping {
    field: &'static str,
    value: Option<i64>,
}

impl TimestampMapping {
    pub fn new(field: &'static str) -> Self {
        Self { field, value: None }
    }
}

impl Mapping for TimestampMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::Timestamp(t) => {
                self.value = Some(t);
                Ok(())
            }
            _ => Err(mismatch(attribute, "timestamp")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(value) = self.value.take() {
            doc.set(self.field, FieldValue::Timestamp(value));
        }
    }
}

/// Reduces a timestamp attribute to its UTC calendar day (`YYYY-MM-DD`).
pub struct DateMapping {
    field: &'static str,
    value: Option<String>,
}

impl DateMapping {
    pub fn new(field: &'static str) -> Self {
        Self { field, value: None }
    }
}

impl Mapping for DateMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::Timestamp(millis) => {
                let day = DateTime::<Utc>::from_timestamp_millis(millis)
                    .ok_or_else(|| mismatch(attribute, "timestamp in range"))?;
                self.value = Some(day.format("%Y-%m-%d").to_string());
                Ok(())
            }
            _ => Err(mismatch(attribute, "timestamp")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(value) = self.value.take() {
            doc.set(self.field, FieldValue::Text(value));
        }
    }
}

pub struct BooleanMapping {
    field: &'static str,
    value: Option<bool>,
}

impl BooleanMapping {
    pub fn new(field: &'static str) -> Self {
        Self { field, value: None }
    }
}

impl Mapping for BooleanMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::Boolean(b) => {
                self.value = Some(b);
                Ok(())
            }
            _ => Err(mismatch(attribute, "boolean")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(value) = self.value.take() {
            doc.set(self.field, FieldValue::Boolean(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mapping: &mut dyn Mapping, value: AttributeValue) -> Result<Document, MappingError> {
        mapping.before_work_item(&SourceWorkItem {
            id: "1".into(),
            attributes: vec![],
        });
        mapping.accept_attribute(&RawAttribute::new("attr", value))?;
        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        Ok(doc)
    }

    #[test]
    fn string_mapping_copies_value() {
        let doc = run(
            &mut StringMapping::new("summary"),
            AttributeValue::String("Hello".into()),
        )
        .unwrap();
        assert_eq!(doc.text("summary"), Some("Hello"));
    }

    #[test]
    fn null_values_leave_field_unset() {
        let doc = run(&mut StringMapping::new("summary"), AttributeValue::Null).unwrap();
        assert!(!doc.contains("summary"));
        let doc = run(&mut BooleanMapping::new("archived"), AttributeValue::Null).unwrap();
        assert!(!doc.contains("archived"));
    }

    #[test]
    fn date_mapping_truncates_to_day() {
        // 2015-03-14T15:09:26Z
        let doc = run(
            &mut DateMapping::new("dueDate"),
            AttributeValue::Timestamp(1_426_345_766_000),
        )
        .unwrap();
        assert_eq!(doc.text("dueDate"), Some("2015-03-14"));
    }

    #[test]
    fn boolean_rejects_strings() {
        let err = run(
            &mut BooleanMapping::new("archived"),
            AttributeValue::String("true".into()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn timestamp_rejects_numbers() {
        assert!(run(
            &mut TimestampMapping::new("modified"),
            AttributeValue::Number(1.0)
        )
        .is_err());
    }

    #[test]
    fn last_value_wins_for_repeated_scalar() {
        let mut mapping = StringMapping::new("summary");
        mapping.before_work_item(&SourceWorkItem {
            id: "1".into(),
            attributes: vec![],
        });
        mapping
            .accept_attribute(&RawAttribute::new("summary", AttributeValue::String("a".into())))
            .unwrap();
        mapping
            .accept_attribute(&RawAttribute::new("summary", AttributeValue::String("b".into())))
            .unwrap();
        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        assert_eq!(doc.text("summary"), Some("b"));
    }
}
