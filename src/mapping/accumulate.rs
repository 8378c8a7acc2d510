use std::collections::BTreeMap;

use super::{mismatch, Mapping};
use crate::error::MappingError;
use crate::model::attribute::{AttributeValue, RawAttribute, SourceWorkItem};
use crate::model::document::{fields, Document, FieldValue};

/// Collects repeated sub-records (comments, approvals) into an ordered list.
pub struct RecordListMapping {
    field: &'static str,
    records: Vec<FieldValue>,
}

impl RecordListMapping {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            records: Vec::new(),
        }
    }

    fn push(&mut self, attribute: &RawAttribute, value: &AttributeValue) -> Result<(), MappingError> {
        match value {
            AttributeValue::Record(_) => {
                if let Some(record) = FieldValue::from_attribute(value) {
                    self.records.push(record);
                }
                Ok(())
            }
            _ => Err(mismatch(attribute, "record")),
        }
    }
}

impl Mapping for RecordListMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.records.clear();
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::List(entries) => {
                for entry in entries {
                    self.push(attribute, entry)?;
                }
                Ok(())
            }
            record => self.push(attribute, record),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if !self.records.is_empty() {
            doc.set(self.field, FieldValue::List(std::mem::take(&mut self.records)));
        }
    }
}

/// Gathers project-specific attributes into one nested document.
#[derive(Default)]
pub struct CustomAttributeMapping {
    values: BTreeMap<String, FieldValue>,
}

impl Mapping for CustomAttributeMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.values.clear();
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::Record(entries) => {
                for (name, value) in entries {
                    if let Some(value) = FieldValue::from_attribute(value) {
                        self.values.insert(name.clone(), value);
                    }
                }
                Ok(())
            }
            _ => Err(mismatch(attribute, "record")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if !self.values.is_empty() {
            doc.set(
                fields::CUSTOM_ATTRIBUTES,
                FieldValue::Document(std::mem::take(&mut self.values)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attribute::{Reference, ReferenceKind};

    fn comment(author: &str, text: &str, at: i64) -> AttributeValue {
        AttributeValue::Record(
            [
                (
                    "creator".to_string(),
                    AttributeValue::Reference(Reference {
                        kind: ReferenceKind::Contributor,
                        id: format!("_{author}"),
                        name: Some(author.to_string()),
                    }),
                ),
                ("content".to_string(), AttributeValue::String(text.into())),
                ("creationDate".to_string(), AttributeValue::Timestamp(at)),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn start(mapping: &mut dyn Mapping) {
        mapping.before_work_item(&SourceWorkItem {
            id: "1".into(),
            attributes: vec![],
        });
    }

    #[test]
    fn comments_accumulate_in_order_across_attributes() {
        let mut mapping = RecordListMapping::new(fields::COMMENTS);
        start(&mut mapping);
        mapping
            .accept_attribute(&RawAttribute::new(
                "internalComments",
                AttributeValue::List(vec![comment("Ada", "first", 1), comment("Bob", "second", 2)]),
            ))
            .unwrap();
        mapping
            .accept_attribute(&RawAttribute::new("internalComments", comment("Cy", "third", 3)))
            .unwrap();

        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        let Some(FieldValue::List(comments)) = doc.get(fields::COMMENTS) else {
            panic!("comments missing");
        };
        assert_eq!(comments.len(), 3);
        let FieldValue::Document(first) = &comments[0] else {
            panic!("comment is not a document");
        };
        assert_eq!(first["content"], FieldValue::Text("first".into()));
        assert_eq!(first["creator"], FieldValue::Text("Ada".into()));
        assert_eq!(first["creationDate"], FieldValue::Timestamp(1));
    }

    #[test]
    fn list_of_strings_is_rejected() {
        let mut mapping = RecordListMapping::new(fields::APPROVALS);
        start(&mut mapping);
        let result = mapping.accept_attribute(&RawAttribute::new(
            "internalApprovals",
            AttributeValue::List(vec![AttributeValue::String("yes".into())]),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn custom_attributes_merge_into_document() {
        let mut mapping = CustomAttributeMapping::default();
        start(&mut mapping);
        for (name, value) in [
            ("risk", AttributeValue::String("high".into())),
            ("effort", AttributeValue::Number(3.5)),
        ] {
            mapping
                .accept_attribute(&RawAttribute::new(
                    "customAttributes",
                    AttributeValue::Record([(name.to_string(), value)].into_iter().collect()),
                ))
                .unwrap();
        }
        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        let Some(FieldValue::Document(custom)) = doc.get(fields::CUSTOM_ATTRIBUTES) else {
            panic!("custom attributes missing");
        };
        assert_eq!(custom.len(), 2);
        assert_eq!(custom["effort"], FieldValue::Number(3.5));
    }

    #[test]
    fn nothing_written_without_records() {
        let mut mapping = RecordListMapping::new(fields::COMMENTS);
        start(&mut mapping);
        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        assert!(!doc.contains(fields::COMMENTS));
    }
}
