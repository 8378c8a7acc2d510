use std::collections::BTreeSet;

use super::{mismatch, Mapping};
use crate::error::MappingError;
use crate::model::attribute::{AttributeValue, RawAttribute, SourceWorkItem};
use crate::model::document::{fields, Document, FieldValue};

/// Tags arrive either as one comma separated string or as a list of strings.
#[derive(Default)]
pub struct TagsMapping {
    tags: BTreeSet<String>,
}

impl TagsMapping {
    fn add(&mut self, raw: &str) {
        self.tags.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
        );
    }
}

impl Mapping for TagsMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.tags.clear();
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => {}
            AttributeValue::String(raw) => self.add(raw),
            AttributeValue::List(entries) => {
                for entry in entries {
                    match entry {
                        AttributeValue::String(raw) => self.add(raw),
                        _ => return Err(mismatch(attribute, "list of strings")),
                    }
                }
            }
            _ => return Err(mismatch(attribute, "string or list of strings")),
        }
        Ok(())
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if !self.tags.is_empty() {
            doc.set(fields::TAGS, FieldValue::Set(std::mem::take(&mut self.tags)));
        }
    }
}

/// Story points come as a number or as a complexity literal whose name is numeric.
#[derive(Default)]
pub struct StoryPointsMapping {
    work_item: String,
    points: Option<f64>,
}

impl Mapping for StoryPointsMapping {
    fn before_work_item(&mut self, item: &SourceWorkItem) {
        self.work_item = item.id.clone();
        self.points = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => {}
            AttributeValue::Number(n) if n.is_finite() => self.points = Some(*n),
            AttributeValue::String(literal) => match literal.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => self.points = Some(n),
                _ => tracing::warn!(
                    work_item = %self.work_item,
                    literal = %literal,
                    "Unknown story point value, field left unset"
                ),
            },
            _ => return Err(mismatch(attribute, "number")),
        }
        Ok(())
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(points) = self.points.take() {
            doc.set(fields::STORY_POINTS, FieldValue::Number(points));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(mapping: &mut dyn Mapping, values: Vec<AttributeValue>) -> Result<Document, MappingError> {
        mapping.before_work_item(&SourceWorkItem {
            id: "1".into(),
            attributes: vec![],
        });
        for value in values {
            mapping.accept_attribute(&RawAttribute::new("attr", value))?;
        }
        let mut doc = Document::new("1");
        mapping.after_work_item(&mut doc);
        Ok(doc)
    }

    #[test]
    fn tags_split_and_dedupe() {
        let doc = map(
            &mut TagsMapping::default(),
            vec![
                AttributeValue::String("ui, backend,,ui ".into()),
                AttributeValue::List(vec![AttributeValue::String("release".into())]),
            ],
        )
        .unwrap();
        let expected: BTreeSet<String> = ["backend", "release", "ui"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(doc.get(fields::TAGS), Some(&FieldValue::Set(expected)));
    }

    #[test]
    fn blank_tags_write_nothing() {
        let doc = map(
            &mut TagsMapping::default(),
            vec![AttributeValue::String(" , ".into())],
        )
        .unwrap();
        assert!(!doc.contains(fields::TAGS));
    }

    #[test]
    fn story_points_from_number_and_literal() {
        let doc = map(
            &mut StoryPointsMapping::default(),
            vec![AttributeValue::Number(8.0)],
        )
        .unwrap();
        assert_eq!(doc.get(fields::STORY_POINTS), Some(&FieldValue::Number(8.0)));

        let doc = map(
            &mut StoryPointsMapping::default(),
            vec![AttributeValue::String("13".into())],
        )
        .unwrap();
        assert_eq!(doc.get(fields::STORY_POINTS), Some(&FieldValue::Number(13.0)));
    }

    #[test]
    fn non_numeric_literal_is_skipped() {
        let doc = map(
            &mut StoryPointsMapping::default(),
            vec![AttributeValue::String("huge".into())],
        )
        .unwrap();
        assert!(!doc.contains(fields::STORY_POINTS));
    }

    #[test]
    fn story_points_reject_booleans() {
        assert!(map(
            &mut StoryPointsMapping::default(),
            vec![AttributeValue::Boolean(true)]
        )
        .is_err());
    }
}
