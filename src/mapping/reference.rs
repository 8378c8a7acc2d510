use std::collections::BTreeSet;

use super::{mismatch, Mapping};
use crate::error::MappingError;
use crate::model::attribute::{AttributeValue, RawAttribute, ReferenceKind, SourceWorkItem};
use crate::model::document::{fields, Document, FieldValue};

/// Resolves a reference attribute to its display form.
pub struct ReferenceMapping {
    field: &'static str,
    kind: ReferenceKind,
    value: Option<String>,
}

impl ReferenceMapping {
    pub fn new(field: &'static str, kind: ReferenceKind) -> Self {
        Self {
            field,
            kind,
            value: None,
        }
    }

    pub fn contributor(field: &'static str) -> Self {
        Self::new(field, ReferenceKind::Contributor)
    }

    pub fn category() -> Self {
        Self::new(fields::CATEGORY, ReferenceKind::Category)
    }

    pub fn project_area() -> Self {
        Self::new(fields::PROJECT_AREA, ReferenceKind::ProjectArea)
    }

    pub fn target() -> Self {
        Self::new(fields::TARGET, ReferenceKind::Iteration)
    }
}

impl Mapping for ReferenceMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match &attribute.value {
            AttributeValue::Null => Ok(()),
            AttributeValue::Reference(r) if r.kind == self.kind => {
                self.value = Some(r.display().to_string());
                Ok(())
            }
            AttributeValue::Reference(_) => Err(mismatch(attribute, reference_label(self.kind))),
            _ => Err(mismatch(attribute, "reference")),
        }
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(value) = self.value.take() {
            doc.set(self.field, FieldValue::Text(value));
        }
    }
}

fn reference_label(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Contributor => "contributor reference",
        ReferenceKind::Category => "category reference",
        ReferenceKind::ProjectArea => "project area reference",
        ReferenceKind::Iteration => "iteration reference",
        ReferenceKind::Item => "item reference",
    }
}

/// Collects subscribed contributors into a set of display names.
#[derive(Default)]
pub struct SubscriptionsMapping {
    names: BTreeSet<String>,
}

impl Mapping for SubscriptionsMapping {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {
        self.names.clear();
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        let entries = match &attribute.value {
            AttributeValue::Null => return Ok(()),
            AttributeValue::List(entries) => entries,
            _ => return Err(mismatch(attribute, "list of contributor references")),
        };
        for entry in entries {
            match entry {
                AttributeValue::Reference(r) if r.kind == ReferenceKind::Contributor => {
                    self.names.insert(r.display().to_string());
                }
                _ => return Err(mismatch(attribute, "list of contributor references")),
            }
        }
        Ok(())
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if !self.names.is_empty() {
            doc.set(
                fields::SUBSCRIPTIONS,
                FieldValue::Set(std::mem::take(&mut self.names)),
            );
        }
    }
}
