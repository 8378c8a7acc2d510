use std::collections::BTreeSet;

use super::Mapping;
use crate::error::MappingError;
use crate::model::attribute::{RawAttribute, SourceWorkItem};
use crate::model::document::Document;

/// Drops the attribute.
pub struct NullMapping;

impl Mapping for NullMapping {
    fn accept_attribute(&mut self, _attribute: &RawAttribute) -> Result<(), MappingError> {
        Ok(())
    }
}

/// Fallback for attributes without a registered strategy. Warns once per
/// identifier and work item, never writes anything.
#[derive(Default)]
pub struct MissingMapping {
    work_item: String,
    unknown: BTreeSet<String>,
}

impl Mapping for MissingMapping {
    fn before_work_item(&mut self, item: &SourceWorkItem) {
        self.work_item = item.id.clone();
        self.unknown.clear();
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        if self.unknown.insert(attribute.identifier.clone()) {
            tracing::warn!(
                work_item = %self.work_item,
                attribute = %attribute.identifier,
                "No mapping registered for attribute, ignoring"
            );
        }
        Ok(())
    }

    fn after_work_item(&mut self, _doc: &mut Document) {
        if !self.unknown.is_empty() {
            tracing::debug!(
                work_item = %self.work_item,
                count = self.unknown.len(),
                "Unmapped attributes skipped"
            );
        }
    }
}
