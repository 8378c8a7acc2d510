//! Attribute mapping: one strategy per source attribute identifier, with a
//! fallback for identifiers nobody registered.

pub mod accumulate;
pub mod basic;
pub mod collection;
pub mod enumeration;
pub mod reference;
pub mod scalar;

use std::collections::HashMap;

use crate::error::MappingError;
use crate::model::attribute::{RawAttribute, SourceWorkItem};
use crate::model::document::{fields, Document};

use accumulate::{CustomAttributeMapping, RecordListMapping};
use basic::{MissingMapping, NullMapping};
use collection::{StoryPointsMapping, TagsMapping};
use enumeration::EnumMapping;
use reference::{ReferenceMapping, SubscriptionsMapping};
use scalar::{BooleanMapping, DateMapping, StringMapping, TimestampMapping};

/// Source attribute identifiers as exposed by the RTC attribute model.
pub mod identifiers {
    pub const ID: &str = "id";
    pub const SUMMARY: &str = "summary";
    pub const DESCRIPTION: &str = "description";
    pub const WORK_ITEM_TYPE: &str = "workItemType";
    pub const ACCEPTANCE_CRITERIA: &str = "com.ibm.team.apt.attribute.acceptance";
    pub const MODIFIED: &str = "modified";
    pub const CREATION_DATE: &str = "creationDate";
    pub const COMMENTS: &str = "internalComments";
    pub const PRIORITY: &str = "internalPriority";
    pub const SEVERITY: &str = "internalSeverity";
    pub const OWNER: &str = "owner";
    pub const CREATOR: &str = "creator";
    pub const MODIFIED_BY: &str = "modifiedBy";
    pub const RESOLVER: &str = "resolver";
    pub const DURATION: &str = "duration";
    pub const CORRECTED_ESTIMATE: &str = "correctedEstimate";
    pub const TIME_SPENT: &str = "timeSpent";
    pub const CATEGORY: &str = "category";
    pub const ARCHIVED: &str = "archived";
    pub const CONTEXT_ID: &str = "contextId";
    pub const PROJECT_AREA: &str = "projectArea";
    pub const SEQUENCE_VALUE: &str = "internalSequenceValue";
    pub const TAGS: &str = "internalTags";
    pub const STORY_POINTS: &str = "com.ibm.team.apt.attribute.complexity";
    pub const CUSTOM_ATTRIBUTES: &str = "customAttributes";
    pub const APPROVALS: &str = "internalApprovals";
    pub const APPROVAL_DESCRIPTORS: &str = "internalApprovalDescriptors";
    pub const RESOLUTION: &str = "internalResolution";
    pub const RESOLUTION_DATE: &str = "resolutionDate";
    pub const STATE: &str = "internalState";
    pub const TARGET: &str = "target";
    pub const DUE_DATE: &str = "dueDate";
    pub const SUBSCRIPTIONS: &str = "internalSubscriptions";
    pub const STATE_TRANSITIONS: &str = "internalStateTransitions";
}

/// Transformation logic for a single source attribute.
///
/// Strategies may keep per-work-item state: it is reset in
/// `before_work_item` and flushed into the document in `after_work_item`.
pub trait Mapping: Send {
    fn before_work_item(&mut self, _item: &SourceWorkItem) {}
    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError>;
    fn after_work_item(&mut self, _doc: &mut Document) {}
}

pub(crate) fn mismatch(attribute: &RawAttribute, expected: &'static str) -> MappingError {
    MappingError::TypeMismatch {
        attribute: attribute.identifier.clone(),
        expected,
        found: attribute.value.kind(),
    }
}

/// Dispatch table from attribute identifier to strategy.
///
/// Built once at startup; only strategy-local state changes afterwards.
pub struct MappingRegistry {
    mappings: HashMap<String, Box<dyn Mapping>>,
    missing: MissingMapping,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            missing: MissingMapping::default(),
        }
    }

    /// Registry with the full RTC strategy set.
    pub fn with_defaults() -> Self {
        use identifiers as rtc;

        let mut registry = Self::new();
        for id in [
            rtc::ID,
            rtc::DURATION,
            rtc::CORRECTED_ESTIMATE,
            rtc::TIME_SPENT,
            rtc::CONTEXT_ID,
            rtc::SEQUENCE_VALUE,
            rtc::STATE_TRANSITIONS,
        ] {
            registry.register(id, NullMapping);
        }

        registry.register(rtc::SUMMARY, StringMapping::new(fields::SUMMARY));
        registry.register(rtc::DESCRIPTION, StringMapping::new(fields::DESCRIPTION));
        registry.register(rtc::WORK_ITEM_TYPE, StringMapping::new(fields::WORK_ITEM_TYPE));
        registry.register(
            rtc::ACCEPTANCE_CRITERIA,
            StringMapping::new(fields::ACCEPTANCE_CRITERIA),
        );
        registry.register(rtc::MODIFIED, TimestampMapping::new(fields::MODIFIED));
        registry.register(rtc::CREATION_DATE, TimestampMapping::new(fields::CREATION_DATE));
        registry.register(rtc::DUE_DATE, DateMapping::new(fields::DUE_DATE));
        registry.register(rtc::RESOLUTION_DATE, DateMapping::new(fields::RESOLUTION_DATE));
        registry.register(rtc::ARCHIVED, BooleanMapping::new(fields::ARCHIVED));

        registry.register(rtc::PRIORITY, EnumMapping::priority());
        registry.register(rtc::SEVERITY, EnumMapping::severity());
        registry.register(rtc::STATE, EnumMapping::state());
        registry.register(rtc::RESOLUTION, EnumMapping::resolution());

        registry.register(rtc::OWNER, ReferenceMapping::contributor(fields::OWNER));
        registry.register(rtc::CREATOR, ReferenceMapping::contributor(fields::CREATOR));
        registry.register(rtc::MODIFIED_BY, ReferenceMapping::contributor(fields::MODIFIED_BY));
        registry.register(rtc::RESOLVER, ReferenceMapping::contributor(fields::RESOLVER));
        registry.register(rtc::CATEGORY, ReferenceMapping::category());
        registry.register(rtc::PROJECT_AREA, ReferenceMapping::project_area());
        registry.register(rtc::TARGET, ReferenceMapping::target());
        registry.register(rtc::SUBSCRIPTIONS, SubscriptionsMapping::default());

        registry.register(rtc::COMMENTS, RecordListMapping::new(fields::COMMENTS));
        registry.register(rtc::APPROVALS, RecordListMapping::new(fields::APPROVALS));
        registry.register(
            rtc::APPROVAL_DESCRIPTORS,
            RecordListMapping::new(fields::APPROVAL_DESCRIPTORS),
        );
        registry.register(rtc::CUSTOM_ATTRIBUTES, CustomAttributeMapping::default());

        registry.register(rtc::TAGS, TagsMapping::default());
        registry.register(rtc::STORY_POINTS, StoryPointsMapping::default());

        registry
    }

    /// Inserts or replaces the strategy for `identifier`.
    pub fn register(&mut self, identifier: &str, mapping: impl Mapping + 'static) {
        self.mappings.insert(identifier.to_string(), Box::new(mapping));
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.mappings.contains_key(identifier)
    }

    pub fn before_work_item(&mut self, item: &SourceWorkItem) {
        self.missing.before_work_item(item);
        for mapping in self.mappings.values_mut() {
            mapping.before_work_item(item);
        }
    }

    pub fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        match self.mappings.get_mut(&attribute.identifier) {
            Some(mapping) => mapping.accept_attribute(attribute),
            None => self.missing.accept_attribute(attribute),
        }
    }

    pub fn after_work_item(&mut self, doc: &mut Document) {
        self.missing.after_work_item(doc);
        for mapping in self.mappings.values_mut() {
            mapping.after_work_item(doc);
        }
    }

    /// Runs the full lifecycle for one work item and returns its document.
    pub fn map_work_item(&mut self, item: &SourceWorkItem) -> Result<Document, MappingError> {
        self.before_work_item(item);
        for attribute in &item.attributes {
            self.accept_attribute(attribute)?;
        }
        let mut doc = Document::new(item.id.clone());
        self.after_work_item(&mut doc);
        Ok(doc)
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
