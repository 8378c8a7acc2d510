use super::{mismatch, Mapping};
use crate::error::MappingError;
use crate::model::attribute::{AttributeValue, RawAttribute, SourceWorkItem};
use crate::model::document::{fields, Document, FieldValue};

const PRIORITIES: &[(&str, &str)] = &[
    ("priority.literal.l01", "Unassigned"),
    ("priority.literal.l02", "Low"),
    ("priority.literal.l07", "Medium"),
    ("priority.literal.l11", "High"),
];

const SEVERITIES: &[(&str, &str)] = &[
    ("severity.literal.l1", "Unclassified"),
    ("severity.literal.l2", "Minor"),
    ("severity.literal.l3", "Normal"),
    ("severity.literal.l4", "Major"),
    ("severity.literal.l5", "Critical"),
    ("severity.literal.l6", "Blocker"),
];

// Task/defect workflow states are plain numbers, plan item workflows use ids.
const STATES: &[(&str, &str)] = &[
    ("1", "New"),
    ("2", "In Progress"),
    ("3", "Done"),
    ("4", "Invalid"),
    ("6", "Reopened"),
    ("com.ibm.team.apt.story.idea", "New"),
    ("com.ibm.team.apt.story.defined", "Defined"),
    ("com.ibm.team.apt.story.tested", "Implemented"),
    ("com.ibm.team.apt.story.verified", "Done"),
    ("com.ibm.team.apt.storyWorkflow.state.s1", "In Progress"),
    ("com.ibm.team.apt.storyWorkflow.state.s2", "Invalid"),
    ("com.ibm.team.apt.epic.workflow.state.s1", "New"),
    ("com.ibm.team.apt.epic.workflow.state.s2", "In Progress"),
    ("com.ibm.team.apt.epic.workflow.state.s3", "Done"),
    ("com.ibm.team.apt.epic.workflow.state.s5", "Invalid"),
];

const RESOLUTIONS: &[(&str, &str)] = &[
    ("1", "Fixed"),
    ("2", "Duplicate"),
    ("3", "Won't Fix"),
    ("4", "Works for Me"),
    ("5", "Invalid"),
    ("6", "Later"),
    ("com.ibm.team.apt.story.resolution.r1", "Done"),
    ("com.ibm.team.apt.story.resolution.r2", "Duplicate"),
    ("com.ibm.team.apt.story.resolution.r3", "Invalid"),
];

/// Translates a source enumeration literal into the target vocabulary.
/// Unknown literals are reported and skipped.
pub struct EnumMapping {
    field: &'static str,
    table: &'static [(&'static str, &'static str)],
    work_item: String,
    value: Option<&'static str>,
}

impl EnumMapping {
    pub fn new(field: &'static str, table: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            field,
            table,
            work_item: String::new(),
            value: None,
        }
    }

    pub fn priority() -> Self {
        Self::new(fields::PRIORITY, PRIORITIES)
    }

    pub fn severity() -> Self {
        Self::new(fields::SEVERITY, SEVERITIES)
    }

    pub fn state() -> Self {
        Self::new(fields::STATE, STATES)
    }

    pub fn resolution() -> Self {
        Self::new(fields::RESOLUTION, RESOLUTIONS)
    }

    fn translate(&self, code: &str) -> Option<&'static str> {
        self.table
            .iter()
            .find(|(literal, _)| *literal == code)
            .map(|(_, term)| *term)
    }
}

impl Mapping for EnumMapping {
    fn before_work_item(&mut self, item: &SourceWorkItem) {
        self.work_item = item.id.clone();
        self.value = None;
    }

    fn accept_attribute(&mut self, attribute: &RawAttribute) -> Result<(), MappingError> {
        let code = match &attribute.value {
            AttributeValue::Null => return Ok(()),
            AttributeValue::String(code) => code,
            _ => return Err(mismatch(attribute, "enumeration literal")),
        };
        match self.translate(code) {
            Some(term) => self.value = Some(term),
            None => tracing::warn!(
                work_item = %self.work_item,
                attribute = %attribute.identifier,
                literal = %code,
                "Unknown enumeration value, field left unset"
            ),
        }
        Ok(())
    }

    fn after_work_item(&mut self, doc: &mut Document) {
        if let Some(term) = self.value.take() {
            doc.set(self.field, FieldValue::Text(term.to_string()));
        }
    }
}
