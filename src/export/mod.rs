//! Export of normalized documents into a target tracker.
//!
//! Each document ends up with at most one remote issue. Lookup order:
//! the recorded back-link, then a label-filtered search matching the
//! `"<id>:"` title prefix, and only then creation.

use rand::Rng;

use crate::error::ExportError;
use crate::model::document::{fields, Document};
use crate::model::issue::{Issue, Label};
use crate::store::DocumentStore;
use crate::trackers::TrackerClient;

const TYPE_LABELS: &[(&str, &str)] = &[
    ("task", "Task"),
    ("com.ibm.team.apt.workItemType.story", "Story"),
    ("com.ibm.team.apt.workItemType.epic", "Epic"),
    ("com.ibm.team.workitem.workItemType.businessneed", "Business Need"),
];

pub fn label_for_type(work_item_type: &str) -> Option<&'static str> {
    TYPE_LABELS
        .iter()
        .find(|(ty, _)| *ty == work_item_type)
        .map(|(_, label)| *label)
}

/// Target issue for a document. Labels carry names only; colors are
/// filled in when the label is resolved on the tracker.
pub fn issue_from_document(doc: &Document) -> Issue {
    let mut labels = Vec::new();
    if let Some(ty) = doc.text(fields::WORK_ITEM_TYPE) {
        match label_for_type(ty) {
            Some(name) => labels.push(Label {
                name: name.to_string(),
                color: String::new(),
            }),
            None => tracing::warn!(
                work_item = %doc.id(),
                work_item_type = %ty,
                "Cannot create label for unknown work item type"
            ),
        }
    }

    Issue {
        number: 0,
        title: format!("{}: {}", doc.id(), doc.text(fields::SUMMARY).unwrap_or_default()),
        body: doc.text(fields::DESCRIPTION).map(String::from),
        labels,
    }
}

/// Uniformly sampled 24-bit RGB as six lowercase hex digits.
pub fn random_color() -> String {
    let color: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
    format!("{color:06x}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The document already carried a back-link and the issue exists.
    Linked(u64),
    /// No back-link, but an issue with a matching title was found.
    Discovered(u64),
    Created(u64),
}

impl ExportOutcome {
    pub fn remote_id(&self) -> u64 {
        match *self {
            ExportOutcome::Linked(n) | ExportOutcome::Discovered(n) | ExportOutcome::Created(n) => n,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub linked: usize,
    pub discovered: usize,
    pub created: usize,
    pub failed: Vec<String>,
}

pub struct IssueExporter {
    client: Box<dyn TrackerClient>,
}

impl IssueExporter {
    pub fn new(client: Box<dyn TrackerClient>) -> Self {
        Self { client }
    }

    pub fn name(&self) -> &str {
        self.client.name()
    }

    /// Pre-flight check; an unreachable tracker skips the whole export.
    pub async fn is_configured(&self) -> Result<(), ExportError> {
        self.client
            .check_access()
            .await
            .map_err(|e| ExportError::NotConfigured {
                tracker: self.name().to_string(),
                reason: format!("{e:#}"),
            })
    }

    /// Exports every stored document. A failing item is reported and skipped.
    pub async fn export(&self, store: &mut dyn DocumentStore) -> ExportReport {
        let docs: Vec<Document> = store.documents().cloned().collect();
        tracing::info!(tracker = %self.name(), count = docs.len(), "Exporting documents");

        let mut report = ExportReport::default();
        for doc in &docs {
            match self.export_one(doc, store).await {
                Ok(ExportOutcome::Linked(_)) => report.linked += 1,
                Ok(ExportOutcome::Discovered(_)) => report.discovered += 1,
                Ok(ExportOutcome::Created(_)) => report.created += 1,
                Err(e) => {
                    tracing::error!(tracker = %self.name(), error = %e, "Export failed");
                    report.failed.push(doc.id().to_string());
                }
            }
        }
        report
    }

    pub async fn export_one(
        &self,
        doc: &Document,
        store: &mut dyn DocumentStore,
    ) -> Result<ExportOutcome, ExportError> {
        let id = doc.id();
        let draft = issue_from_document(doc);
        let link_field = self.client.link_field();

        let outcome = match doc.link(link_field) {
            Some(number) => {
                self.client
                    .get_issue(number)
                    .await
                    .map_err(|e| remote(id, "get issue", e))?;
                ExportOutcome::Linked(number)
            }
            None => match self.find_existing(id, &draft).await? {
                Some(existing) => {
                    tracing::info!(
                        tracker = %self.name(),
                        work_item = %id,
                        issue = existing.number,
                        "Found previously exported issue"
                    );
                    ExportOutcome::Discovered(existing.number)
                }
                None => {
                    let created = self.create(id, draft).await?;
                    tracing::info!(
                        tracker = %self.name(),
                        work_item = %id,
                        issue = created.number,
                        "Created issue"
                    );
                    ExportOutcome::Created(created.number)
                }
            },
        };

        if !matches!(outcome, ExportOutcome::Linked(_)) {
            let number = outcome.remote_id();
            let found = store
                .update(id, &mut |d: &mut Document| d.set_link(link_field, number))
                .map_err(|source| ExportError::Store {
                    work_item: id.to_string(),
                    source,
                })?;
            if !found {
                tracing::warn!(work_item = %id, "Document not in store, back-link not recorded");
            }
        }
        Ok(outcome)
    }

    async fn find_existing(&self, id: &str, draft: &Issue) -> Result<Option<Issue>, ExportError> {
        let prefix = format!("{id}:");
        let candidates = self
            .client
            .search_issues(&draft.label_names())
            .await
            .map_err(|e| remote(id, "search issues", e))?;
        Ok(candidates.into_iter().find(|i| i.title.starts_with(&prefix)))
    }

    async fn create(&self, id: &str, draft: Issue) -> Result<Issue, ExportError> {
        let mut labels = Vec::with_capacity(draft.labels.len());
        for label in &draft.labels {
            let resolved = self
                .resolve_label(&label.name)
                .await
                .map_err(|e| remote(id, "resolve label", e))?;
            labels.push(resolved);
        }
        let issue = Issue { labels, ..draft };
        self.client
            .create_issue(&issue)
            .await
            .map_err(|e| remote(id, "create issue", e))
    }

    /// Existing label matching `name` case-insensitively, created on first use.
    /// Matching uses the tracker's own spelling of `name`.
    pub async fn resolve_label(&self, name: &str) -> anyhow::Result<Label> {
        let wanted = self.client.normalize_label(name);
        let existing = self.client.list_labels().await?;
        if let Some(label) = existing.into_iter().find(|l| l.matches(&wanted)) {
            return Ok(label);
        }
        let label = Label {
            name: wanted,
            color: random_color(),
        };
        tracing::info!(tracker = %self.name(), label = %label.name, color = %label.color, "Creating label");
        self.client.create_label(&label).await
    }
}

fn remote(work_item: &str, operation: &'static str, source: anyhow::Error) -> ExportError {
    ExportError::Remote {
        work_item: work_item.to_string(),
        operation,
        source,
    }
}
