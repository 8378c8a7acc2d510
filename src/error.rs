use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("attribute {attribute}: expected {expected} value, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{tracker} is not configured: {reason}")]
    NotConfigured { tracker: String, reason: String },

    #[error("work item {work_item}: {operation} failed: {source:#}")]
    Remote {
        work_item: String,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("work item {work_item}: failed to record back-link: {source:#}")]
    Store {
        work_item: String,
        #[source]
        source: anyhow::Error,
    },
}
