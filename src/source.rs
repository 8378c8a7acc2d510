use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::model::attribute::SourceWorkItem;

/// Read-only view of the source repository.
pub trait SourceRepository {
    fn list_work_items(&self) -> Result<Vec<SourceWorkItem>>;

    fn list_attribute_identifiers(&self, item: &SourceWorkItem) -> BTreeSet<String> {
        item.attributes
            .iter()
            .map(|a| a.identifier.clone())
            .collect()
    }
}

/// Work items extracted from RTC into a JSON array.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SourceRepository for JsonFileSource {
    fn list_work_items(&self) -> Result<Vec<SourceWorkItem>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read work items from {}", self.path.display()))?;
        let items: Vec<SourceWorkItem> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(items)
    }
}
