use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::document::Document;

/// Durable store of normalized documents keyed by work item id.
pub trait DocumentStore: Send {
    fn get(&self, id: &str) -> Result<Option<Document>>;
    fn put(&mut self, doc: Document) -> Result<()>;
    fn documents(&self) -> Box<dyn Iterator<Item = &Document> + '_>;

    fn select<'a>(
        &'a self,
        predicate: &'a dyn Fn(&Document) -> bool,
    ) -> Box<dyn Iterator<Item = &'a Document> + 'a> {
        Box::new(self.documents().filter(move |doc| predicate(*doc)))
    }

    /// Applies `f` to the stored document and persists it. Returns false if absent.
    fn update(&mut self, id: &str, f: &mut dyn FnMut(&mut Document)) -> Result<bool> {
        match self.get(id)? {
            Some(mut doc) => {
                f(&mut doc);
                self.put(doc)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    documents: BTreeMap<String, Document>,
}

/// Single JSON file, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    data: StoreData,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Corrupt document store {}", path.display()))?
        } else {
            StoreData::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.documents.len()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.data.documents.get(id).cloned())
    }

    fn put(&mut self, doc: Document) -> Result<()> {
        self.data.documents.insert(doc.id().to_string(), doc);
        self.save()
    }

    fn documents(&self) -> Box<dyn Iterator<Item = &Document> + '_> {
        Box::new(self.data.documents.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::{fields, FieldValue};

    fn doc(id: &str, summary: &str) -> Document {
        let mut doc = Document::new(id);
        doc.set(fields::SUMMARY, FieldValue::Text(summary.into()));
        doc
    }

    #[test]
    fn put_then_reopen_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("documents.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.put(doc("7", "Fix login bug")).unwrap();
        drop(store);

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        let loaded = store.get("7").unwrap().unwrap();
        assert_eq!(loaded.text(fields::SUMMARY), Some("Fix login bug"));
        assert!(store.get("8").unwrap().is_none());
    }

    #[test]
    fn put_replaces_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("docs.json")).unwrap();
        store.put(doc("1", "old")).unwrap();
        store.put(doc("1", "new")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("1").unwrap().unwrap().text(fields::SUMMARY),
            Some("new")
        );
    }

    #[test]
    fn select_filters_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("docs.json")).unwrap();
        store.put(doc("1", "a")).unwrap();
        let mut linked = doc("2", "b");
        linked.set_link(fields::GITHUB_LINK, 5);
        store.put(linked).unwrap();

        let not_exported = |d: &Document| d.link(fields::GITHUB_LINK).is_none();
        let ids: Vec<&str> = store.select(&not_exported).map(|d| d.id()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn update_persists_and_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.put(doc("3", "c")).unwrap();

        let updated = store
            .update("3", &mut |d| d.set_link(fields::JIRA_LINK, 10001))
            .unwrap();
        assert!(updated);
        assert!(!store.update("404", &mut |_| {}).unwrap());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("3").unwrap().unwrap().link(fields::JIRA_LINK),
            Some(10001)
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
