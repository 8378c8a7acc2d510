use anyhow::{Context, Result};
use std::collections::BTreeSet;

use crate::mapping::MappingRegistry;
use crate::source::SourceRepository;
use crate::store::DocumentStore;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: Vec<String>,
}

/// Maps every source work item through the registry and persists the result.
///
/// A work item whose attributes fail to map is reported and skipped; the
/// document already stored for it, if any, is left as it was.
pub fn import_all(
    source: &dyn SourceRepository,
    registry: &mut MappingRegistry,
    store: &mut dyn DocumentStore,
) -> Result<ImportReport> {
    let items = source.list_work_items()?;
    tracing::info!(count = items.len(), "Transforming work items");

    let mut report = ImportReport::default();
    for item in &items {
        let mut doc = match registry.map_work_item(item) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(work_item = %item.id, error = %e, "Mapping failed, work item skipped");
                report.failed.push(item.id.clone());
                continue;
            }
        };

        if let Some(previous) = store.get(&item.id)? {
            doc.carry_links_from(&previous);
        }
        store
            .put(doc)
            .with_context(|| format!("Failed to store work item {}", item.id))?;
        tracing::debug!(work_item = %item.id, "Stored normalized document");
        report.imported += 1;
    }

    Ok(report)
}

/// Source attribute identifiers that have no registered mapping.
pub fn unmapped_attributes(
    source: &dyn SourceRepository,
    registry: &MappingRegistry,
) -> Result<BTreeSet<String>> {
    let mut unmapped = BTreeSet::new();
    for item in source.list_work_items()? {
        for identifier in source.list_attribute_identifiers(&item) {
            if !registry.is_registered(&identifier) {
                unmapped.insert(identifier);
            }
        }
    }
    Ok(unmapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::identifiers;
    use crate::model::attribute::{AttributeValue, RawAttribute, SourceWorkItem};
    use crate::model::document::fields;
    use crate::store::JsonFileStore;

    struct FixedSource(Vec<SourceWorkItem>);

    impl SourceRepository for FixedSource {
        fn list_work_items(&self) -> Result<Vec<SourceWorkItem>> {
            Ok(self.0.clone())
        }
    }

    fn work_item(id: &str, attributes: Vec<RawAttribute>) -> SourceWorkItem {
        SourceWorkItem {
            id: id.into(),
            attributes,
        }
    }

    fn summary(text: &str) -> RawAttribute {
        RawAttribute::new(identifiers::SUMMARY, AttributeValue::String(text.into()))
    }

    #[test]
    fn imports_and_reports_failures_without_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("docs.json")).unwrap();
        let source = FixedSource(vec![
            work_item("1", vec![summary("ok")]),
            work_item(
                "2",
                vec![RawAttribute::new(
                    identifiers::ARCHIVED,
                    AttributeValue::String("nope".into()),
                )],
            ),
            work_item(
                "3",
                vec![summary("also ok"), summary("still ok")],
            ),
        ]);

        let report = import_all(&source, &mut MappingRegistry::with_defaults(), &mut store).unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.failed, vec!["2".to_string()]);
        assert!(store.get("2").unwrap().is_none());
        assert_eq!(
            store.get("3").unwrap().unwrap().text(fields::SUMMARY),
            Some("still ok")
        );
    }

    #[test]
    fn reimport_keeps_back_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("docs.json")).unwrap();
        let mut registry = MappingRegistry::with_defaults();

        let source = FixedSource(vec![work_item("7", vec![summary("before")])]);
        import_all(&source, &mut registry, &mut store).unwrap();
        store
            .update("7", &mut |d| d.set_link(fields::GITHUB_LINK, 99))
            .unwrap();

        let source = FixedSource(vec![work_item("7", vec![summary("after")])]);
        import_all(&source, &mut registry, &mut store).unwrap();

        let doc = store.get("7").unwrap().unwrap();
        assert_eq!(doc.text(fields::SUMMARY), Some("after"));
        assert_eq!(doc.link(fields::GITHUB_LINK), Some(99));
    }

    #[test]
    fn failed_remap_leaves_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("docs.json")).unwrap();
        let mut registry = MappingRegistry::with_defaults();

        import_all(
            &FixedSource(vec![work_item("4", vec![summary("good")])]),
            &mut registry,
            &mut store,
        )
        .unwrap();
        let report = import_all(
            &FixedSource(vec![work_item(
                "4",
                vec![RawAttribute::new(identifiers::SUMMARY, AttributeValue::Boolean(true))],
            )]),
            &mut registry,
            &mut store,
        )
        .unwrap();

        assert_eq!(report.failed, vec!["4".to_string()]);
        assert_eq!(
            store.get("4").unwrap().unwrap().text(fields::SUMMARY),
            Some("good")
        );
    }

    #[test]
    fn lists_unmapped_identifiers() {
        let source = FixedSource(vec![work_item(
            "1",
            vec![
                summary("x"),
                RawAttribute::new("com.acme.risk", AttributeValue::Null),
            ],
        )]);
        let unmapped = unmapped_attributes(&source, &MappingRegistry::with_defaults()).unwrap();
        assert_eq!(
            unmapped.into_iter().collect::<Vec<_>>(),
            vec!["com.acme.risk".to_string()]
        );
    }
}
