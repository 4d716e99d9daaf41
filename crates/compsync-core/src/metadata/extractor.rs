//! Metadata extraction for local and external components.
//!
//! Every failure here is absorbed: unreadable files and malformed sources are
//! logged with their path and contribute nothing, so one broken component
//! never affects another.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::analyzer::{DeclarationAnalyzer, PropertyTypes, ScriptAnalyzer, SourceAnalyzer};
use super::cache::{CacheKey, CachedMetadata, ExternalMetadataCache};
use super::locate::{self, MetadataFiles};
use super::schema::schema_metadata;
use super::ComponentMetadata;
use crate::registry::ComponentEntry;

/// Extracts [`ComponentMetadata`] using pluggable source analyzers.
pub struct MetadataExtractor {
    script: Arc<dyn SourceAnalyzer>,
    declaration: Arc<dyn SourceAnalyzer>,
    cache: ExternalMetadataCache,
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// Create an extractor with the built-in analyzers.
    pub fn new() -> Self {
        Self::with_analyzers(Arc::new(ScriptAnalyzer), Arc::new(DeclarationAnalyzer))
    }

    pub fn with_analyzers(
        script: Arc<dyn SourceAnalyzer>,
        declaration: Arc<dyn SourceAnalyzer>,
    ) -> Self {
        Self {
            script,
            declaration,
            cache: ExternalMetadataCache::new(),
        }
    }

    pub fn cache(&self) -> &ExternalMetadataCache {
        &self.cache
    }

    /// Metadata for a project component: schema first, behavior source on top.
    pub async fn extract_local(&self, entry: &ComponentEntry) -> ComponentMetadata {
        let mut metadata = schema_metadata(&entry.schema);
        if let Some(types) = analyze_file(self.script.as_ref(), &entry.script_path).await {
            metadata.merge_types(types);
        }
        metadata
    }

    /// Metadata for a package import, cached per `(base_dir, import_path)`.
    ///
    /// `explicit` is the resolver-supplied candidate list, if any; without it
    /// the conventional package layouts are probed.
    pub async fn extract_external(
        &self,
        base_dir: &Path,
        import_path: &str,
        explicit: Option<Vec<PathBuf>>,
    ) -> CachedMetadata {
        let key = CacheKey::new(base_dir, import_path);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let files = match explicit {
            Some(candidates) => MetadataFiles::from_candidates(base_dir, &candidates).await,
            None => locate::locate(base_dir, import_path).await,
        };

        let outcome = if files.is_empty() {
            debug!(import_path, base_dir = %base_dir.display(), "no metadata files found");
            CachedMetadata::Absent
        } else {
            CachedMetadata::Present {
                metadata: self.read_files(&files).await,
                source: files.source().map(Path::to_path_buf),
            }
        };

        self.cache.insert(key, outcome)
    }

    async fn read_files(&self, files: &MetadataFiles) -> ComponentMetadata {
        let mut metadata = ComponentMetadata::default();

        if let Some(path) = &files.schema {
            if let Some(schema) = read_schema(path).await {
                metadata = schema_metadata(&schema);
            }
        }
        if let Some(path) = &files.script {
            if let Some(types) = analyze_file(self.script.as_ref(), path).await {
                metadata.merge_types(types);
            }
        }
        if let Some(path) = &files.declaration {
            if let Some(types) = analyze_file(self.declaration.as_ref(), path).await {
                metadata.merge_types(types);
            }
        }

        metadata
    }
}

async fn read_schema(path: &Path) -> Option<Value> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read component schema");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed component schema");
            None
        }
    }
}

async fn analyze_file(analyzer: &dyn SourceAnalyzer, path: &Path) -> Option<PropertyTypes> {
    let source = match tokio::fs::read_to_string(path).await {
        Ok(source) => source,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read component source");
            return None;
        }
    };
    match analyzer.analyze(&source) {
        Ok(types) => Some(types),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to analyze component source");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AnalyzeError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn local_entry(dir: &Path, schema: Value, script: &str) -> ComponentEntry {
        let base = dir.join("components/counter/counter");
        write(&base.with_extension("ts"), script);
        ComponentEntry {
            script_path: base.with_extension("ts"),
            schema_path: base.with_extension("json"),
            markup_path: base.with_extension("wxml"),
            schema,
        }
    }

    #[tokio::test]
    async fn test_local_source_overrides_schema() {
        let temp = TempDir::new().unwrap();
        let entry = local_entry(
            temp.path(),
            json!({
                "component": true,
                "properties": { "count": { "type": "Number", "description": "How many" } }
            }),
            "Component({ properties: { count: String, extra: Boolean } })",
        );

        let meta = MetadataExtractor::new().extract_local(&entry).await;

        assert_eq!(meta.types.get("count").map(String::as_str), Some("string"));
        assert_eq!(meta.types.get("extra").map(String::as_str), Some("boolean"));
        assert_eq!(meta.docs.get("count").map(String::as_str), Some("How many"));
    }

    #[tokio::test]
    async fn test_local_unreadable_script_keeps_schema() {
        let temp = TempDir::new().unwrap();
        let mut entry = local_entry(
            temp.path(),
            json!({ "component": true, "properties": { "size": "String" } }),
            "",
        );
        entry.script_path = temp.path().join("missing.ts");

        let meta = MetadataExtractor::new().extract_local(&entry).await;
        assert_eq!(meta.types.get("size").map(String::as_str), Some("string"));
    }

    #[tokio::test]
    async fn test_external_declaration_wins() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("node_modules/ui-kit/card");
        write(
            &dir.join("card.json"),
            r#"{ "component": true, "properties": { "title": { "type": "String", "description": "Heading" } } }"#,
        );
        write(
            &dir.join("card.js"),
            "Component({ properties: { title: Number, bordered: Boolean } })",
        );
        write(
            &dir.join("card.d.ts"),
            "export default class Card { properties: { title: { type: StringConstructor; value?: 'a' | 'b' }; }; }",
        );

        let extractor = MetadataExtractor::new();
        let cached = extractor
            .extract_external(temp.path(), "ui-kit/card/card", None)
            .await;
        let meta = cached.metadata();

        assert_eq!(meta.types.get("bordered").map(String::as_str), Some("boolean"));
        assert_eq!(meta.types.get("title").map(String::as_str), Some("'a' | 'b'"));
        assert_eq!(meta.docs.get("title").map(String::as_str), Some("Heading"));
        assert_eq!(cached.source(), Some(dir.join("card.d.ts").as_path()));
    }

    #[tokio::test]
    async fn test_external_absent_is_cached() {
        let temp = TempDir::new().unwrap();
        let extractor = MetadataExtractor::new();

        let first = extractor.extract_external(temp.path(), "ui-kit/none/none", None).await;
        assert_eq!(first, CachedMetadata::Absent);

        // Files appearing later are not picked up: the negative result is permanent.
        write(&temp.path().join("node_modules/ui-kit/none/none.js"), "Component({})");
        let second = extractor.extract_external(temp.path(), "ui-kit/none/none", None).await;
        assert_eq!(second, CachedMetadata::Absent);
        assert_eq!(extractor.cache().len(), 1);
    }

    struct CountingAnalyzer(AtomicUsize);

    impl SourceAnalyzer for CountingAnalyzer {
        fn analyze(&self, _source: &str) -> Result<PropertyTypes, AnalyzeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(AnalyzeError::Unbalanced { offset: 0 })
        }
    }

    #[tokio::test]
    async fn test_external_explicit_files_and_analyzer_failure() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("types/chip.js"), "whatever");

        let counter = Arc::new(CountingAnalyzer(AtomicUsize::new(0)));
        let extractor = MetadataExtractor::with_analyzers(counter.clone(), counter.clone());

        let cached = extractor
            .extract_external(temp.path(), "ui-kit/chip", Some(vec![PathBuf::from("types/chip.js")]))
            .await;
        extractor
            .extract_external(temp.path(), "ui-kit/chip", Some(vec![PathBuf::from("types/chip.js")]))
            .await;

        assert!(matches!(cached, CachedMetadata::Present { .. }));
        assert!(cached.metadata().is_empty());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
