//! Metadata Extractor
//!
//! Produces, for each resolved component, a property → type-expression map
//! and a property → description map. Three sources contribute, lowest
//! precedence first:
//!
//! 1. the declarative schema (`properties` in the component JSON),
//! 2. the behavior source (`properties` table of the component definition),
//! 3. a shipped declaration file (external components only).
//!
//! Later sources override a property's type but never remove a property.
//! Descriptions only ever come from the schema.

pub mod alias;
pub mod analyzer;
pub mod cache;
pub mod extractor;
pub mod locate;
pub mod schema;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use analyzer::{AnalyzeError, DeclarationAnalyzer, PropertyTypes, ScriptAnalyzer, SourceAnalyzer};
pub use cache::{CacheKey, CacheMetrics, CachedMetadata, ExternalMetadataCache};
pub use extractor::MetadataExtractor;
pub use locate::MetadataFiles;

/// Typed-property metadata for one component.
///
/// The empty value is a valid "not yet known" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    /// Property name → rendered type expression
    pub types: BTreeMap<String, String>,
    /// Property name → description
    pub docs: BTreeMap<String, String>,
}

impl ComponentMetadata {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.docs.is_empty()
    }

    pub fn has_properties(&self) -> bool {
        !self.types.is_empty()
    }

    /// Overlay `types` from a higher-precedence source.
    pub fn merge_types(&mut self, types: PropertyTypes) {
        self.types.extend(types);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_and_unions() {
        let mut meta = ComponentMetadata::default();
        meta.types.insert("count".to_string(), "number".to_string());
        meta.docs.insert("count".to_string(), "How many".to_string());

        let mut source = PropertyTypes::new();
        source.insert("count".to_string(), "string".to_string());
        source.insert("extra".to_string(), "boolean".to_string());
        meta.merge_types(source);

        assert_eq!(meta.types.get("count").map(String::as_str), Some("string"));
        assert_eq!(meta.types.get("extra").map(String::as_str), Some("boolean"));
        assert_eq!(meta.types.len(), 2);
        assert_eq!(meta.docs.get("count").map(String::as_str), Some("How many"));
    }

    #[test]
    fn test_empty_is_distinguishable() {
        let meta = ComponentMetadata::default();
        assert!(meta.is_empty());
        assert!(!meta.has_properties());
    }
}
