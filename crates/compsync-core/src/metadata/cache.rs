//! External Metadata Cache
//!
//! Remembers every external extraction attempt, keyed by
//! `(base directory, import specifier)`, for the lifetime of the cache owner.
//! A failed lookup is stored as [`CachedMetadata::Absent`], which is distinct
//! from a key that was never attempted.
//!
//! Thread-safe: all methods take `&self`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::ComponentMetadata;

/// Cache key for one external extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub base_dir: PathBuf,
    pub specifier: String,
}

impl CacheKey {
    pub fn new(base_dir: &Path, specifier: &str) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            specifier: specifier.to_string(),
        }
    }
}

/// Outcome of an attempted extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedMetadata {
    /// No describing files were found
    Absent,
    /// Extraction ran and produced this metadata (possibly empty)
    Present {
        metadata: ComponentMetadata,
        /// Navigable source file, if one was found
        source: Option<PathBuf>,
    },
}

impl CachedMetadata {
    pub fn metadata(&self) -> ComponentMetadata {
        match self {
            Self::Absent => ComponentMetadata::default(),
            Self::Present { metadata, .. } => metadata.clone(),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        match self {
            Self::Absent => None,
            Self::Present { source, .. } => source.as_deref(),
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered from the cache (including negative entries)
    pub hits: u64,
    /// Lookups that found no entry
    pub misses: u64,
}

impl CacheMetrics {
    /// Get hit rate as a fraction (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Permanent cache of external metadata extraction results.
#[derive(Debug, Default)]
pub struct ExternalMetadataCache {
    entries: DashMap<CacheKey, CachedMetadata>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExternalMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attempt; `None` means "never attempted".
    pub fn get(&self, key: &CacheKey) -> Option<CachedMetadata> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Record an attempt. An existing entry is kept.
    pub fn insert(&self, key: CacheKey, value: CachedMetadata) -> CachedMetadata {
        self.entries.entry(key).or_insert(value).value().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_entry_distinct_from_uncached() {
        let cache = ExternalMetadataCache::new();
        let key = CacheKey::new(Path::new("/app"), "ui/card/card");

        assert_eq!(cache.get(&key), None);
        cache.insert(key.clone(), CachedMetadata::Absent);
        assert_eq!(cache.get(&key), Some(CachedMetadata::Absent));
        assert!(cache.get(&key).unwrap().metadata().is_empty());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ExternalMetadataCache::new();
        let key = CacheKey::new(Path::new("/app"), "ui/card/card");

        let mut metadata = ComponentMetadata::default();
        metadata.types.insert("title".to_string(), "string".to_string());
        cache.insert(
            key.clone(),
            CachedMetadata::Present {
                metadata: metadata.clone(),
                source: None,
            },
        );
        let kept = cache.insert(key.clone(), CachedMetadata::Absent);

        assert_eq!(kept.metadata(), metadata);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_include_base_dir() {
        let cache = ExternalMetadataCache::new();
        cache.insert(CacheKey::new(Path::new("/a"), "ui/x"), CachedMetadata::Absent);
        assert!(cache.get(&CacheKey::new(Path::new("/b"), "ui/x")).is_none());
    }

    #[test]
    fn test_metrics() {
        let cache = ExternalMetadataCache::new();
        let key = CacheKey::new(Path::new("/app"), "ui/card/card");
        cache.get(&key);
        cache.insert(key.clone(), CachedMetadata::Absent);
        cache.get(&key);
        cache.get(&key);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.misses, 1);
        assert!((metrics.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
