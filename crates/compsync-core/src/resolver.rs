//! Resolver Chain
//!
//! Maps a tag name to the external package location it comes from. Each
//! resolver exposes up to two capabilities: a dynamic `resolve` operation and
//! a static name → import path table. The chain consults resolvers in
//! registration order and, within each resolver, the candidate names in
//! order; the first hit wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compsync_config::ResolverConfig;
use tracing::trace;

use crate::naming;

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
    /// The tag name as it was requested
    pub name: String,
    /// Import path supplied by the resolver
    pub from: String,
}

/// A pluggable name → source provider.
///
/// Implementors override whichever capabilities they support; the defaults
/// report "no capability".
pub trait Resolver: Send + Sync {
    /// Resolver name used in logs.
    fn name(&self) -> &str;

    /// Dynamic capability: resolve a single candidate name.
    fn resolve(&self, _name: &str, _importer: &Path) -> Option<ResolvedTag> {
        None
    }

    /// Static capability: the full name → import path table.
    fn components(&self) -> Option<&BTreeMap<String, String>> {
        None
    }

    /// Explicit metadata files for an import path this resolver produced.
    ///
    /// Returning `None` lets the metadata locator fall back to its layout
    /// heuristic.
    fn metadata_files(&self, _import_path: &str) -> Option<Vec<PathBuf>> {
        None
    }
}

/// A resolver backed only by a static table.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    name: String,
    components: BTreeMap<String, String>,
    metadata_files: BTreeMap<String, Vec<PathBuf>>,
}

impl TableResolver {
    pub fn new(name: impl Into<String>, components: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            components,
            metadata_files: BTreeMap::new(),
        }
    }

    /// Attach explicit metadata file lists keyed by import path.
    pub fn with_metadata_files(mut self, files: BTreeMap<String, Vec<PathBuf>>) -> Self {
        self.metadata_files = files;
        self
    }
}

impl Resolver for TableResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn components(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.components)
    }

    fn metadata_files(&self, import_path: &str) -> Option<Vec<PathBuf>> {
        self.metadata_files.get(import_path).cloned()
    }
}

/// A resolver mapping every `prefix`-ed tag into one package.
///
/// `t-button` with prefix `t-`, package `tdesign-miniprogram` and the default
/// template resolves to `tdesign-miniprogram/button/button`. An optional
/// static table is consulted as well.
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    name: String,
    prefix: String,
    package: String,
    template: String,
    components: Option<BTreeMap<String, String>>,
    metadata_files: BTreeMap<String, Vec<PathBuf>>,
}

impl PrefixResolver {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        package: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            package: package.into(),
            template: compsync_config::DEFAULT_PATH_TEMPLATE.to_string(),
            components: None,
            metadata_files: BTreeMap::new(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_components(mut self, components: BTreeMap<String, String>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn with_metadata_files(mut self, files: BTreeMap<String, Vec<PathBuf>>) -> Self {
        self.metadata_files = files;
        self
    }
}

impl Resolver for PrefixResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, name: &str, _importer: &Path) -> Option<ResolvedTag> {
        let stem = name.strip_prefix(&self.prefix)?;
        if stem.is_empty() {
            return None;
        }
        let from = self
            .template
            .replace("{package}", &self.package)
            .replace("{name}", name)
            .replace("{stem}", stem);
        Some(ResolvedTag {
            name: name.to_string(),
            from,
        })
    }

    fn components(&self) -> Option<&BTreeMap<String, String>> {
        self.components.as_ref()
    }

    fn metadata_files(&self, import_path: &str) -> Option<Vec<PathBuf>> {
        self.metadata_files.get(import_path).cloned()
    }
}

/// Build a resolver from its configuration entry.
pub fn resolver_from_config(config: &ResolverConfig) -> Arc<dyn Resolver> {
    match (&config.prefix, &config.package) {
        (Some(prefix), Some(package)) => {
            let mut resolver = PrefixResolver::new(&config.name, prefix, package)
                .with_template(config.path_template())
                .with_metadata_files(config.metadata_files.clone());
            if !config.components.is_empty() {
                resolver = resolver.with_components(config.components.clone());
            }
            Arc::new(resolver)
        }
        _ => Arc::new(
            TableResolver::new(&config.name, config.components.clone())
                .with_metadata_files(config.metadata_files.clone()),
        ),
    }
}

/// Ordered list of resolvers.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.name()))
            .finish()
    }
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Arc<dyn Resolver>>) -> Self {
        Self { resolvers }
    }

    /// Build a chain from configuration entries, preserving their order.
    pub fn from_config(configs: &[ResolverConfig]) -> Self {
        Self::new(configs.iter().map(resolver_from_config).collect())
    }

    /// Append a resolver; it is consulted after every existing one.
    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Resolve a tag name.
    ///
    /// Resolver order is the outer loop and candidate order the inner loop.
    /// The returned `name` is always the requested tag, never the candidate.
    pub fn resolve(&self, tag: &str, importer: &Path) -> Option<ResolvedTag> {
        let candidates = naming::candidates(tag);
        for resolver in &self.resolvers {
            for candidate in &candidates {
                if let Some(hit) = lookup(resolver.as_ref(), candidate, importer) {
                    trace!(
                        tag,
                        candidate = candidate.as_str(),
                        resolver = resolver.name(),
                        from = hit.from.as_str(),
                        "resolved tag"
                    );
                    return Some(ResolvedTag {
                        name: tag.to_string(),
                        from: hit.from,
                    });
                }
            }
        }
        None
    }

    /// Union of every static table, earlier resolvers winning on collision.
    pub fn static_components(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for resolver in &self.resolvers {
            if let Some(table) = resolver.components() {
                for (name, from) in table {
                    out.entry(name.clone()).or_insert_with(|| from.clone());
                }
            }
        }
        out
    }

    /// Explicit metadata files for an import path, from the first resolver
    /// that supplies any.
    pub fn metadata_files(&self, import_path: &str) -> Option<Vec<PathBuf>> {
        self.resolvers
            .iter()
            .find_map(|r| r.metadata_files(import_path))
    }
}

/// Ask one resolver about one candidate, through whichever capability it has.
fn lookup(resolver: &dyn Resolver, candidate: &str, importer: &Path) -> Option<ResolvedTag> {
    if let Some(hit) = resolver.resolve(candidate, importer) {
        return Some(hit);
    }
    resolver
        .components()
        .and_then(|table| table.get(candidate))
        .map(|from| ResolvedTag {
            name: candidate.to_string(),
            from: from.clone(),
        })
}
