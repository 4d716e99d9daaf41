//! Component Registry
//!
//! The single source of truth for which component names exist and where each
//! comes from. Local components are registered from project files; resolver
//! hits are mirrored in as they are looked up.
//!
//! Mutation is synchronous. File probing happens beforehand in
//! [`ComponentCandidate::probe`], so a registration never suspends halfway.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use compsync_config::DiscoveryConfig;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::metadata::locate::{is_file, with_suffix};
use crate::metadata::schema::is_component;
use crate::resolver::ResolverChain;
use crate::warn_once::WarnOnce;

/// Files backing one local component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEntry {
    /// Behavior file
    pub script_path: PathBuf,
    /// Declarative schema file
    pub schema_path: PathBuf,
    /// Markup file
    pub markup_path: PathBuf,
    /// Parsed schema contents
    pub schema: Value,
}

impl ComponentEntry {
    /// The extension-less path the three files share.
    pub fn base(&self) -> PathBuf {
        strip_extension(&self.schema_path)
    }

    fn owns(&self, path: &Path) -> bool {
        self.markup_path == path || self.schema_path == path || self.script_path == path
    }
}

/// Where a component name comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionRecord {
    /// A component inside the project
    Local {
        entry: ComponentEntry,
        /// Source-root-relative module path, e.g. `/components/card/card`
        import_path: String,
    },
    /// A component supplied by a resolver
    External { import_path: String },
}

impl ResolutionRecord {
    pub fn import_path(&self) -> &str {
        match self {
            Self::Local { import_path, .. } | Self::External { import_path } => import_path,
        }
    }

    pub fn entry(&self) -> Option<&ComponentEntry> {
        match self {
            Self::Local { entry, .. } => Some(entry),
            Self::External { .. } => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Outcome of probing a changed path for a component's sibling files.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCandidate {
    /// The path that was reported
    pub path: PathBuf,
    /// The complete file set, or `None` when this is not a component
    pub entry: Option<ComponentEntry>,
}

impl ComponentCandidate {
    /// Probe the markup, schema and behavior files next to `path`.
    ///
    /// Any missing file, or a schema that does not mark the unit as a
    /// component, yields a candidate without an entry.
    pub async fn probe(path: &Path, discovery: &DiscoveryConfig) -> Self {
        let base = strip_extension(path);
        Self {
            path: path.to_path_buf(),
            entry: probe_entry(&base, discovery).await,
        }
    }
}

async fn probe_entry(base: &Path, discovery: &DiscoveryConfig) -> Option<ComponentEntry> {
    let markup_path = with_suffix(base, &discovery.markup_extension);
    if !is_file(&markup_path).await {
        trace!(base = %base.display(), "no markup file");
        return None;
    }

    let schema_path = with_suffix(base, &discovery.schema_extension);
    let text = match tokio::fs::read_to_string(&schema_path).await {
        Ok(text) => text,
        Err(_) => {
            trace!(base = %base.display(), "no schema file");
            return None;
        }
    };
    let schema: Value = match serde_json::from_str(&text) {
        Ok(schema) => schema,
        Err(e) => {
            warn!(path = %schema_path.display(), error = %e, "malformed component schema");
            return None;
        }
    };
    if !is_component(&schema) {
        trace!(path = %schema_path.display(), "schema does not declare a component");
        return None;
    }

    let mut script_path = None;
    for ext in &discovery.script_extensions {
        let candidate = with_suffix(base, ext);
        if is_file(&candidate).await {
            script_path = Some(candidate);
            break;
        }
    }
    let Some(script_path) = script_path else {
        trace!(base = %base.display(), "no behavior file");
        return None;
    };

    Some(ComponentEntry {
        script_path,
        schema_path,
        markup_path,
        schema,
    })
}

/// Names affected by one registry mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryChange {
    /// Name bound (or re-bound) by this mutation
    pub installed: Option<String>,
    /// Names whose binding was removed
    pub removed: Vec<String>,
}

impl RegistryChange {
    pub fn is_empty(&self) -> bool {
        self.installed.is_none() && self.removed.is_empty()
    }
}

/// Name → resolution table for one build session.
#[derive(Debug)]
pub struct ComponentRegistry {
    source_root: PathBuf,
    chain: ResolverChain,
    records: BTreeMap<String, ResolutionRecord>,
    resolver_component_names: BTreeSet<String>,
    warnings: Arc<WarnOnce>,
}

impl ComponentRegistry {
    pub fn new(source_root: impl Into<PathBuf>, chain: ResolverChain, warnings: Arc<WarnOnce>) -> Self {
        let resolver_component_names = chain.static_components().into_keys().collect();
        Self {
            source_root: source_root.into(),
            chain,
            records: BTreeMap::new(),
            resolver_component_names,
            warnings,
        }
    }

    pub fn chain(&self) -> &ResolverChain {
        &self.chain
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Replace the resolver chain. Mirrored external records are dropped.
    pub fn set_chain(&mut self, chain: ResolverChain) {
        self.records.retain(|_, record| record.is_local());
        self.resolver_component_names = chain.static_components().into_keys().collect();
        self.chain = chain;
    }

    /// Change the directory import paths are relative to.
    pub fn set_source_root(&mut self, source_root: impl Into<PathBuf>) {
        self.source_root = source_root.into();
        let root = self.source_root.clone();
        for record in self.records.values_mut() {
            if let ResolutionRecord::Local { entry, import_path } = record {
                *import_path = import_path_for(&root, entry);
            }
        }
    }

    /// Whether a resolver owns `name`, either through a static table or a
    /// mirrored lookup.
    pub fn is_resolver_component(&self, name: &str) -> bool {
        self.resolver_component_names.contains(name)
    }

    /// Install, replace or drop the binding for a probed path.
    pub fn register_local(&mut self, candidate: ComponentCandidate) -> RegistryChange {
        let Some(entry) = candidate.entry else {
            return RegistryChange {
                installed: None,
                removed: self.remove_local(&candidate.path),
            };
        };

        let base = entry.base();
        let stem = base
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = if stem == "index" {
            base.parent()
                .and_then(Path::file_name)
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            stem.clone()
        };
        if name.is_empty() {
            return RegistryChange::default();
        }

        if let Some(ResolutionRecord::Local { entry: existing, .. }) = self.records.get(&name) {
            let existing_base = existing.base();
            if existing_base != base && stem != "index" {
                self.warnings.warn(format!(
                    "component name '{}' at {} is already registered from {}; keeping the existing component",
                    name,
                    base.display(),
                    existing_base.display()
                ));
                return RegistryChange::default();
            }
        }

        let removed: Vec<String> = self
            .records
            .iter()
            .filter(|(bound, record)| {
                bound.as_str() != name && record.entry().is_some_and(|e| e.base() == base)
            })
            .map(|(bound, _)| bound.clone())
            .collect();
        for stale in &removed {
            self.records.remove(stale);
        }

        let import_path = import_path_for(&self.source_root, &entry);
        debug!(name = name.as_str(), import_path = import_path.as_str(), "registered component");
        self.records
            .insert(name.clone(), ResolutionRecord::Local { entry, import_path });

        RegistryChange {
            installed: Some(name),
            removed,
        }
    }

    /// Remove every local binding backed by `path`.
    ///
    /// A binding matches when `path` is one of its files, names its base, or
    /// is a directory containing it. Directory matching uses `path` as given
    /// so a dotted directory name is not mistaken for a file. Returns the
    /// removed names.
    pub fn remove_local(&mut self, path: &Path) -> Vec<String> {
        let base = strip_extension(path);
        let removed: Vec<String> = self
            .records
            .iter()
            .filter_map(|(name, record)| {
                let entry = record.entry()?;
                let entry_base = entry.base();
                let matched =
                    entry.owns(path) || entry_base == base || entry_base.starts_with(path);
                matched.then(|| name.clone())
            })
            .collect();
        for name in &removed {
            self.records.remove(name);
            debug!(name = name.as_str(), path = %path.display(), "removed component");
        }
        removed
    }

    /// Look a name up: local bindings first, then the resolver chain.
    ///
    /// Resolver hits are mirrored into the registry.
    pub fn resolve_name(&mut self, name: &str, importer: &Path) -> Option<ResolutionRecord> {
        if let Some(record) = self.records.get(name).filter(|r| r.is_local()) {
            return Some(record.clone());
        }
        let hit = self.chain.resolve(name, importer)?;
        let record = ResolutionRecord::External {
            import_path: hit.from,
        };
        self.resolver_component_names.insert(hit.name.clone());
        self.records.insert(hit.name, record.clone());
        Some(record)
    }

    pub fn get(&self, name: &str) -> Option<&ResolutionRecord> {
        self.records.get(name)
    }

    /// Local bindings in name order.
    pub fn list_local(&self) -> impl Iterator<Item = (&str, &ResolutionRecord)> {
        self.records
            .iter()
            .filter(|(_, record)| record.is_local())
            .map(|(name, record)| (name.as_str(), record))
    }

    /// Every known name: resolver tables, mirrored lookups and local
    /// components, with local bindings taking precedence.
    pub fn known_components(&self) -> BTreeMap<String, ResolutionRecord> {
        let mut out: BTreeMap<String, ResolutionRecord> = self
            .chain
            .static_components()
            .into_iter()
            .map(|(name, import_path)| (name, ResolutionRecord::External { import_path }))
            .collect();
        for (name, record) in &self.records {
            out.insert(name.clone(), record.clone());
        }
        out
    }

    /// Name → import path over every known name, sorted by name.
    pub fn manifest(&self) -> BTreeMap<String, String> {
        self.known_components()
            .into_iter()
            .map(|(name, record)| (name, record.import_path().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn strip_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

/// `/`-joined path of the component base relative to `source_root`.
fn import_path_for(source_root: &Path, entry: &ComponentEntry) -> String {
    let base = entry.base();
    let relative = base.strip_prefix(source_root).unwrap_or(&base);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}
