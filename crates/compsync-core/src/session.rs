//! Build session
//!
//! A [`SyncSession`] owns every piece of mutable state for one build: the
//! component registry, the per-component metadata map, the external metadata
//! cache and the four artifact schedulers. Hosts feed it file-change events;
//! it keeps the generated artifacts current.
//!
//! Registry mutations complete synchronously before any run is scheduled, so
//! a scheduled run always sees a consistent registry. Locks are never held
//! across an `.await`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use compsync_config::{resolve_against, SyncConfig};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::artifacts::framework::{self, FrameworkOptions};
use crate::artifacts::{html_data, manifest, typed};
use crate::artifacts::{ArtifactKind, ArtifactWriter, ComponentView};
use crate::discovery::DiscoveryMatcher;
use crate::error::{SessionError, SyncError};
use crate::metadata::{ComponentMetadata, MetadataExtractor, SourceAnalyzer};
use crate::registry::{ComponentCandidate, ComponentRegistry, RegistryChange, ResolutionRecord};
use crate::resolver::{Resolver, ResolverChain};
use crate::scheduler::{CoalescedTask, CoalescingScheduler};
use crate::warn_once::WarnOnce;

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`SyncSession`].
///
/// The project root and the configuration are required; everything else has
/// a default.
#[derive(Default)]
pub struct SessionBuilder {
    project_root: Option<PathBuf>,
    config: Option<SyncConfig>,
    resolvers: Vec<Arc<dyn Resolver>>,
    analyzers: Option<(Arc<dyn SourceAnalyzer>, Arc<dyn SourceAnalyzer>)>,
    base_tags: Vec<Value>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append a programmatic resolver after the configured ones.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Replace the built-in behavior-source and declaration-file analyzers.
    pub fn analyzers(
        mut self,
        script: Arc<dyn SourceAnalyzer>,
        declaration: Arc<dyn SourceAnalyzer>,
    ) -> Self {
        self.analyzers = Some((script, declaration));
        self
    }

    /// Built-in editor tags placed ahead of generated ones.
    pub fn base_tags(mut self, tags: Vec<Value>) -> Self {
        self.base_tags = tags;
        self
    }

    pub fn build(self) -> Result<SyncSession, SessionError> {
        let project_root = self
            .project_root
            .ok_or(SessionError::MissingService("project root"))?;
        let config = self
            .config
            .ok_or(SessionError::MissingService("configuration"))?;
        if !project_root.is_dir() {
            return Err(SessionError::InvalidProjectRoot(project_root));
        }

        let extractor = match self.analyzers {
            Some((script, declaration)) => MetadataExtractor::with_analyzers(script, declaration),
            None => MetadataExtractor::new(),
        };
        let source_root = config.source_root(&project_root);
        let chain = build_chain(&config, &self.resolvers);
        let warnings = Arc::new(WarnOnce::new());

        let shared = Arc::new(Shared {
            registry: RwLock::new(ComponentRegistry::new(
                source_root.clone(),
                chain,
                warnings.clone(),
            )),
            matcher: RwLock::new(DiscoveryMatcher::new(source_root, &config.discovery)),
            settings: RwLock::new(config),
            metadata: RwLock::new(BTreeMap::new()),
            project_root,
            extra_resolvers: self.resolvers,
            extractor,
            base_tags: self.base_tags,
            warnings,
        });

        let task = |kind, follow_up| ArtifactTask {
            kind,
            shared: shared.clone(),
            writer: ArtifactWriter::new(),
            follow_up,
        };
        let editor_schema = CoalescingScheduler::new(task(ArtifactKind::EditorSchema, None));
        let manifest =
            CoalescingScheduler::new(task(ArtifactKind::Manifest, Some(editor_schema.clone())));
        let typed = CoalescingScheduler::new(task(ArtifactKind::Typed, None));
        let framework = CoalescingScheduler::new(task(ArtifactKind::Framework, None));

        Ok(SyncSession {
            shared,
            manifest,
            typed,
            framework,
            editor_schema,
        })
    }
}

fn build_chain(config: &SyncConfig, extra: &[Arc<dyn Resolver>]) -> ResolverChain {
    let mut chain = ResolverChain::from_config(&config.resolvers);
    for resolver in extra {
        chain.push(resolver.clone());
    }
    chain
}

// ============================================================================
// Shared state
// ============================================================================

struct Shared {
    project_root: PathBuf,
    settings: RwLock<SyncConfig>,
    matcher: RwLock<DiscoveryMatcher>,
    extra_resolvers: Vec<Arc<dyn Resolver>>,
    registry: RwLock<ComponentRegistry>,
    /// Loaded metadata by component name; a missing entry reads as empty
    metadata: RwLock<BTreeMap<String, ComponentMetadata>>,
    extractor: MetadataExtractor,
    base_tags: Vec<Value>,
    warnings: Arc<WarnOnce>,
}

impl Shared {
    /// Absolute destination of an enabled artifact.
    fn target(&self, kind: ArtifactKind) -> Option<PathBuf> {
        let settings = self.settings.read();
        let outputs = &settings.outputs;
        let (enabled, path) = match kind {
            ArtifactKind::Manifest => (outputs.manifest.enabled, &outputs.manifest.path),
            ArtifactKind::Typed => (outputs.typed.enabled, &outputs.typed.path),
            ArtifactKind::Framework => (outputs.framework.enabled, &outputs.framework.path),
            ArtifactKind::EditorSchema => {
                (outputs.editor_schema.enabled, &outputs.editor_schema.path)
            }
        };
        enabled.then(|| resolve_against(&self.project_root, path))
    }

    fn is_enabled(&self, kind: ArtifactKind) -> bool {
        let settings = self.settings.read();
        match kind {
            ArtifactKind::Manifest => settings.outputs.manifest.enabled,
            ArtifactKind::Typed => settings.outputs.typed.enabled,
            ArtifactKind::Framework => settings.outputs.framework.enabled,
            ArtifactKind::EditorSchema => settings.outputs.editor_schema.enabled,
        }
    }

    /// Drop loaded metadata for every name a registry change touched.
    fn invalidate(&self, change: &RegistryChange) {
        if change.is_empty() {
            return;
        }
        let mut metadata = self.metadata.write();
        for name in change.installed.iter().chain(change.removed.iter()) {
            metadata.remove(name);
        }
    }

    /// Snapshot every known component with its metadata, loading what is
    /// missing.
    async fn views(&self) -> Vec<ComponentView> {
        let (known, chain) = {
            let registry = self.registry.read();
            (registry.known_components(), registry.chain().clone())
        };

        let mut views = Vec::with_capacity(known.len());
        for (name, record) in known {
            let view = match record {
                ResolutionRecord::Local { entry, import_path } => {
                    let loaded = self.metadata.read().get(&name).cloned();
                    let metadata = match loaded {
                        Some(metadata) => metadata,
                        None => {
                            let extracted = self.extractor.extract_local(&entry).await;
                            self.remember(&name, extracted)
                        }
                    };
                    ComponentView {
                        name,
                        import_path,
                        metadata,
                        source: Some(entry.script_path),
                        local: true,
                    }
                }
                ResolutionRecord::External { import_path } => {
                    let extracted = self
                        .extractor
                        .extract_external(
                            &self.project_root,
                            &import_path,
                            chain.metadata_files(&import_path),
                        )
                        .await;
                    let metadata = self.remember(&name, extracted.metadata());
                    ComponentView {
                        name,
                        source: extracted.source().map(Path::to_path_buf),
                        import_path,
                        metadata,
                        local: false,
                    }
                }
            };
            views.push(view);
        }
        views
    }

    /// Store lazily loaded metadata unless a fresher value landed meanwhile.
    fn remember(&self, name: &str, metadata: ComponentMetadata) -> ComponentMetadata {
        self.metadata
            .write()
            .entry(name.to_string())
            .or_insert(metadata)
            .clone()
    }

    async fn render(&self, kind: ArtifactKind, path: &Path) -> Result<String, SyncError> {
        match kind {
            ArtifactKind::Manifest => {
                let entries = self.registry.read().manifest();
                manifest::render(&entries)
            }
            ArtifactKind::Typed => {
                let module = self.settings.read().outputs.typed.module.clone();
                let views = self.views().await;
                Ok(typed::render(&views, &module))
            }
            ArtifactKind::Framework => {
                let (module, typed_module) = {
                    let settings = self.settings.read();
                    let outputs = &settings.outputs;
                    let typed_module = (outputs.framework.reference_typed
                        && outputs.typed.enabled)
                        .then(|| outputs.typed.module.clone());
                    (outputs.framework.module.clone(), typed_module)
                };
                let views = self.views().await;
                let output_dir = path.parent().unwrap_or(&self.project_root);
                Ok(framework::render(
                    &views,
                    &FrameworkOptions {
                        module: &module,
                        typed_module: typed_module.as_deref(),
                        output_dir,
                    },
                ))
            }
            ArtifactKind::EditorSchema => {
                let base_tags_file = self
                    .settings
                    .read()
                    .outputs
                    .editor_schema
                    .base_tags
                    .as_ref()
                    .map(|p| resolve_against(&self.project_root, p));
                let mut tags = self.base_tags.clone();
                if let Some(file) = base_tags_file {
                    match html_data::load_base_tags(&file).await {
                        Ok(loaded) => tags.extend(loaded),
                        Err(e) => warn!(path = %file.display(), error = %e, "ignoring base tags"),
                    }
                }
                let views = self.views().await;
                html_data::render(&views, &tags)
            }
        }
    }
}

// ============================================================================
// Artifact task
// ============================================================================

/// One artifact kind's synchronizer, run by its scheduler.
struct ArtifactTask {
    kind: ArtifactKind,
    shared: Arc<Shared>,
    writer: ArtifactWriter,
    /// Scheduled after every run (manifest → editor schema)
    follow_up: Option<CoalescingScheduler<ArtifactTask>>,
}

impl ArtifactTask {
    async fn sync_once(&self) -> Result<(), SyncError> {
        let Some(path) = self.shared.target(self.kind) else {
            self.writer.sync(None).await?;
            return Ok(());
        };
        let text = self.shared.render(self.kind, &path).await?;
        let outcome = self.writer.sync(Some((path.as_path(), text.as_str()))).await?;
        debug!(artifact = self.kind.label(), ?outcome, "artifact synchronized");
        Ok(())
    }
}

#[async_trait]
impl CoalescedTask for ArtifactTask {
    fn label(&self) -> &str {
        self.kind.label()
    }

    fn has_prior_output(&self) -> bool {
        self.writer.has_prior_output()
    }

    async fn run(&self) -> Result<(), SyncError> {
        let result = self.sync_once().await;
        if let Some(next) = &self.follow_up {
            let kind = next.task().kind;
            next.schedule(self.shared.is_enabled(kind));
        }
        result
    }
}

// ============================================================================
// Session
// ============================================================================

/// The build-session context object.
///
/// Event methods must be called from within a tokio runtime: they spawn
/// artifact runs.
pub struct SyncSession {
    shared: Arc<Shared>,
    manifest: CoalescingScheduler<ArtifactTask>,
    typed: CoalescingScheduler<ArtifactTask>,
    framework: CoalescingScheduler<ArtifactTask>,
    editor_schema: CoalescingScheduler<ArtifactTask>,
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("project_root", &self.shared.project_root)
            .field("components", &self.shared.registry.read().len())
            .finish()
    }
}

impl SyncSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn project_root(&self) -> &Path {
        &self.shared.project_root
    }

    pub fn settings(&self) -> SyncConfig {
        self.shared.settings.read().clone()
    }

    /// Register every eligible component under the source root, then
    /// schedule all artifacts. Returns the number of local components.
    pub async fn scan(&self) -> usize {
        let matcher = self.shared.matcher.read().clone();
        let paths = match tokio::task::spawn_blocking(move || matcher.walk()).await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "project scan failed");
                Vec::new()
            }
        };

        for path in &paths {
            self.register(path).await;
        }

        let count = self.shared.registry.read().list_local().count();
        info!(scanned = paths.len(), components = count, "project scan complete");
        self.schedule_all();
        count
    }

    /// A file was added or changed.
    ///
    /// Returns the registry change it caused.
    pub async fn file_changed(&self, path: &Path) -> RegistryChange {
        if !self.shared.matcher.read().matches(path) {
            trace!(path = %path.display(), "not eligible for discovery");
            return RegistryChange::default();
        }
        let change = self.register(path).await;
        if !change.is_empty() {
            self.schedule_all();
        }
        change
    }

    /// A file or directory was removed.
    pub fn file_removed(&self, path: &Path) -> RegistryChange {
        let removed = self.shared.registry.write().remove_local(path);
        let change = RegistryChange {
            installed: None,
            removed,
        };
        self.shared.invalidate(&change);
        if !change.is_empty() {
            self.schedule_all();
        }
        change
    }

    async fn register(&self, path: &Path) -> RegistryChange {
        let (discovery, needs_metadata) = {
            let settings = self.shared.settings.read();
            (settings.discovery.clone(), settings.needs_metadata())
        };
        let candidate = ComponentCandidate::probe(path, &discovery).await;
        let entry = candidate.entry.clone();

        let change = self.shared.registry.write().register_local(candidate);
        self.shared.invalidate(&change);

        if needs_metadata {
            if let (Some(name), Some(entry)) = (&change.installed, entry) {
                let metadata = self.shared.extractor.extract_local(&entry).await;
                self.shared.metadata.write().insert(name.clone(), metadata);
            }
        }
        change
    }

    /// Resolve a tag referenced from `importer`.
    ///
    /// A name newly learned from a resolver schedules the artifacts.
    pub fn resolve(&self, tag: &str, importer: &Path) -> Option<ResolutionRecord> {
        let (record, learned) = {
            let mut registry = self.shared.registry.write();
            let known = registry.get(tag).is_some();
            let record = registry.resolve_name(tag, importer);
            let learned = !known && registry.get(tag).is_some();
            (record, learned)
        };
        if learned {
            self.schedule_all();
        }
        record
    }

    /// Local components in name order.
    pub fn list_local(&self) -> Vec<(String, ResolutionRecord)> {
        self.shared
            .registry
            .read()
            .list_local()
            .map(|(name, record)| (name.to_string(), record.clone()))
            .collect()
    }

    /// Every known name and its import path.
    pub fn manifest(&self) -> BTreeMap<String, String> {
        self.shared.registry.read().manifest()
    }

    /// Metadata for a component.
    ///
    /// A resolver-owned name that has not been loaded yet reads as empty;
    /// any other unloaded name is `None`.
    pub fn metadata(&self, name: &str) -> Option<ComponentMetadata> {
        if let Some(loaded) = self.shared.metadata.read().get(name) {
            return Some(loaded.clone());
        }
        self.shared
            .registry
            .read()
            .is_resolver_component(name)
            .then(ComponentMetadata::default)
    }

    /// Schedule every artifact.
    pub fn request_sync(&self) {
        self.schedule_all();
    }

    /// Apply a new configuration.
    ///
    /// Resolvers, source root and outputs are re-targeted; an artifact whose
    /// destination moved or that was disabled has its old file removed by the
    /// next run. Loaded metadata is dropped and reloaded on demand. Changed
    /// discovery globs take effect for later events; call [`Self::scan`] to
    /// pick up newly eligible components.
    pub fn reload_settings(&self, config: SyncConfig) {
        let source_root = config.source_root(&self.shared.project_root);
        let chain = build_chain(&config, &self.shared.extra_resolvers);
        {
            let mut registry = self.shared.registry.write();
            registry.set_chain(chain);
            registry.set_source_root(source_root.clone());
        }
        *self.shared.matcher.write() = DiscoveryMatcher::new(source_root, &config.discovery);
        self.shared.metadata.write().clear();
        *self.shared.settings.write() = config;
        info!("settings reloaded");
        self.schedule_all();
    }

    fn schedule_all(&self) {
        for kind in ArtifactKind::ALL {
            let enabled = self.shared.is_enabled(kind);
            self.scheduler(kind).schedule(enabled);
        }
    }

    fn scheduler(&self, kind: ArtifactKind) -> &CoalescingScheduler<ArtifactTask> {
        match kind {
            ArtifactKind::Manifest => &self.manifest,
            ArtifactKind::Typed => &self.typed,
            ArtifactKind::Framework => &self.framework,
            ArtifactKind::EditorSchema => &self.editor_schema,
        }
    }

    /// Wait until every scheduled run, including follow-ups, has finished.
    pub async fn flush(&self) {
        loop {
            for kind in ArtifactKind::ALL {
                self.scheduler(kind).wait_idle().await;
            }
            if ArtifactKind::ALL.iter().all(|kind| !self.scheduler(*kind).is_busy()) {
                return;
            }
        }
    }

    /// Destination an artifact was last written to.
    pub fn output_path(&self, kind: ArtifactKind) -> Option<PathBuf> {
        self.scheduler(kind).task().writer.last_path()
    }

    /// Number of file writes an artifact has performed.
    pub fn write_count(&self, kind: ArtifactKind) -> u64 {
        self.scheduler(kind).task().writer.write_count()
    }

    /// Number of synchronizer runs an artifact has started.
    pub fn run_count(&self, kind: ArtifactKind) -> u64 {
        self.scheduler(kind).run_count()
    }

    /// Distinct warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.shared.warnings.len()
    }
}
