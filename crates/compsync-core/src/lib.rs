//! compsync core - component auto-discovery and generated-artifact synchronization
//!
//! This crate keeps a set of generated artifacts in step with a component-based
//! UI project as it is edited:
//! - Resolver chain mapping tag names to external packages
//! - Metadata extraction from schemas, behavior sources and declaration files
//! - Component registry of local and resolver-supplied components
//! - Artifact synchronizers (manifest, typed declarations, framework
//!   declarations, editor schema)
//! - Coalescing write scheduler guaranteeing single-flight writes

pub mod artifacts;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod warn_once;

// Error re-exports
pub use error::{SessionError, SyncError};

// Resolver re-exports
pub use resolver::{resolver_from_config, PrefixResolver, ResolvedTag, Resolver, ResolverChain, TableResolver};

// Metadata re-exports
pub use metadata::{
    AnalyzeError, CachedMetadata, ComponentMetadata, DeclarationAnalyzer, ExternalMetadataCache,
    MetadataExtractor, PropertyTypes, ScriptAnalyzer, SourceAnalyzer,
};

// Registry re-exports
pub use registry::{
    ComponentCandidate, ComponentEntry, ComponentRegistry, RegistryChange, ResolutionRecord,
};

// Artifact re-exports
pub use artifacts::{ArtifactKind, ArtifactWriter, ComponentView, WriteOutcome};

// Scheduler re-exports
pub use scheduler::{CoalescedTask, CoalescingScheduler};

// Session re-exports
pub use discovery::DiscoveryMatcher;
pub use session::{SessionBuilder, SyncSession};
pub use warn_once::WarnOnce;
