//! CLI command implementations

pub mod config;
pub mod list;
pub mod resolve;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compsync_config::{ConfigLoader, LoggingConfig, SyncConfig};
use compsync_core::SyncSession;

use crate::GlobalOptions;

/// Resolve the project root from options or the current directory.
pub fn resolve_project(global: &GlobalOptions) -> Result<PathBuf> {
    let path = match global.project {
        Some(ref project) => project.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    if !path.is_dir() {
        anyhow::bail!("Project root '{}' is not a directory", path.display());
    }

    path.canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", path.display()))
}

/// Load configuration, honoring an explicit config file and CLI overrides.
pub fn load_config(global: &GlobalOptions, project: &Path) -> Result<SyncConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    let config = match global.config {
        Some(ref config_path) => {
            let mut config = loader.load_file(config_path).with_context(|| {
                format!("Failed to load config file {}", config_path.display())
            })?;
            config.apply_overrides(&overrides);
            config.validate().context("Invalid configuration")?;
            config
        }
        None => loader
            .load(project, Some(&overrides))
            .context("Failed to load configuration")?,
    };

    config.existing_source_root(project)?;
    Ok(config)
}

/// Logging settings for subscriber setup; falls back to defaults when the
/// configuration cannot be loaded yet (the command reports that error).
pub fn logging_settings(global: &GlobalOptions) -> LoggingConfig {
    resolve_project(global)
        .and_then(|project| load_config(global, &project))
        .map(|config| config.logging)
        .unwrap_or_default()
}

/// Build a session for the project.
pub fn build_session(project: &Path, config: SyncConfig) -> Result<SyncSession> {
    SyncSession::builder()
        .project_root(project)
        .config(config)
        .build()
        .context("Failed to start session")
}

/// Build a session that reads the project without writing any artifact.
pub async fn inspect_session(global: &GlobalOptions) -> Result<SyncSession> {
    let project = resolve_project(global)?;
    let mut config = load_config(global, &project)?;
    config.outputs.manifest.enabled = false;
    config.outputs.typed.enabled = false;
    config.outputs.framework.enabled = false;
    config.outputs.editor_schema.enabled = false;

    let session = build_session(&project, config)?;
    session.scan().await;
    Ok(session)
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
