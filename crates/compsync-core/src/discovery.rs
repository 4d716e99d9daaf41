//! Component discovery
//!
//! Decides which markup files are eligible for auto-registration and walks the
//! source root to find them. Eligibility is a glob match of the markup path
//! relative to the source root.

use std::path::{Path, PathBuf};

use compsync_config::DiscoveryConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::metadata::locate::with_suffix;

/// Directories never descended into.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "miniprogram_npm"];

/// Glob-based eligibility check for one source root.
#[derive(Debug, Clone)]
pub struct DiscoveryMatcher {
    source_root: PathBuf,
    globs: GlobSet,
    markup_extension: String,
    enabled: bool,
}

impl DiscoveryMatcher {
    pub fn new(source_root: impl Into<PathBuf>, config: &DiscoveryConfig) -> Self {
        Self {
            source_root: source_root.into(),
            globs: build_glob_set(&config.globs),
            markup_extension: config.markup_extension.clone(),
            enabled: config.enabled,
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Whether the component that `path` belongs to is eligible.
    ///
    /// `path` may be any of the component's files; its markup sibling is what
    /// gets matched.
    pub fn matches(&self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }
        let base = if path.extension().is_some() {
            path.with_extension("")
        } else {
            path.to_path_buf()
        };
        let markup = with_suffix(&base, &self.markup_extension);
        match markup.strip_prefix(&self.source_root) {
            Ok(relative) => self.globs.is_match(relative),
            Err(_) => false,
        }
    }

    /// Every eligible markup file under the source root, in path order.
    ///
    /// Hidden and dependency directories are skipped.
    pub fn walk(&self) -> Vec<PathBuf> {
        if !self.enabled {
            return Vec::new();
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.source_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if !e.file_type().is_dir() || e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_markup = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy() == self.markup_extension);
            if is_markup && self.matches(path) {
                found.push(path.to_path_buf());
            }
        }

        debug!(root = %self.source_root.display(), count = found.len(), "discovered markup files");
        found
    }
}

/// Build a glob set, skipping (and reporting) invalid patterns.
fn build_glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern = pattern.as_str(), error = %e, "invalid discovery glob"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}
