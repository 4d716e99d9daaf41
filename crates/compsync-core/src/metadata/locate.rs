//! Metadata file discovery for external components.
//!
//! Given a package subpath import such as `tdesign-miniprogram/button/button`,
//! find the schema, script and declaration files that describe it. A resolver
//! may supply an explicit list; otherwise conventional package layouts are
//! probed.

use std::path::{Path, PathBuf};

use tracing::trace;

/// Package layout directories probed under the package root, in order.
///
/// The empty entry probes the subpath as written.
pub const LAYOUT_DIRS: &[&str] = &["", "miniprogram_dist", "dist", "lib", "esm"];

const SCRIPT_EXTENSIONS: &[&str] = &["js", "ts", "mjs", "cjs"];

/// Files describing one external component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFiles {
    pub schema: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub declaration: Option<PathBuf>,
}

impl MetadataFiles {
    pub fn is_empty(&self) -> bool {
        self.schema.is_none() && self.script.is_none() && self.declaration.is_none()
    }

    /// The most navigable file: declaration first, then script.
    pub fn source(&self) -> Option<&Path> {
        self.declaration
            .as_deref()
            .or(self.script.as_deref())
    }

    /// Classify an explicit candidate list, keeping only files that exist.
    ///
    /// Relative entries are resolved against `base_dir`; the first file of
    /// each kind wins.
    pub async fn from_candidates(base_dir: &Path, candidates: &[PathBuf]) -> Self {
        let mut files = Self::default();
        for candidate in candidates {
            let path = if candidate.is_absolute() {
                candidate.clone()
            } else {
                base_dir.join(candidate)
            };
            if !is_file(&path).await {
                trace!(path = %path.display(), "explicit metadata candidate missing");
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if name.ends_with(".d.ts") {
                files.declaration.get_or_insert(path);
            } else if name.ends_with(".json") {
                files.schema.get_or_insert(path);
            } else if SCRIPT_EXTENSIONS
                .iter()
                .any(|ext| name.ends_with(&format!(".{}", ext)))
            {
                files.script.get_or_insert(path);
            }
        }
        files
    }
}

/// Split a bare import specifier into package name and subpath.
///
/// Scoped packages keep their scope: `@vant/weapp/button/index` →
/// (`@vant/weapp`, `button/index`).
pub fn split_specifier(specifier: &str) -> Option<(String, String)> {
    let specifier = specifier.trim_matches('/');
    let mut parts = specifier.splitn(if specifier.starts_with('@') { 3 } else { 2 }, '/');
    let package = if specifier.starts_with('@') {
        let scope = parts.next()?;
        let name = parts.next()?;
        format!("{}/{}", scope, name)
    } else {
        parts.next()?.to_string()
    };
    if package.is_empty() {
        return None;
    }
    let subpath = parts.next().unwrap_or("").to_string();
    Some((package, subpath))
}

/// Candidate base paths (without extension) for an import specifier.
///
/// Relative and absolute specifiers resolve against `base_dir` directly;
/// bare specifiers are looked up under `base_dir/node_modules`.
pub fn candidate_bases(base_dir: &Path, specifier: &str) -> Vec<PathBuf> {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        let trimmed = specifier.trim_start_matches('/');
        return vec![base_dir.join(trimmed)];
    }

    let Some((package, subpath)) = split_specifier(specifier) else {
        return Vec::new();
    };
    let package_root = base_dir.join("node_modules").join(package);
    LAYOUT_DIRS
        .iter()
        .filter(|dir| dir.is_empty() || !subpath.starts_with(&format!("{}/", dir)))
        .map(|dir| {
            let mut base = package_root.clone();
            if !dir.is_empty() {
                base.push(dir);
            }
            if !subpath.is_empty() {
                base.push(&subpath);
            } else {
                base.push("index");
            }
            base
        })
        .collect()
}

/// Probe conventional layouts for an import specifier.
///
/// The first layout directory holding any describing file wins.
pub async fn locate(base_dir: &Path, specifier: &str) -> MetadataFiles {
    for base in candidate_bases(base_dir, specifier) {
        let files = probe(&base).await;
        if !files.is_empty() {
            trace!(specifier, base = %base.display(), "located external metadata files");
            return files;
        }
    }
    MetadataFiles::default()
}

async fn probe(base: &Path) -> MetadataFiles {
    let mut files = MetadataFiles::default();

    let declaration = with_suffix(base, "d.ts");
    if is_file(&declaration).await {
        files.declaration = Some(declaration);
    }

    let schema = with_suffix(base, "json");
    if is_file(&schema).await {
        files.schema = Some(schema);
    }

    for ext in SCRIPT_EXTENSIONS {
        let script = with_suffix(base, ext);
        if is_file(&script).await {
            files.script = Some(script);
            break;
        }
    }

    files
}

/// Append `.suffix` to a path without treating its last dot as an extension.
pub(crate) fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut os = base.as_os_str().to_owned();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

pub(crate) async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
