//! Common test utilities for integration tests.
//!
//! Builds throwaway component projects in temporary directories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use compsync_config::{ResolverConfig, SyncConfig};
use compsync_core::SyncSession;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A project directory that is removed when dropped.
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("create parent dirs");
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("read {}: {}", relative, e))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Write a local component (markup, schema, behavior) at `base` and
    /// return its markup path.
    pub fn component(&self, base: &str, properties: Value, script: &str) -> PathBuf {
        let schema = json!({ "component": true, "properties": properties });
        self.write(
            &format!("{}.json", base),
            &serde_json::to_string_pretty(&schema).expect("serialize schema"),
        );
        self.write(&format!("{}.ts", base), script);
        self.write(&format!("{}.wxml", base), "<view><slot/></view>")
    }

    /// Write a packaged component under `node_modules/<package>/<subpath>`.
    pub fn package_component(&self, package: &str, subpath: &str, schema: &str, dts: &str) {
        let base = format!("node_modules/{}/{}", package, subpath);
        self.write(&format!("{}.json", base), schema);
        self.write(&format!("{}.js", base), "Component({})");
        self.write(&format!("{}.d.ts", base), dts);
    }
}

/// Configuration with every artifact enabled.
pub fn all_outputs() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.outputs.typed.enabled = true;
    config.outputs.framework.enabled = true;
    config.outputs.editor_schema.enabled = true;
    config
}

/// A prefix resolver mapping `t-*` to `ui-kit/<stem>/<stem>`.
pub fn ui_kit_resolver() -> ResolverConfig {
    ResolverConfig {
        name: "ui-kit".to_string(),
        prefix: Some("t-".to_string()),
        package: Some("ui-kit".to_string()),
        ..Default::default()
    }
}

pub fn session(project: &FixtureProject, config: SyncConfig) -> SyncSession {
    SyncSession::builder()
        .project_root(project.root())
        .config(config)
        .build()
        .expect("build session")
}
