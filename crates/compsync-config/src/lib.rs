//! compsync Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.compsync/config.toml`
//! - Local config: `.compsync/config.toml` (in the project)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration for compsync.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Project layout
    pub project: ProjectConfig,

    /// Which files take part in auto-discovery
    pub discovery: DiscoveryConfig,

    /// Ordered resolver list; earlier entries win
    pub resolvers: Vec<ResolverConfig>,

    /// Generated artifact settings
    pub outputs: OutputsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Project layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory that component import paths are relative to
    pub source_root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
        }
    }
}

/// Auto-discovery configuration.
///
/// # Example TOML
///
/// ```toml
/// [discovery]
/// globs = ["components/**/*.wxml", "pages/**/components/*.wxml"]
/// script_extensions = ["ts", "js"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Enable auto-discovery of local components
    pub enabled: bool,

    /// Glob patterns (relative to the source root) selecting eligible markup files
    pub globs: Vec<String>,

    /// Extension of the markup file
    pub markup_extension: String,

    /// Extension of the declarative schema file
    pub schema_extension: String,

    /// Behavior file extensions, in probe order
    pub script_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            globs: vec!["components/**/*.wxml".to_string()],
            markup_extension: "wxml".to_string(),
            schema_extension: "json".to_string(),
            script_extensions: vec!["ts".to_string(), "js".to_string()],
        }
    }
}

/// One entry of the resolver list.
///
/// A resolver may expose a dynamic capability (`prefix` + `package`), a
/// static `components` table, or both.
///
/// # Example TOML
///
/// ```toml
/// [[resolvers]]
/// name = "tdesign"
/// prefix = "t-"
/// package = "tdesign-miniprogram"
/// path_template = "{package}/{stem}/{stem}"
///
/// [resolvers.components]
/// "t-icon" = "tdesign-miniprogram/icon/icon"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Resolver name (used in logs)
    pub name: String,

    /// Tag prefix handled by the dynamic capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Package the prefixed tags come from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Import path template; `{package}`, `{name}` and `{stem}` are substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_template: Option<String>,

    /// Static name → import path table
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, String>,

    /// Explicit metadata files per import path (relative to the project root)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_files: BTreeMap<String, Vec<PathBuf>>,
}

/// Default path template for prefix resolvers.
pub const DEFAULT_PATH_TEMPLATE: &str = "{package}/{stem}/{stem}";

impl ResolverConfig {
    /// Validate a single resolver entry.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid_resolver(
                index,
                "name",
                "resolver name must not be empty",
            ));
        }
        if self.prefix.is_some() && self.package.is_none() {
            return Err(ConfigError::invalid_resolver(
                index,
                "package",
                format!("resolver '{}' has a prefix but no package", self.name),
            ));
        }
        Ok(())
    }

    /// Effective path template for the dynamic capability.
    pub fn path_template(&self) -> &str {
        self.path_template.as_deref().unwrap_or(DEFAULT_PATH_TEMPLATE)
    }
}

/// Settings for all generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputsConfig {
    /// Name → import path manifest
    pub manifest: ManifestOutput,

    /// Typed-declaration artifact
    pub typed: TypedOutput,

    /// Framework-declaration artifact
    pub framework: FrameworkOutput,

    /// Editor tag/attribute schema
    pub editor_schema: EditorSchemaOutput,
}

/// Manifest artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManifestOutput {
    pub enabled: bool,
    /// Output path, relative to the project root
    pub path: PathBuf,
}

impl Default for ManifestOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("auto-import-components.json"),
        }
    }
}

/// Typed-declaration artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypedOutput {
    pub enabled: bool,
    /// Output path, relative to the project root
    pub path: PathBuf,
    /// Name of the type-only module the file declares
    pub module: String,
}

impl Default for TypedOutput {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("typed-components.d.ts"),
            module: "compsync/typed-components".to_string(),
        }
    }
}

/// Framework-declaration artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameworkOutput {
    pub enabled: bool,
    /// Output path, relative to the project root
    pub path: PathBuf,
    /// Module whose global-component registry is augmented
    pub module: String,
    /// Reference property types through the typed module instead of inlining them
    pub reference_typed: bool,
}

impl Default for FrameworkOutput {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("components.d.ts"),
            module: "vue".to_string(),
            reference_typed: false,
        }
    }
}

/// Editor-schema artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSchemaOutput {
    pub enabled: bool,
    /// Output path, relative to the project root
    pub path: PathBuf,
    /// JSON file holding built-in tags merged ahead of generated ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tags: Option<PathBuf>,
}

impl Default for EditorSchemaOutput {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from(".vscode/mini-program.html-data.json"),
            base_tags: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Accepted `logging.level` values.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownLogFormat(s.to_string())),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override source root
    pub source_root: Option<PathBuf>,

    /// Override log level
    pub log_level: Option<String>,

    /// Force the typed-declaration artifact on or off
    pub typed: Option<bool>,

    /// Force the framework-declaration artifact on or off
    pub framework: Option<bool>,

    /// Force the editor-schema artifact on or off
    pub editor_schema: Option<bool>,
}

impl SyncConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref root) = overrides.source_root {
            self.project.source_root = root.clone();
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }

        if let Some(enabled) = overrides.typed {
            self.outputs.typed.enabled = enabled;
        }

        if let Some(enabled) = overrides.framework {
            self.outputs.framework.enabled = enabled;
        }

        if let Some(enabled) = overrides.editor_schema {
            self.outputs.editor_schema.enabled = enabled;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.enabled && self.discovery.globs.is_empty() {
            return Err(ConfigError::EmptyGlobs);
        }
        for pattern in &self.discovery.globs {
            if let Err(e) = globset::Glob::new(pattern) {
                return Err(ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                });
            }
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::UnknownLogLevel(self.logging.level.clone()));
        }
        for (index, resolver) in self.resolvers.iter().enumerate() {
            resolver.validate(index)?;
        }
        Ok(())
    }

    /// The effective source root, which must be an existing directory.
    pub fn existing_source_root(&self, project_root: &Path) -> Result<PathBuf, ConfigError> {
        let root = self.source_root(project_root);
        if root.is_dir() {
            Ok(root)
        } else {
            Err(ConfigError::SourceRootMissing(root))
        }
    }

    /// Get the effective source root for a project.
    pub fn source_root(&self, project_root: &Path) -> PathBuf {
        resolve_against(project_root, &self.project.source_root)
    }

    /// Whether any artifact needs per-component property metadata.
    pub fn needs_metadata(&self) -> bool {
        self.outputs.typed.enabled
            || self.outputs.framework.enabled
            || self.outputs.editor_schema.enabled
    }
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else if path == Path::new(".") {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.project.source_root, PathBuf::from("."));
        assert_eq!(config.discovery.globs, vec!["components/**/*.wxml"]);
        assert!(config.outputs.manifest.enabled);
        assert!(!config.outputs.typed.enabled);
        assert!(!config.needs_metadata());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = SyncConfig::default();
        let overrides = ConfigOverrides {
            source_root: Some(PathBuf::from("src")),
            log_level: Some("debug".to_string()),
            typed: Some(true),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.project.source_root, PathBuf::from("src"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.outputs.typed.enabled);
        assert!(config.needs_metadata());
    }

    #[test]
    fn test_source_root_resolution() {
        let mut config = SyncConfig::default();
        let project = PathBuf::from("/home/user/app");
        assert_eq!(config.source_root(&project), project);

        config.project.source_root = PathBuf::from("miniprogram");
        assert_eq!(
            config.source_root(&project),
            PathBuf::from("/home/user/app/miniprogram")
        );

        config.project.source_root = PathBuf::from("/elsewhere");
        assert_eq!(config.source_root(&project), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_validate_empty_globs() {
        let mut config = SyncConfig::default();
        config.discovery.globs.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("globs"));

        config.discovery.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_resolver_prefix_without_package() {
        let mut config = SyncConfig::default();
        config.resolvers.push(ResolverConfig {
            name: "broken".to_string(),
            prefix: Some("x-".to_string()),
            ..Default::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("resolvers[0].package"));
    }

    #[test]
    fn test_validate_bad_glob_and_level() {
        let mut config = SyncConfig::default();
        config.discovery.globs.push("components/[*.wxml".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { ref pattern, .. } if pattern == "components/[*.wxml"));

        let mut config = SyncConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownLogLevel(_))));
    }

    #[test]
    fn test_existing_source_root() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("miniprogram")).unwrap();

        let mut config = SyncConfig::default();
        config.project.source_root = PathBuf::from("miniprogram");
        assert_eq!(
            config.existing_source_root(temp.path()).unwrap(),
            temp.path().join("miniprogram")
        );

        config.project.source_root = PathBuf::from("missing");
        assert!(matches!(
            config.existing_source_root(temp.path()),
            Err(ConfigError::SourceRootMissing(_))
        ));
    }

    #[test]
    fn test_validate_resolver_name() {
        let mut config = SyncConfig::default();
        config.resolvers.push(ResolverConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_resolver_config_toml() {
        let toml_str = r#"
            [[resolvers]]
            name = "tdesign"
            prefix = "t-"
            package = "tdesign-miniprogram"

            [resolvers.components]
            "t-icon" = "tdesign-miniprogram/icon/icon"

            [outputs.framework]
            enabled = true
            reference_typed = true
        "#;

        let config: SyncConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resolvers.len(), 1);
        let resolver = &config.resolvers[0];
        assert_eq!(resolver.path_template(), DEFAULT_PATH_TEMPLATE);
        assert_eq!(
            resolver.components.get("t-icon").map(String::as_str),
            Some("tdesign-miniprogram/icon/icon")
        );
        assert!(config.outputs.framework.enabled);
        assert!(config.outputs.framework.reference_typed);
        assert_eq!(config.outputs.framework.module, "vue");
    }
}
