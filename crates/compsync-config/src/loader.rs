//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.compsync/config.toml`
//! 2. Local config: `.compsync/config.toml` (in the project)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, DiscoveryConfig, EditorSchemaOutput, FrameworkOutput, LoggingConfig,
    ManifestOutput, OutputsConfig, ProjectConfig, SyncConfig, TypedOutput,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".compsync";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".compsync";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.compsync`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<SyncConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.compsync`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a project.
    pub fn local_config_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a project with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates.
    pub fn load(
        &mut self,
        project_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<SyncConfig, ConfigError> {
        let mut config = SyncConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(project_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<SyncConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a project.
    pub fn load_local(&self, project_root: &Path) -> Result<Option<SyncConfig>, ConfigError> {
        let local_path = self.local_config_path(project_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Load a configuration file from an explicit path, without merging.
    pub fn load_file(&self, path: &Path) -> Result<SyncConfig, ConfigError> {
        let config = load_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the local config file for a project.
    pub fn save_local(&self, project_root: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(project_root);
        save_config_file(&local_path, config)
    }

    /// Initialize local configuration for a project.
    ///
    /// Creates `.compsync/config.toml` with default configuration.
    pub fn init_local(&self, project_root: &Path) -> Result<PathBuf, ConfigError> {
        let local_dir = project_root.join(LOCAL_CONFIG_DIR);

        if !local_dir.exists() {
            std::fs::create_dir_all(&local_dir)
                .map_err(|e| ConfigError::create_dir(&local_dir, e))?;
        }

        let config_path = local_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            save_config_file(&config_path, &SyncConfig::default())?;
        }

        Ok(config_path)
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Keep `overlay` if it differs from the default, otherwise keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if &overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// This performs a field-by-field merge, allowing partial configs.
fn merge_configs(base: SyncConfig, overlay: SyncConfig) -> SyncConfig {
    SyncConfig {
        project: merge_project(base.project, overlay.project),
        discovery: merge_discovery(base.discovery, overlay.discovery),
        // A resolver list is an ordered unit; a non-empty overlay replaces it
        resolvers: if overlay.resolvers.is_empty() {
            base.resolvers
        } else {
            overlay.resolvers
        },
        outputs: merge_outputs(base.outputs, overlay.outputs),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_project(base: ProjectConfig, overlay: ProjectConfig) -> ProjectConfig {
    let default = ProjectConfig::default();
    ProjectConfig {
        source_root: pick(base.source_root, overlay.source_root, &default.source_root),
    }
}

fn merge_discovery(base: DiscoveryConfig, overlay: DiscoveryConfig) -> DiscoveryConfig {
    let default = DiscoveryConfig::default();
    DiscoveryConfig {
        enabled: pick(base.enabled, overlay.enabled, &default.enabled),
        globs: pick(base.globs, overlay.globs, &default.globs),
        markup_extension: pick(
            base.markup_extension,
            overlay.markup_extension,
            &default.markup_extension,
        ),
        schema_extension: pick(
            base.schema_extension,
            overlay.schema_extension,
            &default.schema_extension,
        ),
        script_extensions: pick(
            base.script_extensions,
            overlay.script_extensions,
            &default.script_extensions,
        ),
    }
}

/// Merge artifact settings.
fn merge_outputs(base: OutputsConfig, overlay: OutputsConfig) -> OutputsConfig {
    let manifest = ManifestOutput::default();
    let typed = TypedOutput::default();
    let framework = FrameworkOutput::default();
    let editor_schema = EditorSchemaOutput::default();

    OutputsConfig {
        manifest: ManifestOutput {
            enabled: pick(
                base.manifest.enabled,
                overlay.manifest.enabled,
                &manifest.enabled,
            ),
            path: pick(base.manifest.path, overlay.manifest.path, &manifest.path),
        },
        typed: TypedOutput {
            enabled: pick(base.typed.enabled, overlay.typed.enabled, &typed.enabled),
            path: pick(base.typed.path, overlay.typed.path, &typed.path),
            module: pick(base.typed.module, overlay.typed.module, &typed.module),
        },
        framework: FrameworkOutput {
            enabled: pick(
                base.framework.enabled,
                overlay.framework.enabled,
                &framework.enabled,
            ),
            path: pick(base.framework.path, overlay.framework.path, &framework.path),
            module: pick(
                base.framework.module,
                overlay.framework.module,
                &framework.module,
            ),
            reference_typed: pick(
                base.framework.reference_typed,
                overlay.framework.reference_typed,
                &framework.reference_typed,
            ),
        },
        editor_schema: EditorSchemaOutput {
            enabled: pick(
                base.editor_schema.enabled,
                overlay.editor_schema.enabled,
                &editor_schema.enabled,
            ),
            path: pick(
                base.editor_schema.path,
                overlay.editor_schema.path,
                &editor_schema.path,
            ),
            base_tags: overlay.editor_schema.base_tags.or(base.editor_schema.base_tags),
        },
    }
}

/// Merge logging config.
fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let default = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, &default.level),
        format: pick(base.format, overlay.format, &default.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolverConfig;
    use tempfile::TempDir;

    fn create_test_config(content: &str, dir: &Path) -> PathBuf {
        let config_dir = dir.join(".compsync");
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn test_load_local_config() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        create_test_config(
            r#"
            [project]
            source_root = "miniprogram"

            [outputs.typed]
            enabled = true
            path = "types/components.d.ts"
            "#,
            temp.path(),
        );

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.project.source_root, PathBuf::from("miniprogram"));
        assert!(config.outputs.typed.enabled);
        assert_eq!(
            config.outputs.typed.path,
            PathBuf::from("types/components.d.ts")
        );
        assert!(config.outputs.manifest.enabled);
    }

    #[test]
    fn test_local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");

        std::fs::create_dir_all(&global_dir).unwrap();
        std::fs::write(
            global_dir.join("config.toml"),
            r#"
            [logging]
            level = "debug"

            [[resolvers]]
            name = "global-ui"
            prefix = "g-"
            package = "global-ui"
            "#,
        )
        .unwrap();

        create_test_config(
            r#"
            [[resolvers]]
            name = "tdesign"
            prefix = "t-"
            package = "tdesign-miniprogram"
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.resolvers.len(), 1);
        assert_eq!(config.resolvers[0].name, "tdesign");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_global_disable_survives_unset_local() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");

        std::fs::create_dir_all(&global_dir).unwrap();
        std::fs::write(
            global_dir.join("config.toml"),
            r#"
            [discovery]
            enabled = false

            [outputs.manifest]
            enabled = false
            "#,
        )
        .unwrap();

        create_test_config(
            r#"
            [outputs.typed]
            enabled = true
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert!(!config.discovery.enabled);
        assert!(!config.outputs.manifest.enabled);
        assert!(config.outputs.typed.enabled);
    }

    #[test]
    fn test_cli_overrides_all() {
        let temp = TempDir::new().unwrap();

        create_test_config(
            r#"
            [outputs.editor_schema]
            enabled = true
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let overrides = ConfigOverrides {
            editor_schema: Some(false),
            log_level: Some("trace".to_string()),
            ..Default::default()
        };

        let config = loader.load(temp.path(), Some(&overrides)).unwrap();

        assert!(!config.outputs.editor_schema.enabled);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        create_test_config(
            r#"
            [[resolvers]]
            name = "broken"
            prefix = "b-"
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        assert!(loader.load(temp.path(), None).is_err());
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        create_test_config("[outputs\nenabled = ", temp.path());

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let mut config = SyncConfig::default();
        config.outputs.framework.enabled = true;
        config.outputs.framework.module = "wevu".to_string();
        config.resolvers.push(ResolverConfig {
            name: "vant".to_string(),
            prefix: Some("van-".to_string()),
            package: Some("@vant/weapp".to_string()),
            ..Default::default()
        });

        loader.save_local(temp.path(), &config).unwrap();

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let loaded = loader.load(temp.path(), None).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_init_local_creates_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config_path = loader.init_local(temp.path()).unwrap();

        assert!(config_path.exists());
        assert!(config_path.ends_with(".compsync/config.toml"));

        let content = std::fs::read_to_string(&config_path).unwrap();
        let _: SyncConfig = toml::from_str(&content).unwrap();
    }

    #[test]
    fn test_outputs_merge_keeps_base_paths() {
        let mut base = OutputsConfig::default();
        base.typed.path = PathBuf::from("typings/components.d.ts");
        base.editor_schema.base_tags = Some(PathBuf::from("builtin-tags.json"));

        let mut overlay = OutputsConfig::default();
        overlay.typed.enabled = true;

        let merged = merge_outputs(base, overlay);

        assert!(merged.typed.enabled);
        assert_eq!(merged.typed.path, PathBuf::from("typings/components.d.ts"));
        assert_eq!(
            merged.editor_schema.base_tags,
            Some(PathBuf::from("builtin-tags.json"))
        );
    }

    #[test]
    fn test_cache_clearing() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");

        std::fs::create_dir_all(&global_dir).unwrap();
        std::fs::write(
            global_dir.join("config.toml"),
            r#"
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let mut loader = ConfigLoader::with_global_dir(&global_dir);

        let _ = loader.load_global().unwrap();
        assert!(loader.global_config.is_some());

        loader.clear_cache();
        assert!(loader.global_config.is_none());
    }
}
