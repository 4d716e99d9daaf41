//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create config directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Discovery is on but nothing could ever match
    #[error("discovery is enabled but discovery.globs is empty")]
    EmptyGlobs,

    #[error("invalid discovery glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// A `[[resolvers]]` entry that cannot be turned into a resolver
    #[error("invalid resolver at '{key}': {message}")]
    InvalidResolver { key: String, message: String },

    #[error("unknown log format '{0}'. Valid values: text, json")]
    UnknownLogFormat(String),

    #[error("unknown log level '{0}'. Valid values: trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    /// The configured source root does not exist under the project
    #[error("source root '{0}' is not a directory")]
    SourceRootMissing(PathBuf),
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Resolver entry `index` failed validation on `field`.
    pub fn invalid_resolver(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self::InvalidResolver {
            key: format!("resolvers[{}].{}", index, field),
            message: message.into(),
        }
    }
}
