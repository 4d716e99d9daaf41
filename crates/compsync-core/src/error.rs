//! Error types for compsync-core

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while persisting a generated artifact.
///
/// These never reach the session's caller: the scheduler logs them and the
/// next scheduled run retries.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Failed to create the artifact's parent directory
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the artifact
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a file the artifact is derived from
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize artifact contents
    #[error("Failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An input file has an unexpected shape
    #[error("Invalid {path}: {message}")]
    InvalidInput { path: PathBuf, message: String },
}

impl SyncError {
    pub fn create_dir(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn read(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn serialize(artifact: &'static str, source: serde_json::Error) -> Self {
        Self::Serialize { artifact, source }
    }

    pub fn invalid_input(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Errors raised when constructing a [`crate::SyncSession`].
///
/// Both indicate a host that skipped a required setup step.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required collaborator was never supplied
    #[error("{0} was not provided before building the session")]
    MissingService(&'static str),

    /// The project root does not exist or is not a directory
    #[error("Project root {0} is not a directory")]
    InvalidProjectRoot(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::write(
            "/app/out.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to write /app/out.json: denied");

        let err = SessionError::MissingService("configuration");
        assert_eq!(
            err.to_string(),
            "configuration was not provided before building the session"
        );
    }
}
