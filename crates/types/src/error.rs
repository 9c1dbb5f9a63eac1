//! Error types for controller configuration resolution

use std::path::PathBuf;
use thiserror::Error;

/// Configuration resolution errors
///
/// Every variant carries the file identifier it was produced for so the
/// message can be shown to an end user as-is.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Unable to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed document, mistyped or missing field, or a failing template function
    #[error("Unable to process file {file}: {message}")]
    Parse { file: String, message: String },

    /// The document does not contain exactly one config resource
    #[error("Unable to process file {file}: expected a single config resource, found {found}")]
    Cardinality { file: String, found: usize },

    /// A feature is used that the active license tier does not support
    #[error(
        "Unable to process file {file}: {field} is set but filters are not supported outside the enterprise tier"
    )]
    UnsupportedFeature { file: String, field: String },
}

impl ConfigError {
    /// Build a parse error from any displayable cause
    pub fn parse(file: &str, cause: impl std::fmt::Display) -> Self {
        ConfigError::Parse {
            file: file.to_string(),
            message: cause.to_string(),
        }
    }

    /// File identifier the error was produced for
    pub fn file(&self) -> String {
        match self {
            ConfigError::Read { path, .. } => path.display().to_string(),
            ConfigError::Parse { file, .. }
            | ConfigError::Cardinality { file, .. }
            | ConfigError::UnsupportedFeature { file, .. } => file.clone(),
        }
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
