//! Error types for loading and rendering manifests.
//!
//! Resource generation itself is infallible; these errors come from the
//! layer that reads user input and writes the rendered output.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for manifest operations
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the manifest failed
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid YAML or does not match the ValkeyCluster schema
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing required field in resource
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Manifest declares a different apiVersion or kind
    #[error("Expected {expected}, found {found}")]
    WrongKind { expected: String, found: String },
}

impl Error {
    /// Process exit status for this error: 2 for bad input, 1 otherwise
    pub fn exit_status(&self) -> u8 {
        if self.is_user_error() { 2 } else { 1 }
    }

    /// Check if this error was caused by the input rather than the environment
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Yaml(_) | Error::MissingField(_) | Error::WrongKind { .. } => true,
            Error::Io { .. } | Error::Json(_) => false,
        }
    }
}

/// Result type alias for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
