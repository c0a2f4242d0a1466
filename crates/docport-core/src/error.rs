//! Error types for the docport core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for docport.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The metadata document lacks a usable `hierarchy` block.
    #[error("Malformed hierarchy in {path}: {message}")]
    MalformedHierarchy { path: PathBuf, message: String },

    /// The metadata document is not valid YAML or misses required fields.
    #[error("Malformed metadata in {path}: {message}")]
    MalformedMetadata { path: PathBuf, message: String },

    /// A requested sub-path would escape its root.
    ///
    /// The message is for logs only and must never be sent to clients.
    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    /// Requested content or metadata does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a new malformed hierarchy error.
    pub fn malformed_hierarchy(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedHierarchy {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed metadata error.
    pub fn malformed_metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new path traversal error.
    pub fn traversal(requested: impl Into<String>) -> Self {
        Self::PathTraversal(requested.into())
    }

    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether callers should present this error as a plain "not found".
    ///
    /// Traversal attempts are folded into not-found so responses never
    /// reveal anything about the layout behind the root.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::PathTraversal(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
