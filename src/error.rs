//! Error types for the gateway merge engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway merge errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid document {}: {message}", .path.display())]
    InvalidDocument { path: PathBuf, message: String },

    #[error("Invalid suite name: {0:?}")]
    InvalidSuite(String),

    #[error("Failed to render gateway document: {0}")]
    Render(String),

    #[error("{count} unresolved schema reference(s): {}", .references.join(", "))]
    UnresolvedReferences { count: usize, references: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl GatewayError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}
