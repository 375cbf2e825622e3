//! Error types for tree loading and traversal

use acq_core::AcqError;
use thiserror::Error;

/// Errors that can occur while loading or walking a tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// Resolution failed inside the core engine
    #[error(transparent)]
    Acquisition(#[from] AcqError),

    /// Reading the tree file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document parsed but does not describe a tree
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// Path segment could not be resolved
    #[error(
        "Path not found: '{path}' does not exist.\n\
         \n\
         Reached: '{reached}'\n\
         Available names at this level: {available}"
    )]
    PathNotFound {
        /// Full path that was requested
        path: String,
        /// Prefix of the path resolved before the failure
        reached: String,
        /// Comma-separated own attribute names at the failure point
        available: String,
    },
}

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

impl TreeError {
    /// Whether the underlying failure is a missing attribute
    pub fn is_not_found(&self) -> bool {
        match self {
            TreeError::Acquisition(err) => err.is_not_found(),
            TreeError::PathNotFound { .. } => true,
            _ => false,
        }
    }
}
