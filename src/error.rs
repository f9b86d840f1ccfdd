//! Error types for codemd

use thiserror::Error;

/// Result type alias for codemd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CLI and report renderer
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] codemd_core::Error),

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
