//! Error types for codemd-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for codemd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments
#[derive(Error, Debug)]
pub enum Error {
    /// Payload parsed as JSON but does not have the expected shape
    #[error("Malformed input at {location}: {reason}")]
    MalformedInput { location: String, reason: String },

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// The active subset holds no records
    #[error("No records in the current selection")]
    EmptySelection,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A single view failed to redraw
    #[error("Failed to render view '{view}': {reason}")]
    RenderError { view: String, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
