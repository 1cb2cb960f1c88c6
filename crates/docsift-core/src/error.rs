//! Docsift error taxonomy.
//!
//! One enum for the whole workspace. The retry layer keys off
//! [`DocsiftError::is_transient`]; everything else propagates with `?`.

use thiserror::Error;

/// Convenience result type used across all docsift crates.
pub type Result<T> = std::result::Result<T, DocsiftError>;

#[derive(Debug, Error)]
pub enum DocsiftError {
    /// Invalid configuration value — fatal, a run never starts.
    #[error("config error: {0}")]
    Config(String),

    /// A single document could not be loaded. Per-file, skip-and-warn.
    #[error("failed to load document '{document}': {message}")]
    DocumentLoad { document: String, message: String },

    /// The queried directory contained no readable supported files.
    #[error("no input documents found in '{0}'")]
    NoInputDocuments(String),

    /// Connection-level HTTP failure (DNS, refused, reset).
    #[error("http error: {0}")]
    Http(String),

    /// The inference request exceeded its deadline.
    #[error("inference request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response from the inference backend.
    #[error("inference API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend answered but the payload was not usable.
    #[error("validation error: {0}")]
    Validation(String),

    /// Cooperative cancellation observed at a stage boundary.
    #[error("run cancelled before stage '{0}'")]
    Cancelled(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocsiftError {
    /// Whether the retry layer should attempt this call again.
    ///
    /// Timeouts, connection failures, and overload/server statuses are
    /// transient; malformed output and client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            DocsiftError::Http(_) | DocsiftError::Timeout(_) => true,
            DocsiftError::Api { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}
