//! Error types for Ambireader core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid book: {0}")]
    InvalidBook(String),

    #[error("Sound catalog is missing {} key(s): {}", missing.len(), missing.join(", "))]
    IncompleteCatalog { missing: Vec<String> },
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
