//! Session error types

use ar_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot open book: {0}")]
    InvalidBook(#[from] CoreError),

    #[error("Preferences IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
