//! Soundscape error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoundscapeError {
    #[error("Invalid soundscape base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Soundscape request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("Soundscape request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid soundscape response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SoundscapeResult<T> = Result<T, SoundscapeError>;
