//! Audio error types

use crate::backend::SoundId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio output device: {0}")]
    NoDevice(String),

    #[error("Unknown sound handle: {0}")]
    UnknownSound(SoundId),

    #[error("Failed to open asset {path}: {source}")]
    AssetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode asset {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Backend rejected request: {0}")]
    Rejected(String),

    #[error("Audio backend is shut down")]
    BackendClosed,
}

pub type AudioResult<T> = Result<T, AudioError>;
