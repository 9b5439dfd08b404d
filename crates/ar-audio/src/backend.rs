//! Audio Backend Seam
//!
//! The orchestrator never decodes or mixes anything itself. It drives an
//! opaque device through six operations on a [`SoundId`] handle.

use crate::error::AudioResult;
use ar_core::SoundAsset;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Opaque handle to a loaded sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SoundId(pub u64);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a sound is prepared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Repeat until stopped
    pub looping: bool,
    /// Initial volume (0.0-1.0)
    pub volume: f32,
}

impl LoadOptions {
    /// Muted loop for an incoming carpet
    pub const fn carpet() -> Self {
        Self {
            looping: true,
            volume: 0.0,
        }
    }

    /// Quiet one-shot that is faded in after play
    pub const fn one_shot(volume: f32) -> Self {
        Self {
            looping: false,
            volume,
        }
    }
}

/// Snapshot of a loaded sound
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackStatus {
    pub playing: bool,
    /// Reached its natural end (never true for loops)
    pub finished: bool,
    pub volume: f32,
}

impl PlaybackStatus {
    /// No longer producing sound, either finished or stopped
    #[inline]
    pub fn is_done(&self) -> bool {
        self.finished || !self.playing
    }
}

/// Device operations consumed by the orchestrator.
///
/// Implementations must tolerate calls on handles that were already
/// unloaded by returning [`AudioError::UnknownSound`](crate::AudioError::UnknownSound).
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Prepare `asset` without starting it
    async fn load(&self, asset: &SoundAsset, options: LoadOptions) -> AudioResult<SoundId>;

    /// Start or resume playback
    async fn play(&self, id: SoundId) -> AudioResult<()>;

    /// Stop playback (the handle stays loaded)
    async fn stop(&self, id: SoundId) -> AudioResult<()>;

    /// Release the handle
    async fn unload(&self, id: SoundId) -> AudioResult<()>;

    /// Set volume (0.0-1.0)
    async fn set_volume(&self, id: SoundId, volume: f32) -> AudioResult<()>;

    /// Query playback state
    async fn status(&self, id: SoundId) -> AudioResult<PlaybackStatus>;
}
