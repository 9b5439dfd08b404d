//! In-Memory Backend
//!
//! Simulated device with no output. It models load latency and one-shot
//! length on tokio time, which makes it usable both for muted reading and
//! for deterministic tests under a paused clock.

use crate::backend::{AudioBackend, LoadOptions, PlaybackStatus, SoundId};
use crate::error::{AudioError, AudioResult};
use ar_core::SoundAsset;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Timing model for simulated sounds
#[derive(Debug, Clone)]
pub struct MemoryBackendConfig {
    /// Default time a load takes
    pub load_latency: Duration,
    /// Length of every non-looping sound
    pub one_shot_length: Duration,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            load_latency: Duration::from_millis(20),
            one_shot_length: Duration::from_millis(1500),
        }
    }
}

/// Operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub loads: usize,
    pub failed_loads: usize,
    pub plays: usize,
    pub stops: usize,
    pub unloads: usize,
}

#[derive(Debug)]
struct MemorySound {
    key: &'static str,
    looping: bool,
    volume: f32,
    playing: bool,
    finished: bool,
    started_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sounds: HashMap<SoundId, MemorySound>,
    load_delays: HashMap<String, Duration>,
    failing_loads: HashSet<String>,
    failing_plays: HashSet<String>,
    load_log: Vec<&'static str>,
    stats: BackendStats,
}

/// Device simulation backed by a map of handles
pub struct MemoryBackend {
    config: MemoryBackendConfig,
    next_id: AtomicU64,
    state: Mutex<MemoryState>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Override load latency for one asset key
    pub fn set_load_delay(&self, key: &str, delay: Duration) {
        self.state.lock().load_delays.insert(key.to_string(), delay);
    }

    /// Make every load of `key` fail
    pub fn fail_loads(&self, key: &str) {
        self.state.lock().failing_loads.insert(key.to_string());
    }

    /// Make every play of `key` fail
    pub fn fail_plays(&self, key: &str) {
        self.state.lock().failing_plays.insert(key.to_string());
    }

    pub fn stats(&self) -> BackendStats {
        self.state.lock().stats.clone()
    }

    /// Keys in load order, including loads later unloaded
    pub fn load_log(&self) -> Vec<&'static str> {
        self.state.lock().load_log.clone()
    }

    /// Handles currently loaded
    pub fn live_count(&self) -> usize {
        self.state.lock().sounds.len()
    }

    /// Keys of currently loaded handles, sorted
    pub fn live_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.state.lock().sounds.values().map(|s| s.key).collect();
        keys.sort_unstable();
        keys
    }

    pub fn is_loaded(&self, id: SoundId) -> bool {
        self.state.lock().sounds.contains_key(&id)
    }

    pub fn volume(&self, id: SoundId) -> Option<f32> {
        self.state.lock().sounds.get(&id).map(|s| s.volume)
    }

    fn with_sound<T>(&self, id: SoundId, f: impl FnOnce(&mut MemorySound) -> T) -> AudioResult<T> {
        let mut state = self.state.lock();
        state
            .sounds
            .get_mut(&id)
            .map(f)
            .ok_or(AudioError::UnknownSound(id))
    }
}

#[async_trait]
impl AudioBackend for MemoryBackend {
    async fn load(&self, asset: &SoundAsset, options: LoadOptions) -> AudioResult<SoundId> {
        let delay = self
            .state
            .lock()
            .load_delays
            .get(asset.key)
            .copied()
            .unwrap_or(self.config.load_latency);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_loads.contains(asset.key) {
            state.stats.failed_loads += 1;
            return Err(AudioError::Rejected(format!("load of {}", asset.key)));
        }

        let id = SoundId(self.next_id.fetch_add(1, Ordering::Relaxed));
        state.sounds.insert(
            id,
            MemorySound {
                key: asset.key,
                looping: options.looping,
                volume: options.volume.clamp(0.0, 1.0),
                playing: false,
                finished: false,
                started_at: None,
            },
        );
        state.load_log.push(asset.key);
        state.stats.loads += 1;
        Ok(id)
    }

    async fn play(&self, id: SoundId) -> AudioResult<()> {
        let mut state = self.state.lock();
        let key = state
            .sounds
            .get(&id)
            .map(|s| s.key)
            .ok_or(AudioError::UnknownSound(id))?;
        if state.failing_plays.contains(key) {
            return Err(AudioError::Rejected(format!("play of {}", key)));
        }
        if let Some(sound) = state.sounds.get_mut(&id) {
            sound.playing = true;
            sound.finished = false;
            sound.started_at = Some(Instant::now());
        }
        state.stats.plays += 1;
        Ok(())
    }

    async fn stop(&self, id: SoundId) -> AudioResult<()> {
        self.with_sound(id, |sound| sound.playing = false)?;
        self.state.lock().stats.stops += 1;
        Ok(())
    }

    async fn unload(&self, id: SoundId) -> AudioResult<()> {
        let mut state = self.state.lock();
        state
            .sounds
            .remove(&id)
            .ok_or(AudioError::UnknownSound(id))?;
        state.stats.unloads += 1;
        Ok(())
    }

    async fn set_volume(&self, id: SoundId, volume: f32) -> AudioResult<()> {
        self.with_sound(id, |sound| sound.volume = volume.clamp(0.0, 1.0))
    }

    async fn status(&self, id: SoundId) -> AudioResult<PlaybackStatus> {
        let one_shot_length = self.config.one_shot_length;
        self.with_sound(id, |sound| {
            let ran_out = !sound.looping
                && sound
                    .started_at
                    .is_some_and(|started| started.elapsed() >= one_shot_length);
            if sound.playing && ran_out {
                sound.playing = false;
                sound.finished = true;
            }
            PlaybackStatus {
                playing: sound.playing,
                finished: sound.finished,
                volume: sound.volume,
            }
        })
    }
}
