//! Audio Orchestrator
//!
//! Two logical slots share one device:
//!
//! ```text
//! carpet:    Idle → Loading → Playing → (Crossfading → Playing) | (FadingOut → Idle)
//! one-shot:  Loading → Playing → Finished (auto-unload), any number at once
//! ```
//!
//! ## Commit Rules
//!
//! - A carpet swap may only commit while it holds the current swap token.
//!   A stale load is unloaded by the operation that made it.
//! - A one-shot may only join the live set while its generation is current.
//! - `stop_all` bumps both counters and empties every slot synchronously, so
//!   it wins over any load or fade still in flight.
//! - Locks are never held across an `.await`.

use crate::backend::{AudioBackend, LoadOptions, SoundId};
use crate::fade::{DEFAULT_FADE_STEPS, Fade, FadeCurve, FadeOutcome, run_fade};
use ar_core::SoundCatalog;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Volumes and fade timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Carpet volume once faded in
    pub carpet_volume: f32,
    /// Crossfade length used by the session for page changes (ms)
    pub carpet_fade_ms: u32,
    /// One-shot volume once faded in
    pub trigger_volume: f32,
    /// One-shot volume at play start
    pub trigger_initial_volume: f32,
    /// One-shot fade-in length (ms)
    pub trigger_fade_ms: u32,
    /// Discrete steps per fade
    pub fade_steps: u32,
    /// Fade shaping
    pub fade_curve: FadeCurve,
    /// One-shot completion polling interval (ms)
    pub status_poll_ms: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            carpet_volume: 0.6,
            carpet_fade_ms: 1500,
            trigger_volume: 1.0,
            trigger_initial_volume: 0.1,
            trigger_fade_ms: 300,
            fade_steps: DEFAULT_FADE_STEPS,
            fade_curve: FadeCurve::Linear,
            status_poll_ms: 100,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SLOT STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Observable carpet slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CarpetPhase {
    /// Nothing loaded
    Idle,
    /// A swap holding the current token is loading
    Loading,
    /// One carpet playing
    Playing,
    /// New carpet fading in while the previous fades out
    Crossfading,
    /// No active carpet, previous one still fading out
    FadingOut,
}

#[derive(Debug, Clone, Copy)]
struct CarpetSlot {
    id: SoundId,
    key: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct PendingCarpet {
    key: &'static str,
    token: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    swap_token: u64,
    one_shot_generation: u64,
    carpet: Option<CarpetSlot>,
    pending: Option<PendingCarpet>,
    fading_in: Option<SoundId>,
    /// Former carpets fading out, owned until released
    retiring: HashMap<SoundId, &'static str>,
    one_shots: HashMap<SoundId, &'static str>,
}

enum Commit {
    Stale,
    Committed(Option<CarpetSlot>),
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Exclusive owner of every audio handle in a reading session
pub struct AudioOrchestrator {
    backend: Arc<dyn AudioBackend>,
    catalog: Arc<SoundCatalog>,
    config: OrchestratorConfig,
    state: Mutex<SlotState>,
}

impl AudioOrchestrator {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        catalog: Arc<SoundCatalog>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            backend,
            catalog,
            config,
            state: Mutex::new(SlotState::default()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<SoundCatalog> {
        &self.catalog
    }

    /// Current swap token
    pub fn swap_token(&self) -> u64 {
        self.state.lock().swap_token
    }

    /// Canonical key of the active carpet
    pub fn active_carpet(&self) -> Option<&'static str> {
        self.state.lock().carpet.map(|c| c.key)
    }

    pub fn carpet_phase(&self) -> CarpetPhase {
        let state = self.state.lock();
        if state.pending.is_some() {
            CarpetPhase::Loading
        } else if state.carpet.is_some() {
            if state.fading_in.is_some() && !state.retiring.is_empty() {
                CarpetPhase::Crossfading
            } else {
                CarpetPhase::Playing
            }
        } else if !state.retiring.is_empty() {
            CarpetPhase::FadingOut
        } else {
            CarpetPhase::Idle
        }
    }

    /// One-shots currently owned
    pub fn active_one_shots(&self) -> usize {
        self.state.lock().one_shots.len()
    }

    /// Every handle the orchestrator is responsible for releasing
    pub fn owned_handles(&self) -> usize {
        let state = self.state.lock();
        state.carpet.iter().count() + state.retiring.len() + state.one_shots.len()
    }

    // ─── Carpet ─────────────────────────────────────────────────────────────

    /// Crossfade to the carpet `asset_key` over `fade_ms`.
    ///
    /// No-op when the key is already the active carpet or already loading
    /// under the current token. An unknown key fades the carpet to silence.
    pub async fn play_carpet(&self, asset_key: &str, fade_ms: u32) {
        let Some(asset) = self.catalog.resolve(asset_key) else {
            log::debug!(
                "[Orchestrator] No asset for carpet '{}', fading to silence",
                asset_key
            );
            self.stop_carpet(fade_ms).await;
            return;
        };

        let token = {
            let mut state = self.state.lock();
            let current = state.swap_token;
            if state
                .pending
                .is_some_and(|p| p.key == asset.key && p.token == current)
            {
                log::trace!("[Orchestrator] {} already loading", asset.key);
                None
            } else if state.carpet.is_some_and(|c| c.key == asset.key) {
                // Re-requesting the active carpet cancels any swap away from it
                if state.pending.take().is_some() {
                    state.swap_token += 1;
                }
                None
            } else {
                state.swap_token += 1;
                let token = state.swap_token;
                state.pending = Some(PendingCarpet {
                    key: asset.key,
                    token,
                });
                Some(token)
            }
        };
        let Some(token) = token else {
            return;
        };

        log::debug!("[Orchestrator] Carpet swap #{} → {}", token, asset.key);

        let id = match self.backend.load(asset, LoadOptions::carpet()).await {
            Ok(id) => id,
            Err(e) => {
                log::warn!("[Orchestrator] Carpet load failed for {}: {}", asset.key, e);
                let mut state = self.state.lock();
                if state.pending.is_some_and(|p| p.token == token) {
                    state.pending = None;
                }
                return;
            }
        };

        let commit = {
            let mut state = self.state.lock();
            if state.swap_token != token {
                Commit::Stale
            } else {
                state.pending = None;
                let previous = state.carpet.replace(CarpetSlot { id, key: asset.key });
                if let Some(prev) = previous {
                    state.retiring.insert(prev.id, prev.key);
                }
                state.fading_in = Some(id);
                Commit::Committed(previous)
            }
        };

        let previous = match commit {
            Commit::Stale => {
                log::debug!(
                    "[Orchestrator] Carpet swap #{} superseded, discarding {}",
                    token,
                    asset.key
                );
                self.release(id).await;
                return;
            }
            Commit::Committed(previous) => previous,
        };

        if let Err(e) = self.backend.play(id).await {
            log::warn!("[Orchestrator] Carpet {} failed to start: {}", asset.key, e);
        }

        let fade_out = async {
            if let Some(prev) = previous {
                self.retire(prev.id, fade_ms).await;
            }
        };
        tokio::join!(self.fade_in_carpet(id, fade_ms), fade_out);
    }

    /// Fade the active carpet out and release it.
    ///
    /// Always invalidates in-flight swaps; a no-op for the slot when nothing
    /// is playing.
    pub async fn stop_carpet(&self, fade_ms: u32) {
        let carpet = {
            let mut state = self.state.lock();
            state.swap_token += 1;
            state.pending = None;
            state.fading_in = None;
            let carpet = state.carpet.take();
            if let Some(c) = carpet {
                state.retiring.insert(c.id, c.key);
            }
            carpet
        };

        match carpet {
            Some(carpet) => {
                log::debug!("[Orchestrator] Fading out carpet {}", carpet.key);
                self.retire(carpet.id, fade_ms).await;
            }
            None => log::trace!("[Orchestrator] stop_carpet with no active carpet"),
        }
    }

    fn owns_carpet(&self, id: SoundId) -> bool {
        self.state.lock().carpet.is_some_and(|c| c.id == id)
    }

    async fn fade_in_carpet(&self, id: SoundId, fade_ms: u32) {
        let fade = Fade::new(0.0, self.config.carpet_volume, fade_ms, self.config.fade_steps)
            .with_curve(self.config.fade_curve);
        let outcome = run_fade(self.backend.as_ref(), id, fade, || self.owns_carpet(id)).await;

        let mut state = self.state.lock();
        if state.fading_in == Some(id) {
            state.fading_in = None;
        }
        if outcome != FadeOutcome::Completed {
            log::trace!("[Orchestrator] Carpet {} fade-in ended {:?}", id, outcome);
        }
    }

    /// Fade a retiring carpet to zero, then stop and unload it if still owned
    async fn retire(&self, id: SoundId, fade_ms: u32) {
        let from = match self.backend.status(id).await {
            Ok(status) => status.volume,
            Err(_) => self.config.carpet_volume,
        };
        let fade = Fade::new(from, 0.0, fade_ms, self.config.fade_steps)
            .with_curve(self.config.fade_curve);
        run_fade(self.backend.as_ref(), id, fade, || {
            self.state.lock().retiring.contains_key(&id)
        })
        .await;

        let still_owned = self.state.lock().retiring.remove(&id).is_some();
        if still_owned {
            self.release(id).await;
        }
    }

    // ─── One-shots ──────────────────────────────────────────────────────────

    /// Play a one-shot and resolve when it has finished or was stopped.
    ///
    /// Never fails: load or play errors are logged and the future resolves.
    pub async fn play_trigger(&self, asset_key: &str) {
        let Some(asset) = self.catalog.resolve(asset_key) else {
            log::debug!("[Orchestrator] No asset for trigger '{}'", asset_key);
            return;
        };

        let generation = self.state.lock().one_shot_generation;
        let options = LoadOptions::one_shot(self.config.trigger_initial_volume);
        let id = match self.backend.load(asset, options).await {
            Ok(id) => id,
            Err(e) => {
                log::warn!("[Orchestrator] Trigger load failed for {}: {}", asset.key, e);
                return;
            }
        };

        let admitted = {
            let mut state = self.state.lock();
            if state.one_shot_generation == generation {
                state.one_shots.insert(id, asset.key);
                true
            } else {
                false
            }
        };
        if !admitted {
            log::debug!("[Orchestrator] Trigger {} outlived stop_all, discarding", asset.key);
            self.release(id).await;
            return;
        }

        if let Err(e) = self.backend.play(id).await {
            log::warn!("[Orchestrator] Trigger {} failed to start: {}", asset.key, e);
            self.finish_one_shot(id).await;
            return;
        }

        let fade = Fade::new(
            self.config.trigger_initial_volume,
            self.config.trigger_volume,
            self.config.trigger_fade_ms,
            self.config.fade_steps,
        )
        .with_curve(self.config.fade_curve);
        run_fade(self.backend.as_ref(), id, fade, || self.owns_one_shot(id)).await;

        self.wait_for_end(id).await;
        self.finish_one_shot(id).await;
    }

    fn owns_one_shot(&self, id: SoundId) -> bool {
        self.state.lock().one_shots.contains_key(&id)
    }

    async fn wait_for_end(&self, id: SoundId) {
        let poll = Duration::from_millis(self.config.status_poll_ms.max(1) as u64);
        loop {
            if !self.owns_one_shot(id) {
                return;
            }
            match self.backend.status(id).await {
                Ok(status) if status.is_done() => return,
                Ok(_) => {}
                Err(e) => {
                    log::debug!("[Orchestrator] Trigger {} status unavailable: {}", id, e);
                    return;
                }
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn finish_one_shot(&self, id: SoundId) {
        let owned = self.state.lock().one_shots.remove(&id).is_some();
        if owned {
            self.release(id).await;
        }
    }

    // ─── Teardown ───────────────────────────────────────────────────────────

    /// Stop and release everything.
    ///
    /// Invalidates every in-flight swap and one-shot before the first await,
    /// so the orchestrator owns nothing once this starts releasing.
    pub async fn stop_all(&self) {
        let handles: Vec<SoundId> = {
            let mut state = self.state.lock();
            state.swap_token += 1;
            state.one_shot_generation += 1;
            state.pending = None;
            state.fading_in = None;

            let mut handles = Vec::new();
            if let Some(carpet) = state.carpet.take() {
                handles.push(carpet.id);
            }
            handles.extend(state.retiring.drain().map(|(id, _)| id));
            handles.extend(state.one_shots.drain().map(|(id, _)| id));
            handles
        };

        if !handles.is_empty() {
            log::info!("[Orchestrator] Stop all: releasing {} handle(s)", handles.len());
        }
        for id in handles {
            self.release(id).await;
        }
    }

    /// Stop then unload, logging failures
    async fn release(&self, id: SoundId) {
        if let Err(e) = self.backend.stop(id).await {
            log::debug!("[Orchestrator] Stop {} failed: {}", id, e);
        }
        if let Err(e) = self.backend.unload(id).await {
            log::warn!("[Orchestrator] Unload {} failed: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    fn orchestrator() -> (Arc<MemoryBackend>, AudioOrchestrator) {
        let backend = Arc::new(MemoryBackend::default());
        let orchestrator = AudioOrchestrator::new(
            backend.clone(),
            Arc::new(SoundCatalog::builtin()),
            OrchestratorConfig::default(),
        );
        (backend, orchestrator)
    }

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.fade_steps, DEFAULT_FADE_STEPS);
        assert!(config.trigger_initial_volume < config.trigger_volume);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_carpet_when_idle() {
        let (backend, orchestrator) = orchestrator();
        let before = orchestrator.swap_token();
        orchestrator.stop_carpet(500).await;

        assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
        assert_eq!(orchestrator.owned_handles(), 0);
        assert_eq!(orchestrator.swap_token(), before + 1);
        assert_eq!(backend.stats().loads, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_in_reaches_carpet_volume() {
        let (backend, orchestrator) = orchestrator();
        orchestrator.play_carpet("rain.mp3", 400).await;

        assert_eq!(orchestrator.active_carpet(), Some("ambience/cabin_rain.mp3"));
        assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Playing);
        let state = orchestrator.state.lock();
        let id = state.carpet.unwrap().id;
        drop(state);
        let volume = backend.volume(id).unwrap();
        assert!((volume - 0.6).abs() < 1e-5, "volume {}", volume);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_carpet_replaces_active_with_silence() {
        let (backend, orchestrator) = orchestrator();
        orchestrator.play_carpet("ambience/tavern.mp3", 0).await;
        assert_eq!(orchestrator.active_carpet(), Some("ambience/tavern.mp3"));
        assert_eq!(backend.live_count(), 1);

        orchestrator.play_carpet("ambience/underwater_city.mp3", 0).await;

        assert_eq!(orchestrator.active_carpet(), None);
        assert_eq!(orchestrator.owned_handles(), 0);
        assert_eq!(backend.live_count(), 0);
    }
}
