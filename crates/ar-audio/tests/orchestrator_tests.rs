//! Orchestrator behavior against the in-memory backend.
//!
//! Every test runs on a paused tokio clock: sleeps auto-advance, so timings
//! below are exact.

use ar_audio::{
    AudioOrchestrator, BackendStats, CarpetPhase, MemoryBackend, MemoryBackendConfig,
    OrchestratorConfig,
};
use ar_core::SoundCatalog;
use std::sync::Arc;
use std::time::Duration;

const RAIN: &str = "ambience/cabin_rain.mp3";
const FOREST: &str = "ambience/forest_night.mp3";
const TAVERN: &str = "ambience/tavern.mp3";
const THUNDER: &str = "effects/thunder.mp3";

fn setup() -> (Arc<MemoryBackend>, Arc<AudioOrchestrator>) {
    let backend = Arc::new(MemoryBackend::new(MemoryBackendConfig::default()));
    let orchestrator = Arc::new(AudioOrchestrator::new(
        backend.clone(),
        Arc::new(SoundCatalog::builtin()),
        OrchestratorConfig::default(),
    ));
    (backend, orchestrator)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CARPET SLOT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_same_carpet_twice_loads_once() {
    let (backend, orchestrator) = setup();

    orchestrator.play_carpet(RAIN, 200).await;
    orchestrator.play_carpet(RAIN, 200).await;

    assert_eq!(backend.stats().loads, 1);
    assert_eq!(backend.live_keys(), vec![RAIN]);
    assert_eq!(orchestrator.active_carpet(), Some(RAIN));
}

#[tokio::test(start_paused = true)]
async fn test_same_carpet_while_loading_loads_once() {
    let (backend, orchestrator) = setup();
    backend.set_load_delay(RAIN, Duration::from_millis(300));

    tokio::join!(
        orchestrator.play_carpet(RAIN, 100),
        orchestrator.play_carpet("rain.mp3", 100),
    );

    assert_eq!(backend.load_log(), vec![RAIN]);
    assert_eq!(backend.live_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_later_request_wins_over_slow_load() {
    let (backend, orchestrator) = setup();
    backend.set_load_delay(RAIN, Duration::from_millis(500));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_carpet(RAIN, 200).await }
    });
    advance(10).await;
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Loading);

    orchestrator.play_carpet(FOREST, 200).await;
    first.await.unwrap();

    assert_eq!(orchestrator.active_carpet(), Some(FOREST));
    assert_eq!(backend.live_keys(), vec![FOREST]);
    // Stale load was released by the operation that made it
    assert_eq!(backend.stats().unloads, 1);
    assert_eq!(orchestrator.owned_handles(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_crossfade_releases_previous() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;

    let swap = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_carpet(TAVERN, 1000).await }
    });
    advance(500).await;
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Crossfading);
    assert_eq!(backend.live_count(), 2);

    swap.await.unwrap();
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Playing);
    assert_eq!(backend.live_keys(), vec![TAVERN]);
    assert_eq!(orchestrator.owned_handles(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_return_to_active_carpet_cancels_swap() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;
    backend.set_load_delay(FOREST, Duration::from_millis(400));

    let away = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_carpet(FOREST, 100).await }
    });
    advance(10).await;
    orchestrator.play_carpet(RAIN, 100).await;
    away.await.unwrap();

    assert_eq!(orchestrator.active_carpet(), Some(RAIN));
    assert_eq!(backend.live_keys(), vec![RAIN]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_carpet_idle_is_noop() {
    let (backend, orchestrator) = setup();
    orchestrator.stop_carpet(300).await;
    orchestrator.stop_carpet(0).await;

    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
    assert_eq!(backend.stats(), BackendStats::default());
}

#[tokio::test(start_paused = true)]
async fn test_stop_carpet_fades_then_unloads() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;

    let stop = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.stop_carpet(600).await }
    });
    advance(300).await;
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::FadingOut);
    assert_eq!(backend.live_count(), 1);

    stop.await.unwrap();
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_carpet_load_leaves_slot_idle() {
    let (backend, orchestrator) = setup();
    backend.fail_loads(RAIN);

    orchestrator.play_carpet(RAIN, 100).await;

    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
    assert_eq!(backend.stats().failed_loads, 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ONE-SHOTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_trigger_resolves_after_sound_ends() {
    let (backend, orchestrator) = setup();
    let start = tokio::time::Instant::now();

    orchestrator.play_trigger(THUNDER).await;

    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert_eq!(orchestrator.active_one_shots(), 0);
    assert_eq!(backend.live_count(), 0);
    assert_eq!(backend.stats().plays, 1);
}

#[tokio::test(start_paused = true)]
async fn test_triggers_overlap() {
    let (backend, orchestrator) = setup();

    let a = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_trigger(THUNDER).await }
    });
    let b = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_trigger("effects/owl.mp3").await }
    });
    advance(200).await;
    assert_eq!(orchestrator.active_one_shots(), 2);

    a.await.unwrap();
    b.await.unwrap();
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_completes_on_failure() {
    let (backend, orchestrator) = setup();
    backend.fail_loads(THUNDER);
    backend.fail_plays("effects/owl.mp3");

    orchestrator.play_trigger(THUNDER).await;
    orchestrator.play_trigger("effects/owl.mp3").await;
    orchestrator.play_trigger("effects/not_a_sound.mp3").await;

    assert_eq!(orchestrator.active_one_shots(), 0);
    assert_eq!(backend.live_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEARDOWN
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_stop_all_releases_everything() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;
    backend.set_load_delay(FOREST, Duration::from_millis(400));
    backend.set_load_delay("effects/bell.mp3", Duration::from_millis(400));

    let swap = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_carpet(FOREST, 500).await }
    });
    let loud = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_trigger(THUNDER).await }
    });
    let late = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_trigger("effects/bell.mp3").await }
    });
    advance(100).await;
    assert_eq!(orchestrator.active_one_shots(), 1);

    orchestrator.stop_all().await;
    assert_eq!(orchestrator.owned_handles(), 0);

    // In-flight loads land after teardown and must not leak
    swap.await.unwrap();
    loud.await.unwrap();
    late.await.unwrap();

    assert_eq!(orchestrator.owned_handles(), 0);
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_during_crossfade() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;

    let swap = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.play_carpet(TAVERN, 1000).await }
    });
    advance(500).await;
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Crossfading);
    assert_eq!(orchestrator.owned_handles(), 2);

    orchestrator.stop_all().await;
    assert_eq!(orchestrator.owned_handles(), 0);
    assert_eq!(backend.live_count(), 0);

    swap.await.unwrap();
    advance(1000).await;
    assert_eq!(orchestrator.carpet_phase(), CarpetPhase::Idle);
    assert_eq!(orchestrator.owned_handles(), 0);
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_then_reuse() {
    let (backend, orchestrator) = setup();
    orchestrator.play_carpet(RAIN, 0).await;
    orchestrator.stop_all().await;

    orchestrator.play_carpet(RAIN, 0).await;
    assert_eq!(orchestrator.active_carpet(), Some(RAIN));
    assert_eq!(backend.live_count(), 1);
    assert_eq!(backend.stats().loads, 2);
}
