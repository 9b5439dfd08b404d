//! Word Reveal Clock
//!
//! Advances a highlighted-word index at the reading pace and dispatches each
//! trigger's sound when its word is revealed.
//!
//! Every `start` opens a new epoch. The tick task and every trigger
//! completion carry the epoch they were spawned under and leave state alone
//! once it has moved on, so a restarted clock never sees stale ticks or
//! stale completions even though trigger ids repeat across chunks.

use ar_audio::AudioOrchestrator;
use ar_core::word_interval;
use ar_text::TriggerWord;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Consumer of trigger sounds. Resolves when the sound is done.
#[async_trait]
pub trait TriggerPlayer: Send + Sync {
    async fn play_trigger(&self, sound: &str);
}

#[async_trait]
impl TriggerPlayer for AudioOrchestrator {
    async fn play_trigger(&self, sound: &str) {
        AudioOrchestrator::play_trigger(self, sound).await;
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockSnapshot {
    /// Activation counter, bumped by every start and stop
    pub epoch: u64,
    /// Highlighted word within the chunk
    pub highlighted: Option<usize>,
    /// Ids of triggers whose sound is still playing
    pub active_triggers: BTreeSet<String>,
    /// Revealed past the last word
    pub finished: bool,
}

#[derive(Debug, Default)]
struct ClockState {
    epoch: u64,
    word_count: usize,
    highlighted: Option<usize>,
    finished: bool,
    triggers: Vec<TriggerWord>,
    fired: HashSet<String>,
    active: BTreeSet<String>,
}

impl ClockState {
    /// Triggers at `position` that have not fired in this activation
    fn take_due(&mut self, position: usize) -> Vec<TriggerWord> {
        let due: Vec<TriggerWord> = self
            .triggers
            .iter()
            .filter(|t| t.position == position && !self.fired.contains(&t.id))
            .cloned()
            .collect();
        for trigger in &due {
            self.fired.insert(trigger.id.clone());
            self.active.insert(trigger.id.clone());
        }
        due
    }

    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            epoch: self.epoch,
            highlighted: self.highlighted,
            active_triggers: self.active.clone(),
            finished: self.finished,
        }
    }
}

enum Tick {
    Stale,
    Finished,
    Advanced(Vec<TriggerWord>),
}

struct ClockShared {
    state: Mutex<ClockState>,
    snapshot_tx: watch::Sender<ClockSnapshot>,
}

impl ClockShared {
    fn publish(&self) {
        let snapshot = self.state.lock().snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }

    fn advance(&self, epoch: u64) -> Tick {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return Tick::Stale;
        }

        let next = state.highlighted.map_or(0, |index| index + 1);
        let tick = if next >= state.word_count {
            state.highlighted = None;
            state.finished = true;
            Tick::Finished
        } else {
            state.highlighted = Some(next);
            Tick::Advanced(state.take_due(next))
        };
        let snapshot = state.snapshot();
        drop(state);

        self.snapshot_tx.send_replace(snapshot);
        tick
    }

    fn complete(&self, epoch: u64, id: &str) {
        let removed = {
            let mut state = self.state.lock();
            state.epoch == epoch && state.active.remove(id)
        };
        if removed {
            self.publish();
        }
    }
}

/// Word-by-word reveal clock for one chunk at a time
pub struct WordClock {
    player: Arc<dyn TriggerPlayer>,
    shared: Arc<ClockShared>,
    ticker: Option<JoinHandle<()>>,
}

impl WordClock {
    pub fn new(player: Arc<dyn TriggerPlayer>) -> Self {
        let (snapshot_tx, _) = watch::channel(ClockSnapshot::default());
        Self {
            player,
            shared: Arc::new(ClockShared {
                state: Mutex::new(ClockState::default()),
                snapshot_tx,
            }),
            ticker: None,
        }
    }

    /// Reveal `chunk` from its first word at `wpm`.
    ///
    /// Stops any previous activation first. Word 0 is highlighted at once
    /// and a trigger on it fires immediately; each tick reveals one more
    /// word. Must be called inside a tokio runtime.
    pub fn start(&mut self, chunk: &str, triggers: Vec<TriggerWord>, wpm: u32) {
        self.stop();

        let word_count = ar_text::words(chunk).len();
        let period = word_interval(wpm).max(Duration::from_millis(1));

        let (epoch, due) = {
            let mut state = self.shared.state.lock();
            state.epoch += 1;
            state.word_count = word_count;
            state.triggers = triggers;
            if word_count == 0 {
                state.finished = true;
                (state.epoch, Vec::new())
            } else {
                state.highlighted = Some(0);
                let due = state.take_due(0);
                (state.epoch, due)
            }
        };
        self.shared.publish();

        log::trace!(
            "[WordClock] Epoch {}: {} words every {:?}",
            epoch,
            word_count,
            period
        );

        for trigger in due {
            dispatch(&self.shared, &self.player, epoch, trigger);
        }
        if word_count == 0 {
            return;
        }

        let shared = self.shared.clone();
        let player = self.player.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match shared.advance(epoch) {
                    Tick::Stale => break,
                    Tick::Finished => {
                        log::trace!("[WordClock] Epoch {} finished", epoch);
                        break;
                    }
                    Tick::Advanced(due) => {
                        for trigger in due {
                            dispatch(&shared, &player, epoch, trigger);
                        }
                    }
                }
            }
        }));
    }

    /// Cancel the tick and clear highlight and active triggers.
    ///
    /// Idempotent. Sounds already dispatched keep playing.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        {
            let mut state = self.shared.state.lock();
            let epoch = state.epoch + 1;
            *state = ClockState {
                epoch,
                ..ClockState::default()
            };
        }
        self.shared.publish();
    }

    /// Watch highlight and trigger changes
    pub fn subscribe(&self) -> watch::Receiver<ClockSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Ticking and not yet past the last word
    pub fn is_running(&self) -> bool {
        let state = self.shared.state.lock();
        state.highlighted.is_some() && !state.finished
    }
}

impl Drop for WordClock {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn dispatch(
    shared: &Arc<ClockShared>,
    player: &Arc<dyn TriggerPlayer>,
    epoch: u64,
    trigger: TriggerWord,
) {
    log::debug!(
        "[WordClock] Trigger '{}' at word {} → {}",
        trigger.word,
        trigger.position,
        trigger.sound
    );
    let shared = shared.clone();
    let player = player.clone();
    tokio::spawn(async move {
        player.play_trigger(trigger.sound).await;
        shared.complete(epoch, &trigger.id);
    });
}
