//! Reading Session Coordinator
//!
//! Named transitions, each invoking exactly the clock and audio operations it
//! needs:
//!
//! ```text
//! open ─→ activate ──┬─ next_chunk / previous_chunk / jump_to
//!                    ├─ set_wpm / relayout
//!                    └─ focus_lost ─→ (idle) ─→ focus_gained ─→ activate
//! ```
//!
//! Activation stops the clock, builds the chunk schedule, requests the
//! soundscape when the page changed, then restarts the clock.
//!
//! Soundscape requests run detached. Each one carries the page-request epoch
//! current when it was issued; an answer for a page the reader already left
//! is dropped without touching audio.

use crate::clock::{ClockSnapshot, TriggerPlayer, WordClock};
use crate::error::SessionResult;
use crate::schedule::{PageLayout, build_schedule};
use ar_audio::AudioOrchestrator;
use ar_core::{
    Book, DEFAULT_WPM, SessionPosition, SoundCatalog, Typography, Viewport, clamp_wpm,
    ms_per_word,
};
use ar_soundscape::{SoundscapeSource, TriggeredSound};
use ar_text::{TriggerWord, paginate};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavOutcome {
    /// Position changed and the new chunk is active
    Moved,
    /// Already on the last chunk of the book; position unchanged
    EndOfBook,
    /// Retreated past the first chunk; the caller leaves the session
    ExitToLibrary,
}

/// Session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub wpm: u32,
    pub viewport: Viewport,
    pub typography: Typography,
    /// Carpet crossfade on page change (ms)
    pub carpet_fade_ms: u32,
    /// Snap window for service-reported trigger positions (words)
    pub snap_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            viewport: Viewport::default(),
            typography: Typography::default(),
            carpet_fade_ms: 1500,
            snap_window: 3,
        }
    }
}

type PageKey = (usize, usize);

/// Service-reported triggers for one page
#[derive(Debug, Clone)]
struct ReportedTriggers {
    page: PageKey,
    sounds: Vec<TriggeredSound>,
}

/// One reader working through one book
pub struct ReadingSession {
    book: Arc<Book>,
    catalog: Arc<SoundCatalog>,
    orchestrator: Arc<AudioOrchestrator>,
    soundscape: Option<Arc<dyn SoundscapeSource>>,
    clock: WordClock,
    config: SessionConfig,
    position: SessionPosition,
    layout: PageLayout,
    schedule: Vec<TriggerWord>,
    /// Page the soundscape was last requested for
    soundscape_page: Option<PageKey>,
    page_epoch: Arc<AtomicU64>,
    reported: Arc<Mutex<Option<ReportedTriggers>>>,
    /// Cleared by focus loss, read by detached soundscape tasks
    focused: Arc<AtomicBool>,
}

impl ReadingSession {
    /// Open `book` at `start` (clamped into bounds) and activate that chunk.
    ///
    /// Without a soundscape source every page is silent. Must be called
    /// inside a tokio runtime.
    pub fn open(
        book: Arc<Book>,
        orchestrator: Arc<AudioOrchestrator>,
        soundscape: Option<Arc<dyn SoundscapeSource>>,
        config: SessionConfig,
        start: SessionPosition,
    ) -> SessionResult<Self> {
        book.validate()?;

        let player: Arc<dyn TriggerPlayer> = orchestrator.clone();
        let config = SessionConfig {
            wpm: clamp_wpm(config.wpm),
            ..config
        };
        let mut session = Self {
            catalog: orchestrator.catalog().clone(),
            clock: WordClock::new(player),
            position: start.clamp_to(&book),
            book,
            orchestrator,
            soundscape,
            config,
            layout: PageLayout::default(),
            schedule: Vec::new(),
            soundscape_page: None,
            page_epoch: Arc::new(AtomicU64::new(0)),
            reported: Arc::new(Mutex::new(None)),
            focused: Arc::new(AtomicBool::new(true)),
        };
        session.layout_page();
        session.clamp_chunk();

        log::info!(
            "[Session] Opened '{}' at chapter {} page {} chunk {}",
            session.book.id,
            session.position.chapter_index + 1,
            session.position.page_index + 1,
            session.position.chunk_index + 1
        );
        session.activate();
        Ok(session)
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    /// Advance one chunk, rolling over page and chapter boundaries
    pub fn next_chunk(&mut self) -> NavOutcome {
        self.clock.stop();

        let SessionPosition {
            chapter_index,
            page_index,
            chunk_index,
        } = self.position;

        let target = if chunk_index + 1 < self.layout.chunk_count() {
            SessionPosition::new(chapter_index, page_index, chunk_index + 1)
        } else if page_index + 1 < self.book.page_count(chapter_index) {
            SessionPosition::new(chapter_index, page_index + 1, 0)
        } else if chapter_index + 1 < self.book.chapters.len() {
            SessionPosition::new(chapter_index + 1, 0, 0)
        } else {
            log::debug!("[Session] End of book");
            return NavOutcome::EndOfBook;
        };

        self.move_to(target);
        NavOutcome::Moved
    }

    /// Retreat one chunk. Going back a page lands on that page's last chunk.
    pub fn previous_chunk(&mut self) -> NavOutcome {
        self.clock.stop();

        let SessionPosition {
            chapter_index,
            page_index,
            chunk_index,
        } = self.position;

        let target = if chunk_index > 0 {
            SessionPosition::new(chapter_index, page_index, chunk_index - 1)
        } else if page_index > 0 {
            SessionPosition::new(chapter_index, page_index - 1, usize::MAX)
        } else if chapter_index > 0 {
            let previous = chapter_index - 1;
            let last_page = self.book.page_count(previous).saturating_sub(1);
            SessionPosition::new(previous, last_page, usize::MAX)
        } else {
            log::debug!("[Session] Retreat past first chunk, exiting to library");
            return NavOutcome::ExitToLibrary;
        };

        self.move_to(target);
        NavOutcome::Moved
    }

    /// Jump to an external position (deep link), clamped into bounds
    pub fn jump_to(&mut self, position: SessionPosition) {
        self.clock.stop();
        self.move_to(position.clamp_to(&self.book));
    }

    /// Change the reading pace; the current chunk restarts from its first word
    pub fn set_wpm(&mut self, wpm: u32) {
        self.clock.stop();
        self.config.wpm = clamp_wpm(wpm);
        log::debug!("[Session] Pace {} wpm", self.config.wpm);
        self.activate();
    }

    /// Re-chunk the current page for new geometry, keeping the first word of
    /// the current chunk on screen
    pub fn relayout(&mut self, viewport: Viewport, typography: Typography) {
        self.clock.stop();
        let anchor = self.layout.chunk_range(self.position.chunk_index).start;

        self.config.viewport = viewport;
        self.config.typography = typography;
        self.layout_page();
        self.position.chunk_index = self.layout.chunk_of_word(anchor);
        self.activate();
    }

    // ─── Focus ──────────────────────────────────────────────────────────────

    /// Screen blur, backgrounding or unmount. Stops the clock and all audio.
    pub async fn focus_lost(&mut self) {
        self.focused.store(false, Ordering::SeqCst);
        self.clock.stop();
        self.page_epoch.fetch_add(1, Ordering::SeqCst);
        self.soundscape_page = None;
        log::info!("[Session] Focus lost, stopping audio");
        self.orchestrator.stop_all().await;
    }

    /// Return to the foreground: re-activate the chunk and re-request audio
    pub fn focus_gained(&mut self) {
        if self.is_focused() {
            return;
        }
        self.focused.store(true, Ordering::SeqCst);
        log::info!("[Session] Focus regained");
        self.activate();
    }

    /// Leave the session, releasing every audio resource
    pub async fn shutdown(mut self) {
        self.focus_lost().await;
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn position(&self) -> SessionPosition {
        self.position
    }

    /// `current page / total pages`, 0.0 for a book without pages
    pub fn progress(&self) -> f32 {
        self.book.progress(&self.position)
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn wpm(&self) -> u32 {
        self.config.wpm
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    pub fn chunk_count(&self) -> usize {
        self.layout.chunk_count()
    }

    pub fn current_chunk(&self) -> &str {
        self.layout
            .chunks
            .get(self.position.chunk_index)
            .map_or("", String::as_str)
    }

    /// Trigger schedule of the active chunk
    pub fn schedule(&self) -> &[TriggerWord] {
        &self.schedule
    }

    /// Watch highlight, active triggers and completion of the active chunk
    pub fn subscribe(&self) -> watch::Receiver<ClockSnapshot> {
        self.clock.subscribe()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    fn move_to(&mut self, target: SessionPosition) {
        let page_changed = !self.position.same_page(&target);
        self.position = target;
        if page_changed {
            self.layout_page();
        }
        self.clamp_chunk();
        self.activate();
    }

    fn layout_page(&mut self) {
        let content = self
            .book
            .page(self.position.chapter_index, self.position.page_index)
            .map_or("", |page| page.content.as_str());
        let chunks = paginate(content, self.config.viewport, self.config.typography);
        self.layout = PageLayout::new(chunks);
    }

    fn clamp_chunk(&mut self) {
        let last = self.layout.chunk_count().saturating_sub(1);
        self.position.chunk_index = self.position.chunk_index.min(last);
    }

    fn activate(&mut self) {
        self.clock.stop();
        if !self.is_focused() {
            return;
        }

        let page = self.page_key();
        let reported = self
            .reported
            .lock()
            .as_ref()
            .filter(|r| r.page == page)
            .map(|r| r.sounds.clone())
            .unwrap_or_default();

        self.schedule = build_schedule(
            &self.layout,
            self.position.chunk_index,
            &reported,
            ms_per_word(self.config.wpm),
            &self.catalog,
            self.config.snap_window,
        );

        if self.soundscape_page != Some(page) {
            self.request_soundscape(page);
        }

        let chunk = self.current_chunk().to_string();
        self.clock.start(&chunk, self.schedule.clone(), self.config.wpm);
    }

    fn page_key(&self) -> PageKey {
        (self.position.chapter_index, self.position.page_index)
    }

    fn request_soundscape(&mut self, page: PageKey) {
        self.soundscape_page = Some(page);
        let epoch = self.page_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let fade_ms = self.config.carpet_fade_ms;
        let orchestrator = self.orchestrator.clone();

        let Some(source) = self.soundscape.clone() else {
            tokio::spawn(async move { orchestrator.stop_carpet(fade_ms).await });
            return;
        };

        let book_id = self.book.id.clone();
        let (chapter_index, page_index) = page;
        let chapter_number = chapter_index as u32 + 1;
        let page_number = page_index as u32 + 1;
        let page_epoch = self.page_epoch.clone();
        let reported = self.reported.clone();
        let catalog = self.catalog.clone();
        let focused = self.focused.clone();

        tokio::spawn(async move {
            let result = source
                .fetch_soundscape(&book_id, chapter_number, page_number)
                .await;

            if page_epoch.load(Ordering::SeqCst) != epoch {
                log::debug!(
                    "[Session] Dropping soundscape for chapter {} page {}, reader moved on",
                    chapter_number,
                    page_number
                );
                return;
            }

            match result {
                Ok(response) => {
                    *reported.lock() = Some(ReportedTriggers {
                        page,
                        sounds: response.triggered_sounds.clone(),
                    });
                    match response.carpet_asset(&catalog) {
                        Some(asset) => {
                            orchestrator.play_carpet(asset.key, fade_ms).await;
                            // Focus may have been lost between the epoch check and the swap
                            if page_epoch.load(Ordering::SeqCst) != epoch
                                && !focused.load(Ordering::SeqCst)
                            {
                                log::debug!("[Session] Carpet started after focus loss, releasing");
                                orchestrator.stop_all().await;
                            }
                        }
                        None => orchestrator.stop_carpet(fade_ms).await,
                    }
                }
                Err(e) => {
                    log::warn!("[Session] Soundscape unavailable, page is silent: {}", e);
                    orchestrator.stop_carpet(fade_ms).await;
                }
            }
        });
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        self.clock.stop();
        if !self.is_focused() {
            return;
        }
        self.page_epoch.fetch_add(1, Ordering::SeqCst);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let orchestrator = self.orchestrator.clone();
                handle.spawn(async move { orchestrator.stop_all().await });
            }
            Err(_) => log::warn!("[Session] Dropped outside a runtime, audio left to its owner"),
        }
    }
}
