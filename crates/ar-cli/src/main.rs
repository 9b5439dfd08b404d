//! Ambireader terminal reader
//!
//! Usage:
//!   ambireader book.json                  - Read from the first page
//!   ambireader book.json -c 2 -p 3        - Start at chapter 2, page 3
//!   ambireader book.json --offline --mute - No service, no device
//!
//! While reading, type a command and press enter:
//!   n / p   next or previous chunk
//!   + / -   faster or slower (25 wpm)
//!   q       quit

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ar_audio::{AudioBackend, AudioOrchestrator, MemoryBackend};
use ar_core::{Book, SessionPosition, SoundCatalog, Typography, Viewport};
use ar_session::{ClockSnapshot, NavOutcome, ReaderPreferences, ReadingSession};
use ar_soundscape::{SoundscapeClient, SoundscapeSource};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Pause on a fully revealed chunk before moving on
const CHUNK_PAUSE: Duration = Duration::from_millis(800);

/// Step for `+` / `-`
const WPM_STEP: u32 = 25;

#[derive(Parser)]
#[command(name = "ambireader", about = "Immersive reader with ambient soundscapes")]
struct Cli {
    /// Book file (JSON)
    book: PathBuf,

    /// Preferences file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chapter to open (1-based)
    #[arg(short, long, default_value_t = 1)]
    chapter: usize,

    /// Page to open within the chapter (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Reading speed in words per minute
    #[arg(short, long)]
    wpm: Option<u32>,

    /// Viewport width in logical pixels
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height in logical pixels
    #[arg(long)]
    height: Option<f32>,

    /// Font size in logical pixels
    #[arg(long)]
    font_size: Option<f32>,

    /// Line height in logical pixels
    #[arg(long)]
    line_height: Option<f32>,

    /// Soundscape service base URL
    #[arg(long)]
    soundscape_url: Option<String>,

    /// Do not contact the soundscape service
    #[arg(long)]
    offline: bool,

    /// Do not open an audio device
    #[arg(long)]
    mute: bool,

    /// Directory holding the sound assets
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Stop after each chunk instead of advancing
    #[arg(long)]
    manual: bool,

    /// Write the effective settings back to the preferences file
    #[arg(long)]
    save: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

enum Command {
    Next,
    Previous,
    Faster,
    Slower,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "n" | "" => Some(Self::Next),
            "p" => Some(Self::Previous),
            "+" => Some(Self::Faster),
            "-" => Some(Self::Slower),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ReaderPreferences::default_path);
    let mut prefs = ReaderPreferences::load_from(&config_path);
    apply_overrides(&cli, &mut prefs);
    if cli.save {
        prefs
            .save_to(&config_path)
            .with_context(|| format!("Failed to save {}", config_path.display()))?;
        log::info!("[Preferences] Saved {}", config_path.display());
    }

    let book = Book::load_from(&cli.book)
        .with_context(|| format!("Failed to load book {}", cli.book.display()))?;
    let catalog = SoundCatalog::builtin();
    catalog.validate().context("Sound catalog is inconsistent")?;

    let backend = open_backend(&cli)?;
    let orchestrator = Arc::new(AudioOrchestrator::new(
        backend,
        Arc::new(catalog),
        prefs.audio.clone(),
    ));
    let soundscape = open_soundscape(&cli, &prefs)?;

    let start = SessionPosition::new(
        cli.chapter.saturating_sub(1),
        cli.page.saturating_sub(1),
        0,
    );
    let mut session = ReadingSession::open(
        Arc::new(book),
        orchestrator,
        soundscape,
        prefs.session_config(),
        start,
    )
    .context("Failed to open reading session")?;

    let auto_advance = prefs.reading.auto_advance && !cli.manual;
    read(&mut session, auto_advance).await?;

    session.shutdown().await;
    Ok(())
}

fn apply_overrides(cli: &Cli, prefs: &mut ReaderPreferences) {
    if let Some(wpm) = cli.wpm {
        prefs.reading.wpm = wpm;
    }
    let layout = &mut prefs.layout;
    layout.viewport = Viewport::new(
        cli.width.unwrap_or(layout.viewport.width),
        cli.height.unwrap_or(layout.viewport.height),
    );
    layout.typography = Typography::new(
        cli.font_size.unwrap_or(layout.typography.font_size),
        cli.line_height.unwrap_or(layout.typography.line_height),
    );
    if let Some(url) = &cli.soundscape_url {
        prefs.soundscape.base_url = url.clone();
    }
}

#[cfg(feature = "rodio")]
fn open_backend(cli: &Cli) -> Result<Arc<dyn AudioBackend>> {
    if cli.mute {
        return Ok(Arc::new(MemoryBackend::default()));
    }
    let backend = ar_audio::RodioBackend::new(cli.assets.clone())
        .context("Failed to open audio device")?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "rodio"))]
fn open_backend(cli: &Cli) -> Result<Arc<dyn AudioBackend>> {
    if !cli.mute {
        log::warn!(
            "[Audio] Built without the rodio feature, ignoring {}",
            cli.assets.display()
        );
    }
    Ok(Arc::new(MemoryBackend::default()))
}

fn open_soundscape(
    cli: &Cli,
    prefs: &ReaderPreferences,
) -> Result<Option<Arc<dyn SoundscapeSource>>> {
    if cli.offline || !prefs.soundscape.enabled {
        log::info!("[Soundscape] Offline, pages will be silent");
        return Ok(None);
    }
    let client = SoundscapeClient::new(&prefs.soundscape.base_url)
        .context("Invalid soundscape service URL")?;
    log::info!("[Soundscape] Using {}", client.base_url());
    let source: Arc<dyn SoundscapeSource> = Arc::new(client);
    Ok(Some(source))
}

/// Run until the book ends, the reader quits or ctrl-c
async fn read(session: &mut ReadingSession, auto_advance: bool) -> Result<()> {
    let mut rx = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    print_header(session);
    loop {
        let snapshot = rx.borrow_and_update().clone();
        render(session.current_chunk(), &snapshot)?;

        if snapshot.finished && auto_advance {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = tokio::time::sleep(CHUNK_PAUSE) => {
                    let outcome = session.next_chunk();
                    if !advance(session, outcome) {
                        break;
                    }
                    continue;
                }
                changed = rx.changed() => {
                    changed.context("Word clock closed")?;
                    continue;
                }
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                changed.context("Word clock closed")?;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    stdin_open = false;
                    continue;
                };
                let outcome = match Command::parse(&line) {
                    Some(Command::Next) => session.next_chunk(),
                    Some(Command::Previous) => session.previous_chunk(),
                    Some(Command::Faster) => {
                        session.set_wpm(session.wpm().saturating_add(WPM_STEP));
                        log::info!("[Session] {} wpm", session.wpm());
                        NavOutcome::Moved
                    }
                    Some(Command::Slower) => {
                        session.set_wpm(session.wpm().saturating_sub(WPM_STEP));
                        log::info!("[Session] {} wpm", session.wpm());
                        NavOutcome::Moved
                    }
                    Some(Command::Quit) => break,
                    None => {
                        log::warn!("Unknown command '{}'", line.trim());
                        continue;
                    }
                };
                if !advance(session, outcome) {
                    break;
                }
            }
        }
    }
    println!();
    Ok(())
}

/// Report a navigation outcome; false once the session is over
fn advance(session: &ReadingSession, outcome: NavOutcome) -> bool {
    match outcome {
        NavOutcome::Moved => {
            print_header(session);
            true
        }
        NavOutcome::EndOfBook => {
            println!("\nThe End");
            false
        }
        NavOutcome::ExitToLibrary => false,
    }
}

fn print_header(session: &ReadingSession) {
    let position = session.position();
    println!(
        "\n[{} · chapter {} page {} · chunk {}/{} · {:.0}%]",
        session.book().title.as_deref().unwrap_or(&session.book().id),
        position.chapter_index + 1,
        position.page_index + 1,
        position.chunk_index + 1,
        session.chunk_count(),
        session.progress() * 100.0
    );
}

/// Rewrite the current line with every word revealed so far
fn render(chunk: &str, snapshot: &ClockSnapshot) -> Result<()> {
    let revealed = match snapshot.highlighted {
        Some(index) => index + 1,
        None if snapshot.finished => usize::MAX,
        None => 0,
    };
    let text: Vec<&str> = chunk.split_whitespace().take(revealed).collect();
    let mut out = std::io::stdout().lock();
    write!(out, "\r{}", text.join(" "))?;
    if !snapshot.active_triggers.is_empty() {
        write!(out, "  ♪")?;
    }
    out.flush()?;
    Ok(())
}
