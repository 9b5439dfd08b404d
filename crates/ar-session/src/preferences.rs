//! Reader Preferences
//!
//! Persistent reader settings:
//! - Reading pace and trigger alignment
//! - Audio volumes, fades and curves
//! - Default layout for terminal sessions
//! - Soundscape service endpoint

use crate::error::SessionResult;
use crate::session::SessionConfig;
use ar_audio::OrchestratorConfig;
use ar_core::{DEFAULT_WPM, Typography, Viewport, clamp_wpm};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default soundscape service
pub const DEFAULT_SOUNDSCAPE_URL: &str = "http://localhost:8000";

/// Reader preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderPreferences {
    pub reading: ReadingPreferences,
    pub audio: OrchestratorConfig,
    pub layout: LayoutPreferences,
    pub soundscape: SoundscapePreferences,
}

/// Reading pace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingPreferences {
    /// Words per minute (clamped on use)
    pub wpm: u32,
    /// How far a service-reported trigger may be snapped (words)
    pub snap_window: usize,
    /// Move to the next chunk once the last word is revealed
    pub auto_advance: bool,
}

impl Default for ReadingPreferences {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            snap_window: 3,
            auto_advance: true,
        }
    }
}

impl ReadingPreferences {
    #[inline]
    pub fn clamped_wpm(&self) -> u32 {
        clamp_wpm(self.wpm)
    }
}

/// Page geometry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPreferences {
    pub viewport: Viewport,
    pub typography: Typography,
}

/// Soundscape service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundscapePreferences {
    pub base_url: String,
    pub enabled: bool,
}

impl Default for SoundscapePreferences {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOUNDSCAPE_URL.to_string(),
            enabled: true,
        }
    }
}

impl ReaderPreferences {
    /// Load preferences from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from specified path, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("[Preferences] Ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to standard location
    pub fn save(&self) -> SessionResult<()> {
        self.save_to(Self::default_path())
    }

    /// Save preferences to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SessionResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Get default preferences file path
    pub fn default_path() -> PathBuf {
        let base = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/Ambireader"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("Ambireader"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            dirs::config_dir()
                .map(|d| d.join("ambireader"))
                .unwrap_or_else(|| PathBuf::from("."))
        };
        base.join("preferences.json")
    }

    /// Session settings derived from these preferences
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            wpm: self.reading.clamped_wpm(),
            viewport: self.layout.viewport,
            typography: self.layout.typography,
            carpet_fade_ms: self.audio.carpet_fade_ms,
            snap_window: self.reading.snap_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ar_audio::FadeCurve;

    #[test]
    fn test_default_preferences() {
        let prefs = ReaderPreferences::default();
        assert_eq!(prefs.reading.wpm, 250);
        assert_eq!(prefs.audio.carpet_fade_ms, 1500);
        assert!(prefs.soundscape.enabled);
    }

    #[test]
    fn test_wpm_clamped() {
        let mut prefs = ReaderPreferences::default();
        prefs.reading.wpm = 5;
        assert_eq!(prefs.session_config().wpm, 50);
        prefs.reading.wpm = 10_000;
        assert_eq!(prefs.session_config().wpm, 600);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let prefs: ReaderPreferences =
            serde_json::from_str(r#"{"reading": {"wpm": 320}, "audio": {"fade_curve": "s_curve"}}"#)
                .unwrap();
        assert_eq!(prefs.reading.wpm, 320);
        assert_eq!(prefs.reading.snap_window, 3);
        assert_eq!(prefs.audio.fade_curve, FadeCurve::SCurve);
        assert_eq!(prefs.audio.fade_steps, 20);
        assert_eq!(prefs.soundscape.base_url, DEFAULT_SOUNDSCAPE_URL);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config/preferences.json");

        let mut prefs = ReaderPreferences::default();
        prefs.reading.wpm = 410;
        prefs.soundscape.enabled = false;
        prefs.layout.typography = Typography::new(22.0, 34.0);
        prefs.save_to(&path).unwrap();

        let loaded = ReaderPreferences::load_from(&path);
        assert_eq!(loaded.reading.wpm, 410);
        assert!(!loaded.soundscape.enabled);
        assert_eq!(loaded.layout.typography, Typography::new(22.0, 34.0));
    }

    #[test]
    fn test_missing_or_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ReaderPreferences::load_from(dir.path().join("absent.json"));
        assert_eq!(missing.reading.wpm, DEFAULT_WPM);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(ReaderPreferences::load_from(&corrupt).reading.wpm, DEFAULT_WPM);
    }
}
