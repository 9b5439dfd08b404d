//! Trigger Scanning
//!
//! A trigger is a dictionary word whose reveal fires a one-shot effect.
//! Trigger ids are the word position rendered as a string, so they are
//! unique within one chunk and deliberately reused across chunks.

use crate::normalize::normalize_word;
use ar_core::SoundCatalog;
use serde::Serialize;

/// A scheduled trigger within one chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerWord {
    /// Position-derived id, unique within the chunk
    pub id: String,
    /// Normalized word
    pub word: String,
    /// Zero-based word index within the chunk
    pub position: usize,
    /// Offset from chunk start (ms)
    pub timing_ms: f64,
    /// Effect key fired when the word is revealed
    pub sound: &'static str,
}

impl TriggerWord {
    pub fn new(
        word: impl Into<String>,
        position: usize,
        ms_per_word: f64,
        sound: &'static str,
    ) -> Self {
        Self {
            id: position.to_string(),
            word: word.into(),
            position,
            timing_ms: position as f64 * ms_per_word,
            sound,
        }
    }
}

/// Find every dictionary word in `words`, in word order.
pub fn find_triggers<S: AsRef<str>>(
    words: &[S],
    ms_per_word: f64,
    catalog: &SoundCatalog,
) -> Vec<TriggerWord> {
    words
        .iter()
        .enumerate()
        .filter_map(|(index, word)| {
            let normalized = normalize_word(word.as_ref());
            let sound = catalog.trigger_sound(&normalized)?;
            Some(TriggerWord::new(normalized, index, ms_per_word, sound))
        })
        .collect()
}

/// Resolve drift between an externally reported word index and local tokens.
///
/// Checks `approx_idx` first, then searches outward up to `window` positions,
/// lower side first at equal distance. Returns `approx_idx` unchanged when no
/// token within the window matches.
pub fn snap_to_nearest_token<S: AsRef<str>>(
    tokens: &[S],
    target_word: &str,
    approx_idx: usize,
    window: usize,
) -> usize {
    let target = normalize_word(target_word);
    if target.is_empty() {
        return approx_idx;
    }

    let matches = |idx: usize| {
        tokens
            .get(idx)
            .is_some_and(|token| normalize_word(token.as_ref()) == target)
    };

    if matches(approx_idx) {
        return approx_idx;
    }

    for distance in 1..=window {
        if let Some(lower) = approx_idx.checked_sub(distance) {
            if matches(lower) {
                return lower;
            }
        }
        if let Some(upper) = approx_idx.checked_add(distance) {
            if matches(upper) {
                return upper;
            }
        }
    }

    approx_idx
}
