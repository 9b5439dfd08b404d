//! Chunk Trigger Schedule
//!
//! Merges dictionary hits with the triggers the soundscape service reported
//! for the page. Service positions are page-level word indices from the
//! service's own tokenizer; they are snapped onto the local page tokens and
//! kept only when they land inside the chunk.

use ar_core::{SoundCatalog, SoundKind};
use ar_soundscape::TriggeredSound;
use ar_text::{TriggerWord, find_triggers, normalize_word, snap_to_nearest_token};
use std::collections::BTreeMap;
use std::ops::Range;

/// Word layout of one page split into chunks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Every word of the page, in order
    pub words: Vec<String>,
    /// Screen-sized chunks, space-joined
    pub chunks: Vec<String>,
    /// Page word index of each chunk's first word
    pub offsets: Vec<usize>,
}

impl PageLayout {
    pub fn new(chunks: Vec<String>) -> Self {
        let mut words = Vec::new();
        let mut offsets = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            offsets.push(words.len());
            words.extend(ar_text::words(chunk).into_iter().map(str::to_string));
        }
        Self {
            words,
            chunks,
            offsets,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Page word range covered by chunk `index`
    pub fn chunk_range(&self, index: usize) -> Range<usize> {
        let start = self.offsets.get(index).copied().unwrap_or(self.words.len());
        let end = self
            .offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.words.len());
        start..end
    }

    /// Chunk containing page word `word_index` (last chunk when past the end)
    pub fn chunk_of_word(&self, word_index: usize) -> usize {
        self.offsets
            .iter()
            .rposition(|&offset| offset <= word_index)
            .unwrap_or(0)
    }
}

/// Build the trigger schedule for chunk `chunk_index` of `layout`.
///
/// A service trigger at the same position as a dictionary hit replaces it.
/// Service triggers without a position match every equal word in the chunk.
/// Service triggers whose sound does not resolve to an effect are dropped.
pub fn build_schedule(
    layout: &PageLayout,
    chunk_index: usize,
    reported: &[TriggeredSound],
    ms_per_word: f64,
    catalog: &SoundCatalog,
    snap_window: usize,
) -> Vec<TriggerWord> {
    let range = layout.chunk_range(chunk_index);
    let chunk_words = &layout.words[range.clone()];

    let mut by_position: BTreeMap<usize, TriggerWord> =
        find_triggers(chunk_words, ms_per_word, catalog)
            .into_iter()
            .map(|t| (t.position, t))
            .collect();

    for sound in reported {
        let word = normalize_word(&sound.word);
        let Some(key) = reported_sound(sound, &word, catalog) else {
            log::trace!("[Session] No effect for reported trigger '{}'", sound.word);
            continue;
        };

        match sound.position {
            Some(approx) => {
                let index = snap_to_nearest_token(&layout.words, &word, approx, snap_window);
                if range.contains(&index) {
                    let local = index - range.start;
                    by_position.insert(local, TriggerWord::new(word, local, ms_per_word, key));
                }
            }
            None => {
                for (local, token) in chunk_words.iter().enumerate() {
                    if normalize_word(token) == word {
                        by_position.insert(
                            local,
                            TriggerWord::new(word.clone(), local, ms_per_word, key),
                        );
                    }
                }
            }
        }
    }

    by_position.into_values().collect()
}

/// Explicit effect file, else the dictionary entry for the word
fn reported_sound(
    sound: &TriggeredSound,
    normalized_word: &str,
    catalog: &SoundCatalog,
) -> Option<&'static str> {
    let explicit = sound
        .file
        .as_deref()
        .and_then(|file| catalog.resolve(file))
        .filter(|asset| asset.kind == SoundKind::Effect)
        .map(|asset| asset.key);
    explicit.or_else(|| catalog.trigger_sound(normalized_word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        PageLayout::new(vec![
            "The gulls cried over".to_string(),
            "the grey sea as thunder".to_string(),
            "rolled in".to_string(),
        ])
    }

    fn reported(word: &str, position: Option<usize>, file: Option<&str>) -> TriggeredSound {
        TriggeredSound {
            word: word.to_string(),
            position,
            file: file.map(str::to_string),
        }
    }

    #[test]
    fn test_layout_offsets() {
        let layout = layout();
        assert_eq!(layout.offsets, vec![0, 4, 9]);
        assert_eq!(layout.chunk_range(1), 4..9);
        assert_eq!(layout.chunk_range(5), 11..11);
        assert_eq!(layout.chunk_of_word(8), 1);
        assert_eq!(layout.chunk_of_word(100), 2);
    }

    #[test]
    fn test_dictionary_only() {
        let catalog = SoundCatalog::builtin();
        let schedule = build_schedule(&layout(), 1, &[], 200.0, &catalog, 3);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].word, "thunder");
        assert_eq!(schedule[0].position, 4);
        assert_eq!(schedule[0].timing_ms, 800.0);
    }

    #[test]
    fn test_reported_position_snapped_into_chunk() {
        let catalog = SoundCatalog::builtin();
        // Service counts "gulls" at 2, actually at page index 1
        let sounds = [reported("gulls", Some(2), Some("effects/owl.mp3"))];
        let schedule = build_schedule(&layout(), 0, &sounds, 100.0, &catalog, 3);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].position, 1);
        assert_eq!(schedule[0].id, "1");
        assert_eq!(schedule[0].sound, "effects/owl.mp3");
    }

    #[test]
    fn test_reported_outside_chunk_ignored() {
        let catalog = SoundCatalog::builtin();
        let sounds = [reported("sea", Some(6), Some("effects/bell.mp3"))];
        assert!(build_schedule(&layout(), 0, &sounds, 100.0, &catalog, 1).is_empty());
        let in_chunk = build_schedule(&layout(), 1, &sounds, 100.0, &catalog, 1);
        assert_eq!(in_chunk.len(), 2);
        assert_eq!(in_chunk[0].position, 2);
        assert_eq!(in_chunk[0].sound, "effects/bell.mp3");
        assert_eq!(in_chunk[1].word, "thunder");
    }

    #[test]
    fn test_reported_overrides_dictionary_sound() {
        let catalog = SoundCatalog::builtin();
        let sounds = [reported("thunder", Some(8), Some("effects/storm.mp3"))];
        let schedule = build_schedule(&layout(), 1, &sounds, 100.0, &catalog, 2);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].sound, "effects/storm.mp3");
    }

    #[test]
    fn test_unpositioned_matches_every_occurrence() {
        let catalog = SoundCatalog::builtin();
        let layout = PageLayout::new(vec!["Owl, owl and another OWL.".to_string()]);
        let sounds = [reported("owl", None, None)];
        let schedule = build_schedule(&layout, 0, &sounds, 100.0, &catalog, 2);
        let positions: Vec<usize> = schedule.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 4]);
    }

    #[test]
    fn test_unresolvable_reported_dropped() {
        let catalog = SoundCatalog::builtin();
        let sounds = [
            reported("gulls", Some(1), None),
            reported("gulls", Some(1), Some("ambience/ocean_waves.mp3")),
        ];
        assert!(build_schedule(&layout(), 0, &sounds, 100.0, &catalog, 2).is_empty());
    }
}
