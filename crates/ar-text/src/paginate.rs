//! Text Pagination
//!
//! Screen-fit estimation without a text shaper:
//! - 90% of the viewport height carries text
//! - a glyph is assumed to be 0.6 em wide
//! - an average word (with its space) is 6 glyphs
//!
//! Pagination is a pure function of its inputs, so a chunk sequence can be
//! dropped and re-derived whenever the page or layout changes.

use ar_core::{Typography, Viewport};

/// Share of the viewport height available for text
pub const USABLE_HEIGHT_RATIO: f32 = 0.9;

/// Estimated glyph width as a fraction of the font size
pub const GLYPH_WIDTH_EM: f32 = 0.6;

/// Average characters per word, including the separating space
pub const AVERAGE_CHARS_PER_WORD: usize = 6;

#[inline]
fn floor_ratio(numerator: f32, denominator: f32) -> usize {
    if denominator.is_nan() || denominator <= 0.0 || !numerator.is_finite() || numerator <= 0.0 {
        return 0;
    }
    (numerator / denominator).floor() as usize
}

/// Lines that fit in the usable height
pub fn lines_per_page(viewport: Viewport, typography: Typography) -> usize {
    floor_ratio(viewport.height * USABLE_HEIGHT_RATIO, typography.line_height)
}

/// Words that fit on one line
pub fn words_per_line(viewport: Viewport, typography: Typography) -> usize {
    let chars_per_line = floor_ratio(viewport.width, typography.font_size * GLYPH_WIDTH_EM);
    chars_per_line / AVERAGE_CHARS_PER_WORD
}

/// Words that fit on one screen
pub fn words_per_page(viewport: Viewport, typography: Typography) -> usize {
    lines_per_page(viewport, typography) * words_per_line(viewport, typography)
}

/// Split `text` into screen-sized chunks.
///
/// Every chunk holds exactly [`words_per_page`] words joined by single spaces,
/// except the last which may be shorter. Always returns at least one chunk;
/// empty text yields `[""]`. A layout too small for a single word degrades to
/// one word per chunk so reading can still progress.
pub fn paginate(text: &str, viewport: Viewport, typography: Typography) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    let per_page = words_per_page(viewport, typography).max(1);
    let chunks: Vec<String> = words.chunks(per_page).map(|chunk| chunk.join(" ")).collect();
    log::trace!("[Paginate] {} words -> {} chunk(s)", words.len(), chunks.len());
    chunks
}

#[inline]
fn is_gap(line: &str) -> bool {
    line.trim().is_empty()
}

/// Group pre-wrapped lines into pages of at most `max_lines_per_page`.
///
/// Blank or whitespace-only lines are paragraph gaps. A gap stays on the page
/// being filled while it fits; a gap that would open a page is dropped since
/// the page break already separates the paragraphs. Always returns at least
/// one (possibly empty) page.
pub fn paginate_by_lines<S: AsRef<str>>(
    lines: &[S],
    max_lines_per_page: usize,
) -> Vec<Vec<String>> {
    let max_lines = max_lines_per_page.max(1);
    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::with_capacity(max_lines);

    for line in lines {
        let line = line.as_ref();
        let gap = is_gap(line);

        if current.len() >= max_lines {
            pages.push(std::mem::replace(&mut current, Vec::with_capacity(max_lines)));
        }

        if gap && current.is_empty() {
            continue;
        }

        current.push(line.to_string());
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    log::trace!("[Paginate] {} lines -> {} page(s)", lines.len(), pages.len());
    pages
}
