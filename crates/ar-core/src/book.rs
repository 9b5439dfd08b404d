//! Book Model
//!
//! Books are supplied by an external data source and handed to the session
//! read-only. Chapter and page numbers are the publisher's 1-based numbers;
//! everything the session tracks is a 0-based index into the vectors.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single page of raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number as published (1-based)
    pub number: u32,
    /// Raw text content
    #[serde(default)]
    pub content: String,
}

impl Page {
    pub fn new(number: u32, content: impl Into<String>) -> Self {
        Self {
            number,
            content: content.into(),
        }
    }
}

/// Ordered pages under an optional title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter number as published (1-based)
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn new(number: u32, title: Option<&str>, pages: Vec<Page>) -> Self {
        Self {
            number,
            title: title.map(str::to_string),
            pages,
        }
    }
}

/// A book as delivered by the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier used by the soundscape service
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(id: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            id: id.into(),
            title: None,
            chapters,
        }
    }

    /// Parse a book from JSON
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a book from a JSON file
    pub fn load_from<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check that every chapter can be navigated.
    ///
    /// A readable book has at least one chapter and no chapter without pages.
    pub fn validate(&self) -> CoreResult<()> {
        if self.chapters.is_empty() {
            return Err(CoreError::InvalidBook(format!(
                "book '{}' has no chapters",
                self.id
            )));
        }
        if let Some(chapter) = self.chapters.iter().find(|c| c.pages.is_empty()) {
            return Err(CoreError::InvalidBook(format!(
                "chapter {} of book '{}' has no pages",
                chapter.number, self.id
            )));
        }
        Ok(())
    }

    /// Page at a position, if the position is in bounds
    pub fn page(&self, chapter_index: usize, page_index: usize) -> Option<&Page> {
        self.chapters.get(chapter_index)?.pages.get(page_index)
    }

    /// Number of pages in a chapter (0 when out of bounds)
    pub fn page_count(&self, chapter_index: usize) -> usize {
        self.chapters
            .get(chapter_index)
            .map_or(0, |c| c.pages.len())
    }

    /// Total pages across all chapters
    pub fn total_pages(&self) -> usize {
        self.chapters.iter().map(|c| c.pages.len()).sum()
    }

    /// 1-based page ordinal within the whole book
    pub fn page_ordinal(&self, chapter_index: usize, page_index: usize) -> usize {
        let before: usize = self
            .chapters
            .iter()
            .take(chapter_index)
            .map(|c| c.pages.len())
            .sum();
        before + page_index + 1
    }

    /// Reading progress as `current page / total pages`.
    ///
    /// Returns `0.0` for a book without pages.
    pub fn progress(&self, position: &SessionPosition) -> f32 {
        let total = self.total_pages();
        if total == 0 {
            return 0.0;
        }
        let current = self
            .page_ordinal(position.chapter_index, position.page_index)
            .min(total);
        current as f32 / total as f32
    }
}

/// Where the reader currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SessionPosition {
    pub chapter_index: usize,
    pub page_index: usize,
    pub chunk_index: usize,
}

impl SessionPosition {
    pub const fn new(chapter_index: usize, page_index: usize, chunk_index: usize) -> Self {
        Self {
            chapter_index,
            page_index,
            chunk_index,
        }
    }

    /// Same chapter and page (chunk ignored)
    #[inline]
    pub fn same_page(&self, other: &SessionPosition) -> bool {
        self.chapter_index == other.chapter_index && self.page_index == other.page_index
    }

    /// Clamp chapter and page into the bounds of `book`; chunk is left alone
    /// because chunk bounds depend on layout.
    pub fn clamp_to(self, book: &Book) -> Self {
        let chapter_index = self
            .chapter_index
            .min(book.chapters.len().saturating_sub(1));
        let page_index = self
            .page_index
            .min(book.page_count(chapter_index).saturating_sub(1));
        Self {
            chapter_index,
            page_index,
            chunk_index: self.chunk_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_book() -> Book {
        Book::new(
            "moby",
            vec![
                Chapter::new(
                    1,
                    Some("Loomings"),
                    vec![Page::new(1, "Call me Ishmael."), Page::new(2, "Some years ago")],
                ),
                Chapter::new(2, None, vec![Page::new(3, "The Carpet-Bag")]),
            ],
        )
    }

    #[test]
    fn test_progress() {
        let book = sample_book();
        assert_relative_eq!(book.progress(&SessionPosition::new(0, 0, 0)), 1.0 / 3.0);
        assert_relative_eq!(book.progress(&SessionPosition::new(0, 1, 4)), 2.0 / 3.0);
        assert_relative_eq!(book.progress(&SessionPosition::new(1, 0, 0)), 1.0);
    }

    #[test]
    fn test_progress_empty_book() {
        let book = Book::new("empty", Vec::new());
        assert_eq!(book.progress(&SessionPosition::default()), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(sample_book().validate().is_ok());
        assert!(Book::new("empty", Vec::new()).validate().is_err());

        let hollow = Book::new("hollow", vec![Chapter::new(1, None, Vec::new())]);
        assert!(matches!(hollow.validate(), Err(CoreError::InvalidBook(_))));
    }

    #[test]
    fn test_clamp_position() {
        let book = sample_book();
        let clamped = SessionPosition::new(9, 9, 3).clamp_to(&book);
        assert_eq!(clamped, SessionPosition::new(1, 0, 3));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": "b1",
            "chapters": [
                { "number": 1, "title": "One", "pages": [ { "number": 1, "content": "Hello there" } ] }
            ]
        }"#;
        let book = Book::from_json(json).unwrap();
        assert_eq!(book.id, "b1");
        assert_eq!(book.chapters[0].title.as_deref(), Some("One"));
        assert_eq!(book.page(0, 0).unwrap().content, "Hello there");
        assert!(book.page(0, 1).is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        fs::write(&path, serde_json::to_string(&sample_book()).unwrap()).unwrap();
        assert_eq!(Book::load_from(&path).unwrap(), sample_book());
    }
}
