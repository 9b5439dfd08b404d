//! ar-text: Pagination and trigger scanning
//!
//! Turns page text into what the reveal clock consumes:
//!
//! - **Pagination**: screen-sized chunks from viewport and typography
//! - **Normalization**: comparable word forms for dictionary lookups
//! - **Triggers**: dictionary hits with their scheduled offsets
//! - **Alignment**: snapping externally tokenized positions onto local words

pub mod normalize;
pub mod paginate;
pub mod triggers;

pub use normalize::*;
pub use paginate::*;
pub use triggers::*;

/// Split text into whitespace-separated words
#[inline]
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
