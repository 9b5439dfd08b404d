//! ar-core: Book model, sound catalog and reading pace
//!
//! Shared vocabulary for the reading engine:
//!
//! - **Book model**: books, chapters, pages and the session position
//! - **Layout**: viewport and typography supplied by the presentation layer
//! - **Pace**: words-per-minute bounds and per-word timing
//! - **Catalog**: static sound asset table, aliases and the trigger dictionary

pub mod book;
pub mod catalog;
pub mod error;
pub mod layout;
pub mod pace;

pub use book::*;
pub use catalog::*;
pub use error::*;
pub use layout::*;
pub use pace::*;
