//! ar-soundscape: Soundscape service client
//!
//! Per-page ambience lookup against the remote soundscape service:
//!
//! ```text
//! GET {base}/book/{bookId}/chapter{N}/page/{M}
//!   → { "carpet_tracks": [...], "triggered_sounds": [...], ... }
//! ```
//!
//! Chapter and page numbers on the wire are 1-based. The service is
//! consumed through [`SoundscapeSource`] so sessions can run against a
//! scripted source.

pub mod client;
pub mod error;
pub mod model;

pub use client::*;
pub use error::*;
pub use model::*;
