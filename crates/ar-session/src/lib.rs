//! # Ambireader Session
//!
//! Coordinates one reading session:
//!
//! - **WordClock**: word-by-word reveal with trigger dispatch
//! - **Schedule**: dictionary and service-reported triggers for a chunk
//! - **ReadingSession**: position, navigation, focus and soundscape requests
//! - **Preferences**: persisted reader settings
//!
//! ## Ownership
//!
//! The session owns the position and the clock. Audio handles belong to the
//! [`AudioOrchestrator`](ar_audio::AudioOrchestrator); the session only asks
//! it for carpets, triggers and teardown.

pub mod clock;
pub mod error;
pub mod preferences;
pub mod schedule;
pub mod session;

pub use clock::*;
pub use error::*;
pub use preferences::*;
pub use schedule::*;
pub use session::*;
