//! # Ambireader Audio
//!
//! Owns every audio resource a reading session uses:
//!
//! - **Carpet slot**: one looping ambient track, swapped with crossfades
//! - **One-shot slot**: any number of overlapping trigger effects
//! - **Backends**: the device seam ([`AudioBackend`]) with an in-memory
//!   implementation and an optional rodio implementation (`rodio` feature)
//!
//! ## Cancellation
//!
//! Nothing in flight is ever forcibly cancelled. Every carpet swap is stamped
//! with a monotonically increasing swap token and every one-shot with a
//! generation; a continuation that finds its stamp outdated releases what it
//! loaded and leaves shared state alone.

pub mod backend;
pub mod error;
pub mod fade;
pub mod memory;
pub mod orchestrator;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

pub use backend::*;
pub use error::*;
pub use fade::*;
pub use memory::*;
pub use orchestrator::*;
#[cfg(feature = "rodio")]
pub use rodio_backend::RodioBackend;
