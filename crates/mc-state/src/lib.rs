//! mc-state: Track marker state, marker cache, preferences
//!
//! The authoritative in-memory track, the derived memory-marker cache
//! and persisted navigation preferences.

mod markers;
mod preferences;
mod track;

pub use markers::*;
pub use preferences::*;
pub use track::*;
