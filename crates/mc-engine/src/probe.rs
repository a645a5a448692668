//! Read-only marker queries for presentation layers
//!
//! These read the track directly rather than the navigator cache, and use
//! their own, much wider, tolerance: a button asking "is the playhead on a
//! marker?" should light up while the user is anywhere near one.

use mc_core::{Marker, MarkerStore};
use std::sync::Arc;

/// Memory marker near the playhead, for the marker popup button.
///
/// `track_samples` is the track length in engine samples; `tolerance` is in
/// engine samples. Returns the first match in track order.
pub fn marker_at_position(
    track: &dyn MarkerStore,
    play_position: f64,
    track_samples: f64,
    tolerance: f64,
) -> Option<Arc<Marker>> {
    if track_samples.is_nan() || track_samples <= 0.0 || !play_position.is_finite() {
        return None;
    }
    let current = play_position * track_samples;
    track
        .memory_markers()
        .into_iter()
        .find(|m| (current - m.start_engine_pos()).abs() < tolerance)
}

/// Memory markers strictly inside the displayed window.
///
/// `first` and `last` are the normalized edges of the visible waveform.
pub fn visible_memory_markers(
    track: &dyn MarkerStore,
    first: f64,
    last: f64,
    track_samples: f64,
) -> Vec<Arc<Marker>> {
    if track_samples.is_nan() || track_samples <= 0.0 {
        return Vec::new();
    }
    let (start, end) = (first * track_samples, last * track_samples);
    track
        .memory_markers()
        .into_iter()
        .filter(|m| {
            let pos = m.start_engine_pos();
            pos > start && pos < end
        })
        .collect()
}
