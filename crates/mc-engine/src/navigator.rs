//! Memory marker navigation during playback
//!
//! Every operation reads a fresh playback snapshot, scans the deck's marker
//! cache once and then acts (seek, create or remove). Routine conditions
//! (nothing loaded, unknown duration, no qualifying marker) are silent
//! no-ops; nothing is surfaced to the caller as an error.

use mc_core::{
    FramePos, Marker, MarkerKind, McError, McResult, POSITION_TOLERANCE, seconds_to_engine_samples,
};
use mc_state::{MarkerCache, MarkerPreferences};
use std::sync::Arc;

use crate::deck::DeckState;
use crate::position::{PlaybackSnapshot, PositionSource, SeekSink};

/// Current playhead, resolved from a snapshot
#[derive(Debug, Clone, Copy)]
struct Playhead {
    position: FramePos,
    /// `position` in engine samples
    engine_pos: f64,
    sample_rate: u32,
}

/// Create, clear and seek memory markers relative to the playhead
pub struct MarkerNavigator {
    deck: Arc<DeckState>,
    position: Arc<dyn PositionSource>,
    seeker: Arc<dyn SeekSink>,
    skip_window_secs: f64,
}

impl MarkerNavigator {
    pub fn new(
        deck: Arc<DeckState>,
        position: Arc<dyn PositionSource>,
        seeker: Arc<dyn SeekSink>,
        prefs: &MarkerPreferences,
    ) -> Self {
        Self {
            deck,
            position,
            seeker,
            skip_window_secs: prefs.skip_window_secs,
        }
    }

    pub fn deck(&self) -> &Arc<DeckState> {
        &self.deck
    }

    fn playhead(&self) -> McResult<Playhead> {
        let snapshot = PlaybackSnapshot::read(self.position.as_ref(), self.deck.sample_rate());
        let position = snapshot
            .absolute_position()
            .ok_or(McError::PositionUnavailable)?;
        Ok(Playhead {
            position,
            engine_pos: position.to_engine_sample_pos(),
            sample_rate: snapshot.sample_rate,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CREATE
    // ═══════════════════════════════════════════════════════════════════════

    /// Create a memory marker at the playhead.
    ///
    /// Returns the index proposed to the track, or `None` when nothing was
    /// created (no track, unknown position, marker already there, track
    /// refused).
    pub fn create_at_current_position(&self) -> Option<u32> {
        absorb("create memory marker", self.try_create_at_current_position())
    }

    fn try_create_at_current_position(&self) -> McResult<u32> {
        let playhead = self.playhead()?;
        self.deck.with_loaded(|loaded| {
            if let Some(existing) = loaded.cache.find_at(playhead.engine_pos, POSITION_TOLERANCE) {
                return Err(McError::DuplicatePosition(existing.start_engine_pos()));
            }

            let index = loaded.cache.next_free_index();
            let marker = loaded.track.create_marker(
                MarkerKind::Memory,
                Some(index),
                playhead.position,
                playhead.position,
            )?;
            loaded.cache.insert_sorted(&marker);
            log::debug!(
                "Created memory marker {} (index hint {}) at engine sample {}",
                marker.id,
                index,
                playhead.engine_pos
            );
            Ok(index)
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CLEAR
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove the memory marker at the playhead
    pub fn clear_nearest_to_current_position(&self) -> bool {
        self.clear_with("clear memory marker", |cache, pos| {
            cache.find_at(pos, POSITION_TOLERANCE)
        })
    }

    /// Remove the closest memory marker before the playhead
    pub fn clear_nearest_before_current_position(&self) -> bool {
        self.clear_with("clear memory marker before", |cache, pos| {
            cache.find_before(pos, POSITION_TOLERANCE, 0.0)
        })
    }

    /// Remove the closest memory marker after the playhead
    pub fn clear_nearest_after_current_position(&self) -> bool {
        self.clear_with("clear memory marker after", |cache, pos| {
            cache.find_after(pos, POSITION_TOLERANCE)
        })
    }

    /// Remove every memory marker of the loaded track
    pub fn clear_all(&self) -> bool {
        let result = self.deck.with_loaded(|loaded| {
            loaded.track.remove_markers_of_kind(MarkerKind::Memory)?;
            loaded.cache.clear();
            Ok(true)
        });
        absorb("clear all memory markers", result).unwrap_or(false)
    }

    fn clear_with(
        &self,
        op: &str,
        pick: impl FnOnce(&MarkerCache, f64) -> Option<Arc<Marker>>,
    ) -> bool {
        let result = self.playhead().and_then(|playhead| {
            self.deck.with_loaded(|loaded| {
                let Some(marker) = pick(&loaded.cache, playhead.engine_pos) else {
                    return Ok(false);
                };
                // Cache follows the track, never the other way round
                loaded.track.remove_marker(&marker)?;
                loaded.cache.remove_matching(&marker);
                log::debug!("Removed memory marker {}", marker.id);
                Ok(true)
            })
        });
        absorb(op, result).unwrap_or(false)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SEEK
    // ═══════════════════════════════════════════════════════════════════════

    /// Seek to the first memory marker after the playhead
    pub fn seek_to_next_marker(&self) -> Option<FramePos> {
        self.seek_with("seek next marker", |cache, playhead| {
            cache.find_after(playhead.engine_pos, POSITION_TOLERANCE)
        })
    }

    /// Seek to the last memory marker before the playhead
    pub fn seek_to_previous_marker(&self) -> Option<FramePos> {
        self.seek_with("seek previous marker", |cache, playhead| {
            cache.find_before(playhead.engine_pos, POSITION_TOLERANCE, 0.0)
        })
    }

    /// Seek to the previous memory marker, passing over any marker that lies
    /// within the skip window behind the playhead.
    pub fn seek_to_previous_marker_with_skip(&self) -> Option<FramePos> {
        let skip_window_secs = self.skip_window_secs;
        self.seek_with("seek previous marker with skip", |cache, playhead| {
            let window = seconds_to_engine_samples(skip_window_secs, playhead.sample_rate);
            cache.find_before(playhead.engine_pos, POSITION_TOLERANCE, window)
        })
    }

    fn seek_with(
        &self,
        op: &str,
        pick: impl FnOnce(&MarkerCache, &Playhead) -> Option<Arc<Marker>>,
    ) -> Option<FramePos> {
        let result = self.playhead().and_then(|playhead| {
            self.deck.with_loaded(|loaded| {
                let target = pick(&loaded.cache, &playhead).map(|m| m.start);
                if let Some(target) = target {
                    self.seeker.seek_abs(target);
                }
                Ok(target)
            })
        });
        absorb(op, result).flatten()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERY
    // ═══════════════════════════════════════════════════════════════════════

    /// Cached memory markers of the loaded track, ascending
    pub fn memory_markers(&self) -> Vec<Arc<Marker>> {
        self.deck
            .with_loaded(|loaded| Ok(loaded.cache.markers()))
            .unwrap_or_default()
    }

    /// Index the next created marker would be proposed with
    pub fn next_free_index(&self) -> Option<u32> {
        self.deck
            .with_loaded(|loaded| Ok(loaded.cache.next_free_index()))
            .ok()
    }
}

/// Swallow an operation failure at the navigator boundary
fn absorb<T>(op: &str, result: McResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(McError::NoTrack | McError::PositionUnavailable) => None,
        Err(e @ McError::DuplicatePosition(_)) => {
            log::debug!("{}: {}", op, e);
            None
        }
        Err(e) => {
            log::warn!("{}: {}", op, e);
            None
        }
    }
}
