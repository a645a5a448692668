//! Track load/unload and sample-rate hooks
//!
//! Called from the track loader thread and the engine. The replacement cache
//! is built before the deck lock is taken, so navigator calls only ever wait
//! for the pointer swap.

use mc_core::MarkerStore;
use std::sync::Arc;

use crate::deck::{DeckState, LoadedTrack};

/// Keeps a deck's marker cache in step with the loaded track
pub struct TrackLifecycle {
    deck: Arc<DeckState>,
}

impl TrackLifecycle {
    pub fn new(deck: Arc<DeckState>) -> Self {
        Self { deck }
    }

    /// A new track (or none) was loaded into the deck
    pub fn on_track_loaded(&self, track: Option<Arc<dyn MarkerStore>>) {
        let next = track.map(LoadedTrack::new);
        match &next {
            Some(loaded) => log::info!(
                "Track loaded: {} memory markers cached",
                loaded.cache.len()
            ),
            None => log::info!("Track unloaded"),
        }
        self.deck.replace(next);
    }

    pub fn on_track_unloaded(&self) {
        self.on_track_loaded(None);
    }

    /// Engine reported a new sample rate; zero is ignored
    pub fn on_sample_rate_changed(&self, sample_rate: u32) {
        if sample_rate == 0 {
            log::debug!("Ignoring zero sample rate");
            return;
        }
        self.deck.set_sample_rate(sample_rate);
    }

    /// Re-read the loaded track's markers after an external edit.
    ///
    /// The rebuilt cache is dropped if a load or unload replaced the track
    /// in the meantime. Returns whether the cache was swapped.
    pub fn refresh(&self) -> bool {
        let Some(track) = self.deck.track() else {
            return false;
        };
        let next = LoadedTrack::new(Arc::clone(&track));
        let cached = next.cache.len();
        if self.deck.replace_if_current(&track, next) {
            log::debug!("Marker cache refreshed: {} memory markers", cached);
            true
        } else {
            log::debug!("Track changed during refresh, keeping the newer load");
            false
        }
    }

    pub fn loaded_track(&self) -> Option<Arc<dyn MarkerStore>> {
        self.deck.track()
    }
}
