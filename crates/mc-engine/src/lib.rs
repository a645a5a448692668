//! mc-engine: Memory marker navigation for a playing deck
//!
//! Wires a deck's marker cache to the transport:
//! - `MarkerNavigator`: create / clear / seek relative to the playhead
//! - `TrackLifecycle`: rebuilds the cache when tracks are loaded or unloaded
//! - `DeckControls`: trigger-button entry points
//! - `probe`: read-only queries for presentation layers

pub mod controls;
pub mod deck;
pub mod lifecycle;
pub mod navigator;
pub mod position;
pub mod probe;

pub use controls::{ControlKey, DeckControls};
pub use deck::{DeckState, LoadedTrack};
pub use lifecycle::TrackLifecycle;
pub use navigator::MarkerNavigator;
pub use position::{PlaybackPosition, PlaybackSnapshot, PositionSource, SeekQueue, SeekSink};
pub use probe::{marker_at_position, visible_memory_markers};

use mc_state::MarkerPreferences;
use std::sync::Arc;

/// One deck's marker navigation, fully wired
pub struct MarkerDeck {
    pub controls: DeckControls,
    pub lifecycle: TrackLifecycle,
    pub position: Arc<PlaybackPosition>,
    pub seeks: Arc<SeekQueue>,
}

impl MarkerDeck {
    pub fn new(prefs: &MarkerPreferences) -> Self {
        let deck = Arc::new(DeckState::new(prefs.default_sample_rate));
        let position = Arc::new(PlaybackPosition::new());
        let seeks = Arc::new(SeekQueue::new(prefs.seek_queue_capacity));
        let navigator = MarkerNavigator::new(
            Arc::clone(&deck),
            position.clone(),
            seeks.clone(),
            prefs,
        );
        Self {
            controls: DeckControls::new(navigator),
            lifecycle: TrackLifecycle::new(deck),
            position,
            seeks,
        }
    }

    pub fn navigator(&self) -> &MarkerNavigator {
        self.controls.navigator()
    }
}
