//! Marker navigation integration tests
//!
//! Tests for:
//! - Cache ordering after rebuild / create / clear
//! - Duplicate-position rejection and index proposals
//! - Seek next / previous / previous-with-skip
//! - Clear nearest / before / after / all
//! - Track lifecycle and cross-thread track swaps
//! - Trigger control dispatch
//!
//! Positions below are given in engine samples (frames × 2).

use mc_core::{FramePos, Marker, MarkerKind, MarkerStore, McResult, POSITION_TOLERANCE};
use mc_engine::{ControlKey, MarkerDeck, PositionSource, TrackLifecycle};
use mc_state::{IndexPolicy, MarkerPreferences, Track};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Low rate keeps every test position exactly representable
const TEST_SAMPLE_RATE: u32 = 10;

struct Fixture {
    deck: MarkerDeck,
    track: Arc<Track>,
    duration_secs: f64,
}

impl Fixture {
    fn new(duration_secs: f64, engine_positions: &[f64]) -> Self {
        Self::with_prefs(duration_secs, engine_positions, MarkerPreferences::default())
    }

    fn with_prefs(duration_secs: f64, engine_positions: &[f64], prefs: MarkerPreferences) -> Self {
        let track = Arc::new(Track::with_markers(
            "Fixture",
            engine_positions.iter().map(|&p| memory_at(p, None)),
        ));
        Self::with_track(duration_secs, track, prefs)
    }

    fn with_track(duration_secs: f64, track: Arc<Track>, prefs: MarkerPreferences) -> Self {
        let prefs = MarkerPreferences {
            default_sample_rate: TEST_SAMPLE_RATE,
            ..prefs
        };
        let deck = MarkerDeck::new(&prefs);
        deck.position.set_duration_secs(duration_secs);
        deck.lifecycle.on_track_loaded(Some(track.clone()));
        Self {
            deck,
            track,
            duration_secs,
        }
    }

    /// Put the playhead at an engine-sample position
    fn at(&self, engine_pos: f64) -> &Self {
        let frames = engine_pos / 2.0;
        let total = self.duration_secs * TEST_SAMPLE_RATE as f64;
        self.deck.position.set_play_position(frames / total);
        self
    }

    fn cached(&self) -> Vec<f64> {
        self.deck
            .navigator()
            .memory_markers()
            .iter()
            .map(|m| m.start_engine_pos())
            .collect()
    }

    fn track_positions(&self) -> Vec<f64> {
        let mut positions: Vec<f64> = self
            .track
            .memory_markers()
            .iter()
            .map(|m| m.start_engine_pos())
            .collect();
        positions.sort_by(f64::total_cmp);
        positions
    }

    fn seeks(&self) -> Vec<f64> {
        self.deck
            .seeks
            .drain()
            .into_iter()
            .map(FramePos::to_engine_sample_pos)
            .collect()
    }
}

fn memory_at(engine_pos: f64, index: Option<u32>) -> Marker {
    Marker::memory(index, FramePos::from_engine_sample_pos(engine_pos))
}

fn assert_sorted(positions: &[f64]) {
    assert!(
        positions.windows(2).all(|w| w[0] <= w[1]),
        "cache not sorted: {:?}",
        positions
    );
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < POSITION_TOLERANCE,
        "expected {} got {}",
        expected,
        actual
    );
}

/// Track that runs a one-shot hook the next time its markers are read
struct HookedTrack {
    inner: Track,
    on_read: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl HookedTrack {
    fn new(inner: Track) -> Self {
        Self {
            inner,
            on_read: Mutex::new(None),
        }
    }

    fn arm(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_read.lock() = Some(Box::new(hook));
    }
}

impl MarkerStore for HookedTrack {
    fn markers(&self) -> Vec<Arc<Marker>> {
        let hook = self.on_read.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.markers()
    }

    fn create_marker(
        &self,
        kind: MarkerKind,
        index_hint: Option<u32>,
        start: FramePos,
        end: FramePos,
    ) -> McResult<Arc<Marker>> {
        self.inner.create_marker(kind, index_hint, start, end)
    }

    fn remove_marker(&self, marker: &Marker) -> McResult<()> {
        self.inner.remove_marker(marker)
    }

    fn remove_markers_of_kind(&self, kind: MarkerKind) -> McResult<()> {
        self.inner.remove_markers_of_kind(kind)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rebuild_matches_track_memory_markers() {
    let track = Arc::new(Track::with_markers(
        "Mixed",
        [
            memory_at(900.0, None),
            Marker::new(MarkerKind::HotCue, Some(1), FramePos(50.0), FramePos(50.0)),
            memory_at(100.0, None),
            Marker::new(MarkerKind::LoadPoint, None, FramePos(0.0), FramePos(0.0)),
            memory_at(500.0, None),
        ],
    ));
    let fx = Fixture::with_track(100.0, track, MarkerPreferences::default());

    assert_eq!(fx.cached(), vec![100.0, 500.0, 900.0]);

    let mut cached_ids: Vec<_> = fx.deck.navigator().memory_markers().iter().map(|m| m.id).collect();
    let mut track_ids: Vec<_> = fx.track.memory_markers().iter().map(|m| m.id).collect();
    cached_ids.sort();
    track_ids.sort();
    assert_eq!(cached_ids, track_ids);
}

#[test]
fn test_cache_stays_sorted_through_edits() {
    let fx = Fixture::new(100.0, &[1200.0, 300.0]);
    assert_sorted(&fx.cached());

    fx.at(800.0);
    assert!(fx.deck.navigator().create_at_current_position().is_some());
    assert_sorted(&fx.cached());

    fx.at(40.0);
    assert!(fx.deck.navigator().create_at_current_position().is_some());
    assert_sorted(&fx.cached());

    fx.at(800.0);
    assert!(fx.deck.navigator().clear_nearest_to_current_position());
    assert_sorted(&fx.cached());

    let cached = fx.cached();
    assert_eq!(cached.len(), 3);
    assert_close(cached[0], 40.0);
    assert_close(cached[1], 300.0);
    assert_close(cached[2], 1200.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CREATE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_create_on_empty_track() {
    let fx = Fixture::new(100.0, &[]);
    let nav = fx.deck.navigator();
    assert_eq!(nav.next_free_index(), Some(0));

    fx.at(1000.0);
    assert_eq!(nav.create_at_current_position(), Some(0));

    let markers = nav.memory_markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].index, Some(0));
    assert_close(markers[0].start_engine_pos(), 1000.0);
    assert_eq!(fx.track.memory_markers().len(), 1);
}

#[test]
fn test_create_rejects_duplicate_position() {
    let fx = Fixture::new(100.0, &[600.0]);
    let before = fx.cached();

    for offset in [-0.4, 0.0, 0.3, 0.49] {
        fx.at(600.0 + offset);
        assert_eq!(fx.deck.navigator().create_at_current_position(), None);
    }
    assert_eq!(fx.cached(), before);
    assert_eq!(fx.track.memory_markers().len(), 1);

    // One full sample away is a different position
    fx.at(601.0);
    assert!(fx.deck.navigator().create_at_current_position().is_some());
    assert_eq!(fx.cached().len(), 2);
}

#[test]
fn test_create_fills_index_gap() {
    let track = Arc::new(Track::with_markers(
        "Indexed",
        [memory_at(100.0, Some(0)), memory_at(200.0, Some(1)), memory_at(300.0, Some(3))],
    ));
    let fx = Fixture::with_track(100.0, track, MarkerPreferences::default());
    assert_eq!(fx.deck.navigator().next_free_index(), Some(2));

    fx.at(700.0);
    assert_eq!(fx.deck.navigator().create_at_current_position(), Some(2));
    assert_eq!(fx.deck.navigator().next_free_index(), Some(4));
}

#[test]
fn test_create_unindexed_track_proposes_size() {
    let track = Arc::new(Track::with_policy("Unindexed", IndexPolicy::Unindexed));
    let fx = Fixture::with_track(100.0, track, MarkerPreferences::default());
    let nav = fx.deck.navigator();

    fx.at(100.0);
    assert_eq!(nav.create_at_current_position(), Some(0));
    fx.at(300.0);
    assert_eq!(nav.create_at_current_position(), Some(1));

    assert!(nav.memory_markers().iter().all(|m| m.index.is_none()));
}

#[test]
fn test_create_refused_by_track_leaves_cache() {
    let fx = Fixture::new(100.0, &[100.0]);
    fx.track.set_locked(true);

    fx.at(500.0);
    assert_eq!(fx.deck.navigator().create_at_current_position(), None);
    assert_eq!(fx.cached(), vec![100.0]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLEAR
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_clear_nearest_within_tolerance() {
    let fx = Fixture::new(100.0, &[100.0, 500.0, 900.0]);

    fx.at(500.3);
    assert!(fx.deck.navigator().clear_nearest_to_current_position());
    assert_eq!(fx.cached(), vec![100.0, 900.0]);
    assert_eq!(fx.track_positions(), vec![100.0, 900.0]);

    // Nothing left under the playhead
    assert!(!fx.deck.navigator().clear_nearest_to_current_position());
    assert_eq!(fx.cached(), vec![100.0, 900.0]);
}

#[test]
fn test_clear_before_and_after_remove_one_each() {
    let fx = Fixture::new(100.0, &[100.0, 300.0, 500.0, 700.0, 900.0]);
    let nav = fx.deck.navigator();

    fx.at(500.0);
    assert!(nav.clear_nearest_before_current_position());
    assert_eq!(fx.cached(), vec![100.0, 500.0, 700.0, 900.0]);

    assert!(nav.clear_nearest_after_current_position());
    assert_eq!(fx.cached(), vec![100.0, 500.0, 900.0]);
    assert_eq!(fx.track_positions(), vec![100.0, 500.0, 900.0]);
}

#[test]
fn test_clear_before_ignores_marker_under_playhead() {
    let fx = Fixture::new(100.0, &[500.0]);
    fx.at(500.2);
    assert!(!fx.deck.navigator().clear_nearest_before_current_position());
    assert!(!fx.deck.navigator().clear_nearest_after_current_position());
    assert_eq!(fx.cached(), vec![500.0]);
}

#[test]
fn test_clear_refused_by_track_keeps_cache() {
    let fx = Fixture::new(100.0, &[100.0, 500.0]);
    fx.track.set_locked(true);

    fx.at(500.0);
    assert!(!fx.deck.navigator().clear_nearest_to_current_position());
    assert!(!fx.deck.navigator().clear_all());
    assert_eq!(fx.cached(), vec![100.0, 500.0]);
    assert_eq!(fx.track_positions(), vec![100.0, 500.0]);
}

#[test]
fn test_clear_all_keeps_other_kinds() {
    let track = Arc::new(Track::with_markers(
        "Mixed",
        [
            memory_at(100.0, None),
            Marker::new(MarkerKind::HotCue, Some(0), FramePos(10.0), FramePos(10.0)),
            memory_at(300.0, None),
        ],
    ));
    let fx = Fixture::with_track(100.0, track, MarkerPreferences::default());

    assert!(fx.deck.navigator().clear_all());
    assert!(fx.cached().is_empty());
    assert!(fx.track.memory_markers().is_empty());
    assert_eq!(fx.track.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEEK
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_seek_next_and_previous() {
    let fx = Fixture::new(100.0, &[200.0, 400.0, 800.0]);
    let nav = fx.deck.navigator();

    fx.at(400.0);
    assert_eq!(nav.seek_to_next_marker().map(FramePos::to_engine_sample_pos), Some(800.0));
    assert_eq!(nav.seek_to_previous_marker().map(FramePos::to_engine_sample_pos), Some(200.0));
    assert_eq!(fx.seeks(), vec![800.0, 200.0]);
}

#[test]
fn test_seek_never_targets_marker_under_playhead() {
    let fx = Fixture::new(100.0, &[100.0, 500.0, 900.0]);
    let nav = fx.deck.navigator();

    for current in [100.0, 100.4, 499.6, 500.0, 500.45, 900.0] {
        fx.at(current);
        if let Some(next) = nav.seek_to_next_marker() {
            assert!(next.to_engine_sample_pos() - current > POSITION_TOLERANCE);
        }
        if let Some(prev) = nav.seek_to_previous_marker() {
            assert!(current - prev.to_engine_sample_pos() > POSITION_TOLERANCE);
        }
    }
}

#[test]
fn test_seek_next_past_last_marker_is_noop() {
    let fx = Fixture::new(100.0, &[200.0, 800.0]);
    fx.at(900.0);

    assert!(fx.deck.navigator().seek_to_next_marker().is_none());
    assert!(fx.seeks().is_empty());
}

#[test]
fn test_seek_previous_with_skip_window() {
    // 30 s at 10 Hz; 2.5 s window = 50 engine samples
    let prefs = MarkerPreferences {
        skip_window_secs: 2.5,
        ..Default::default()
    };
    let fx = Fixture::with_prefs(30.0, &[100.0, 140.0, 300.0], prefs);
    let nav = fx.deck.navigator();

    fx.at(150.0);
    assert_eq!(
        nav.seek_to_previous_marker_with_skip().map(FramePos::to_engine_sample_pos),
        Some(100.0)
    );
    assert_eq!(
        nav.seek_to_previous_marker().map(FramePos::to_engine_sample_pos),
        Some(140.0)
    );
    assert_eq!(fx.seeks(), vec![100.0, 140.0]);
}

#[test]
fn test_seek_previous_with_skip_nothing_older() {
    let prefs = MarkerPreferences {
        skip_window_secs: 2.5,
        ..Default::default()
    };
    let fx = Fixture::with_prefs(30.0, &[140.0], prefs);

    fx.at(150.0);
    assert!(fx.deck.navigator().seek_to_previous_marker_with_skip().is_none());
    assert!(fx.seeks().is_empty());
}

#[test]
fn test_seek_skips_markers_removed_behind_cache() {
    let fx = Fixture::new(100.0, &[200.0, 400.0, 800.0]);

    // Edit made elsewhere in the application, cache not rebuilt yet
    let stale = fx.track.memory_markers().into_iter().find(|m| m.start_engine_pos() == 400.0).unwrap();
    fx.track.remove_marker(&stale).unwrap();
    drop(stale);

    fx.at(300.0);
    assert_eq!(
        fx.deck.navigator().seek_to_next_marker().map(FramePos::to_engine_sample_pos),
        Some(800.0)
    );

    assert!(fx.deck.lifecycle.refresh());
    assert_eq!(fx.cached(), vec![200.0, 800.0]);
}

#[test]
fn test_seek_follows_sample_rate_change() {
    let fx = Fixture::new(100.0, &[400.0, 1600.0]);
    // Playhead at normalized 0.2 → frame 200 at 10 Hz, frame 100 at 5 Hz
    fx.deck.position.set_play_position(0.2);
    assert_eq!(
        fx.deck.navigator().seek_to_next_marker().map(FramePos::to_engine_sample_pos),
        Some(1600.0)
    );

    fx.deck.lifecycle.on_sample_rate_changed(5);
    assert_eq!(
        fx.deck.navigator().seek_to_next_marker().map(FramePos::to_engine_sample_pos),
        Some(400.0)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_unload_empties_cache_and_disables_operations() {
    let fx = Fixture::new(100.0, &[50.0]);
    assert_eq!(fx.cached(), vec![50.0]);

    fx.deck.lifecycle.on_track_unloaded();
    assert!(fx.cached().is_empty());

    let nav = fx.deck.navigator();
    fx.at(10.0);
    assert!(nav.seek_to_next_marker().is_none());
    assert!(nav.seek_to_previous_marker().is_none());
    assert!(nav.seek_to_previous_marker_with_skip().is_none());
    assert!(nav.create_at_current_position().is_none());
    assert!(!nav.clear_nearest_to_current_position());
    assert!(!nav.clear_all());
    assert!(nav.next_free_index().is_none());
    assert!(fx.seeks().is_empty());

    // Track itself is untouched
    assert_eq!(fx.track.memory_markers().len(), 1);
}

#[test]
fn test_loading_new_track_replaces_cache() {
    let fx = Fixture::new(100.0, &[100.0, 200.0]);
    let other = Arc::new(Track::with_markers("Other", [memory_at(700.0, None)]));

    fx.deck.lifecycle.on_track_loaded(Some(other.clone()));
    assert_eq!(fx.cached(), vec![700.0]);

    // Creating now lands on the new track only
    fx.at(900.0);
    assert!(fx.deck.navigator().create_at_current_position().is_some());
    assert_eq!(other.memory_markers().len(), 2);
    assert_eq!(fx.track.memory_markers().len(), 2);
}

#[test]
fn test_background_track_swaps_are_atomic() {
    let fx = Fixture::new(100.0, &[]);
    let first: Arc<dyn MarkerStore> =
        Arc::new(Track::with_markers("First", [memory_at(300.0, None), memory_at(600.0, None)]));
    let second: Arc<dyn MarkerStore> =
        Arc::new(Track::with_markers("Second", [memory_at(1000.0, None), memory_at(1400.0, None)]));

    let deck = Arc::new(fx.deck);
    let loader = {
        let deck = Arc::clone(&deck);
        thread::spawn(move || {
            for i in 0..500 {
                let next = match i % 3 {
                    0 => Some(Arc::clone(&first)),
                    1 => Some(Arc::clone(&second)),
                    _ => None,
                };
                deck.lifecycle.on_track_loaded(next);
            }
        })
    };

    deck.position.set_play_position(0.01);
    for _ in 0..500 {
        let cached: Vec<f64> = deck
            .navigator()
            .memory_markers()
            .iter()
            .map(|m| m.start_engine_pos())
            .collect();
        assert!(
            cached.is_empty() || cached == [300.0, 600.0] || cached == [1000.0, 1400.0],
            "observed half-built cache: {:?}",
            cached
        );

        if let Some(target) = deck.navigator().seek_to_next_marker() {
            let target = target.to_engine_sample_pos();
            assert!(target == 300.0 || target == 1000.0, "unexpected target {}", target);
        }
    }

    loader.join().unwrap();
}

#[test]
fn test_refresh_keeps_track_loaded_during_rebuild() {
    let fx = Fixture::new(100.0, &[]);
    let old = Arc::new(HookedTrack::new(Track::with_markers("Old", [memory_at(200.0, None)])));
    let newer = Arc::new(Track::with_markers("New", [memory_at(1400.0, None)]));
    fx.deck.lifecycle.on_track_loaded(Some(old.clone()));
    assert_eq!(fx.cached(), vec![200.0]);

    // Loader thread swaps in another track while refresh reads the old one
    let deck = Arc::clone(fx.deck.navigator().deck());
    old.arm(move || {
        thread::spawn(move || TrackLifecycle::new(deck).on_track_loaded(Some(newer)))
            .join()
            .unwrap();
    });

    assert!(!fx.deck.lifecycle.refresh());
    assert_eq!(fx.cached(), vec![1400.0], "refresh must not reinstate the old track");
    let loaded: Vec<f64> = fx
        .deck
        .lifecycle
        .loaded_track()
        .unwrap()
        .memory_markers()
        .iter()
        .map(|m| m.start_engine_pos())
        .collect();
    assert_eq!(loaded, vec![1400.0]);

    fx.at(300.0);
    assert_eq!(
        fx.deck.navigator().seek_to_next_marker().map(FramePos::to_engine_sample_pos),
        Some(1400.0)
    );
}

#[test]
fn test_refresh_without_track_is_noop() {
    let fx = Fixture::new(100.0, &[]);
    fx.deck.lifecycle.on_track_unloaded();
    assert!(!fx.deck.lifecycle.refresh());
    assert!(!fx.deck.navigator().deck().is_loaded());
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_trigger_requires_positive_value() {
    let fx = Fixture::new(100.0, &[]);
    let controls = &fx.deck.controls;

    fx.at(400.0);
    assert!(!controls.trigger(ControlKey::MemoryCreateAtCurrent, 0.0));
    assert!(!controls.trigger(ControlKey::MemoryCreateAtCurrent, -1.0));
    assert!(fx.cached().is_empty());

    assert!(controls.trigger(ControlKey::MemoryCreateAtCurrent, 1.0));
    assert_eq!(fx.cached().len(), 1);
}

#[test]
fn test_trigger_by_name_dispatch() {
    let fx = Fixture::new(100.0, &[200.0, 600.0]);
    let controls = &fx.deck.controls;

    fx.at(400.0);
    assert!(controls.trigger_by_name("seek_next_marker", 1.0).unwrap());
    assert!(controls.trigger_by_name("seek_previous_marker_with_skip", 1.0).unwrap());
    assert_eq!(fx.seeks(), vec![600.0, 200.0]);

    assert!(controls.trigger_by_name("memory_clear_after", 1.0).unwrap());
    assert_eq!(fx.cached(), vec![200.0]);
    assert!(controls.trigger_by_name("memory_clear_all", 1.0).unwrap());
    assert!(fx.cached().is_empty());

    assert!(controls.trigger_by_name("seek_30s", 1.0).is_err());
}

#[test]
fn test_playback_position_is_position_source() {
    let fx = Fixture::new(100.0, &[]);
    fx.at(500.0);
    assert!((fx.deck.position.play_position() - 0.25).abs() < 1e-12);
    assert_eq!(fx.deck.position.duration_secs(), 100.0);
}
