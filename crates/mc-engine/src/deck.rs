//! Per-deck shared state
//!
//! The loaded track and its marker cache live together behind one lock so a
//! track swap replaces both in a single step. The loader thread only ever
//! swaps; the control context reads and patches.

use mc_core::{MarkerStore, McError, McResult};
use mc_state::MarkerCache;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// A track together with its memory marker cache
pub struct LoadedTrack {
    pub track: Arc<dyn MarkerStore>,
    pub cache: MarkerCache,
}

impl LoadedTrack {
    /// Build the cache for `track`
    pub fn new(track: Arc<dyn MarkerStore>) -> Self {
        let cache = MarkerCache::from_track(Some(track.as_ref()));
        Self { track, cache }
    }
}

/// State shared by the navigator and the lifecycle adapter of one deck
pub struct DeckState {
    loaded: Mutex<Option<LoadedTrack>>,
    sample_rate: AtomicU32,
}

impl DeckState {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            loaded: Mutex::new(None),
            sample_rate: AtomicU32::new(sample_rate),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_sample_rate(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
    }

    /// Install `next` (or nothing) in one step.
    ///
    /// The previous track and cache are dropped after the lock is released.
    pub(crate) fn replace(&self, next: Option<LoadedTrack>) {
        let previous = std::mem::replace(&mut *self.loaded.lock(), next);
        drop(previous);
    }

    /// Install `next` only while `expected` is still the loaded track.
    ///
    /// Returns `false`, leaving the deck untouched, when another load or an
    /// unload got there first.
    pub(crate) fn replace_if_current(
        &self,
        expected: &Arc<dyn MarkerStore>,
        next: LoadedTrack,
    ) -> bool {
        let mut guard = self.loaded.lock();
        let current = matches!(guard.as_ref(), Some(l) if Arc::ptr_eq(&l.track, expected));
        if !current {
            return false;
        }
        let previous = guard.replace(next);
        drop(guard);
        drop(previous);
        true
    }

    /// Run `f` against the loaded track, or fail with `NoTrack`
    pub(crate) fn with_loaded<R>(
        &self,
        f: impl FnOnce(&mut LoadedTrack) -> McResult<R>,
    ) -> McResult<R> {
        let mut guard = self.loaded.lock();
        match guard.as_mut() {
            Some(loaded) => f(loaded),
            None => Err(McError::NoTrack),
        }
    }

    /// Handle to the loaded track
    pub fn track(&self) -> Option<Arc<dyn MarkerStore>> {
        self.loaded.lock().as_ref().map(|l| Arc::clone(&l.track))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }
}

impl Default for DeckState {
    fn default() -> Self {
        Self::new(48000)
    }
}
