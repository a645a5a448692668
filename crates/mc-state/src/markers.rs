//! Memory marker cache
//!
//! Ordered, derived view of one track's memory markers:
//! - rebuilt wholesale from the track on load
//! - patched locally after the track accepted a create/remove
//! - sorted ascending by start position whenever it is observed
//!
//! Entries hold weak handles. A marker dropped by its track behind our back
//! reads as dead and is skipped by every scan until the next rebuild.

use mc_core::{Marker, MarkerId, MarkerStore};
use std::collections::HashSet;
use std::sync::{Arc, Weak};

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct CacheEntry {
    handle: Weak<Marker>,
    id: MarkerId,
    index: Option<u32>,
    /// Start position in engine samples
    position: f64,
}

impl CacheEntry {
    fn new(marker: &Arc<Marker>) -> Self {
        Self {
            handle: Arc::downgrade(marker),
            id: marker.id,
            index: marker.index,
            position: marker.start_engine_pos(),
        }
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.handle.strong_count() > 0
    }

    #[inline]
    fn upgrade(&self) -> Option<Arc<Marker>> {
        self.handle.upgrade()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKER CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Sorted view of a track's memory markers
#[derive(Debug, Clone, Default)]
pub struct MarkerCache {
    entries: Vec<CacheEntry>,
}

impl MarkerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh cache for `track`
    pub fn from_track(track: Option<&dyn MarkerStore>) -> Self {
        let mut cache = Self::new();
        cache.rebuild(track);
        cache
    }

    /// Clear, then load every memory marker of `track`.
    ///
    /// Markers without a valid start position cannot be ordered or navigated
    /// to and are left out.
    pub fn rebuild(&mut self, track: Option<&dyn MarkerStore>) {
        self.entries.clear();
        let Some(track) = track else {
            return;
        };

        for marker in track.markers() {
            if !marker.is_memory() {
                continue;
            }
            if !marker.start.is_valid() {
                log::debug!("Skipping memory marker {} with invalid start", marker.id);
                continue;
            }
            self.entries.push(CacheEntry::new(&marker));
        }
        self.sort();
        log::debug!("Marker cache rebuilt: {} memory markers", self.entries.len());
    }

    /// Stable sort; ties keep enumeration order
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.position.total_cmp(&b.position));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Live markers in ascending start order
    pub fn markers(&self) -> Vec<Arc<Marker>> {
        self.entries.iter().filter_map(CacheEntry::upgrade).collect()
    }

    /// Cached start positions (engine samples), ascending
    pub fn positions(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.position).collect()
    }

    /// Smallest index not used by any indexed marker.
    ///
    /// With no indexed marker at all, proposes appending at the end.
    pub fn next_free_index(&self) -> u32 {
        let used: HashSet<u32> = self
            .entries
            .iter()
            .filter(|e| e.is_live())
            .filter_map(|e| e.index)
            .collect();

        if used.is_empty() {
            return self.entries.len() as u32;
        }

        let mut next = 0;
        while used.contains(&next) {
            next += 1;
        }
        next
    }

    /// First marker whose start is strictly within `epsilon` of `position`
    pub fn find_at(&self, position: f64, epsilon: f64) -> Option<Arc<Marker>> {
        self.entries
            .iter()
            .filter(|e| (e.position - position).abs() < epsilon)
            .find_map(CacheEntry::upgrade)
    }

    /// Nearest marker strictly after `position` by more than `epsilon`
    pub fn find_after(&self, position: f64, epsilon: f64) -> Option<Arc<Marker>> {
        self.entries
            .iter()
            .filter(|e| e.position - position > epsilon)
            .find_map(CacheEntry::upgrade)
    }

    /// Nearest marker strictly before `position` by more than `epsilon`,
    /// passing over candidates closer than `skip_window`.
    ///
    /// A zero `skip_window` yields the plain previous marker.
    pub fn find_before(&self, position: f64, epsilon: f64, skip_window: f64) -> Option<Arc<Marker>> {
        self.entries
            .iter()
            .rev()
            .filter(|e| position - e.position > epsilon)
            .filter(|e| position - e.position >= skip_window)
            .find_map(CacheEntry::upgrade)
    }

    /// Add a marker the track just accepted
    pub fn insert_sorted(&mut self, marker: &Arc<Marker>) {
        if !marker.is_memory() || !marker.start.is_valid() {
            return;
        }
        self.entries.push(CacheEntry::new(marker));
        self.sort();
    }

    /// Drop the first entry referring to `marker`. Returns whether one was found.
    pub fn remove_matching(&mut self, marker: &Marker) -> bool {
        match self.entries.iter().position(|e| e.id == marker.id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
