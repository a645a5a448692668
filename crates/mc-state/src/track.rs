//! In-memory track marker store
//!
//! Owns every marker of a loaded track (all kinds) and is the source of
//! truth the marker cache is rebuilt from.

use mc_core::{FramePos, Marker, MarkerId, MarkerKind, MarkerStore, McError, McResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How the track treats index hints on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Store the proposed index
    #[default]
    HonorHint,
    /// Manage indices elsewhere; new markers carry no index
    Unindexed,
}

/// Track marker collection
#[derive(Debug, Default)]
pub struct Track {
    /// Display title
    title: String,
    /// All markers, in insertion order
    markers: RwLock<Vec<Arc<Marker>>>,
    index_policy: IndexPolicy,
    /// Refuse all mutations while set
    locked: AtomicBool,
}

impl Track {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_policy(title: &str, index_policy: IndexPolicy) -> Self {
        Self {
            title: title.to_string(),
            index_policy,
            ..Default::default()
        }
    }

    /// Build a track from existing markers (e.g. read from a library)
    pub fn with_markers(title: &str, markers: impl IntoIterator<Item = Marker>) -> Self {
        let track = Self::new(title);
        *track.markers.write() = markers.into_iter().map(Arc::new).collect();
        track
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Relaxed);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Add an already-built marker, bypassing index policy.
    ///
    /// Used for edits that originate outside the navigator (library import,
    /// waveform drag-and-drop).
    pub fn add_marker(&self, marker: Marker) -> McResult<Arc<Marker>> {
        if self.is_locked() {
            return Err(McError::TrackLocked);
        }
        let marker = Arc::new(marker);
        self.markers.write().push(Arc::clone(&marker));
        Ok(marker)
    }

    /// Get marker by ID
    pub fn get(&self, id: MarkerId) -> Option<Arc<Marker>> {
        self.markers.read().iter().find(|m| m.id == id).cloned()
    }

    /// Number of markers of all kinds
    pub fn len(&self) -> usize {
        self.markers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.read().is_empty()
    }

    /// Markers of one kind, in insertion order
    pub fn by_kind(&self, kind: MarkerKind) -> Vec<Arc<Marker>> {
        self.markers
            .read()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }
}

impl MarkerStore for Track {
    fn markers(&self) -> Vec<Arc<Marker>> {
        self.markers.read().clone()
    }

    fn create_marker(
        &self,
        kind: MarkerKind,
        index_hint: Option<u32>,
        start: FramePos,
        end: FramePos,
    ) -> McResult<Arc<Marker>> {
        if self.is_locked() {
            return Err(McError::TrackLocked);
        }
        if !start.is_valid() {
            return Err(McError::InvalidPosition(start.value()));
        }
        let end = if end.is_valid() { end } else { start };
        let index = match self.index_policy {
            IndexPolicy::HonorHint => index_hint,
            IndexPolicy::Unindexed => None,
        };

        let marker = Arc::new(Marker::new(kind, index, start, end));
        self.markers.write().push(Arc::clone(&marker));
        log::debug!(
            "Track '{}': created {:?} marker {} at frame {}",
            self.title,
            kind,
            marker.id,
            start.value()
        );
        Ok(marker)
    }

    fn remove_marker(&self, marker: &Marker) -> McResult<()> {
        if self.is_locked() {
            return Err(McError::TrackLocked);
        }
        let mut markers = self.markers.write();
        match markers.iter().position(|m| m.id == marker.id) {
            Some(pos) => {
                markers.remove(pos);
                Ok(())
            }
            None => Err(McError::MarkerNotFound(marker.id)),
        }
    }

    fn remove_markers_of_kind(&self, kind: MarkerKind) -> McResult<()> {
        if self.is_locked() {
            return Err(McError::TrackLocked);
        }
        self.markers.write().retain(|m| m.kind != kind);
        Ok(())
    }
}
