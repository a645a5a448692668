//! Track markers and the store that owns them
//!
//! A track keeps every marker kind in one collection. Only memory markers
//! are navigated; the other kinds are carried so that filtering is explicit.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{FramePos, McResult};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Marker ID
pub type MarkerId = u64;

static NEXT_MARKER_ID: AtomicU64 = AtomicU64::new(1);

fn new_marker_id() -> MarkerId {
    NEXT_MARKER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Marker kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// User-placed memory position
    #[default]
    Memory,
    /// Numbered hot cue
    HotCue,
    /// Main cue point
    MainCue,
    /// Saved loop
    Loop,
    /// Intro range
    Intro,
    /// Outro range
    Outro,
    /// Position the track is cued to on load
    LoadPoint,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKER
// ═══════════════════════════════════════════════════════════════════════════════

/// A marker on a track
///
/// Markers are immutable once created; moving one means removing it and
/// creating a replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    /// Unique ID
    pub id: MarkerId,
    /// Marker kind
    pub kind: MarkerKind,
    /// Slot index, `None` when the track does not index this marker
    pub index: Option<u32>,
    /// Start position
    pub start: FramePos,
    /// End position (equal to start for point markers)
    pub end: FramePos,
}

impl Marker {
    pub fn new(kind: MarkerKind, index: Option<u32>, start: FramePos, end: FramePos) -> Self {
        Self {
            id: new_marker_id(),
            kind,
            index,
            start,
            end,
        }
    }

    /// Create memory marker at a single position
    pub fn memory(index: Option<u32>, position: FramePos) -> Self {
        Self::new(MarkerKind::Memory, index, position, position)
    }

    #[inline]
    pub fn is_memory(&self) -> bool {
        self.kind == MarkerKind::Memory
    }

    /// Start position in engine samples
    #[inline]
    pub fn start_engine_pos(&self) -> f64 {
        self.start.to_engine_sample_pos()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKER STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Authoritative owner of a track's markers.
///
/// Implementations must be safe to call from the control context while a
/// loader thread holds another handle to the same track.
pub trait MarkerStore: Send + Sync {
    /// All markers of every kind, in the store's own order.
    ///
    /// Must hand out the store's own `Arc`s, not fresh copies. Caches keep
    /// only weak handles, so a marker counts as live exactly as long as the
    /// store still holds it.
    fn markers(&self) -> Vec<Arc<Marker>>;

    /// Create and add a marker. `index_hint` is a proposal the store may ignore.
    fn create_marker(
        &self,
        kind: MarkerKind,
        index_hint: Option<u32>,
        start: FramePos,
        end: FramePos,
    ) -> McResult<Arc<Marker>>;

    /// Remove one marker by identity
    fn remove_marker(&self, marker: &Marker) -> McResult<()>;

    /// Remove every marker of a kind
    fn remove_markers_of_kind(&self, kind: MarkerKind) -> McResult<()>;

    /// Memory markers only, in store order
    fn memory_markers(&self) -> Vec<Arc<Marker>> {
        self.markers().into_iter().filter(|m| m.is_memory()).collect()
    }
}
