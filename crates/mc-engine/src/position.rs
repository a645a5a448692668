//! Transport-side collaborators: play position source and seek primitive

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use mc_core::{FramePos, to_absolute_position};
use std::sync::atomic::{AtomicU64, Ordering};

// ═══════════════════════════════════════════════════════════════════════════
// POSITION SOURCE
// ═══════════════════════════════════════════════════════════════════════════

/// Continuously updated playback values owned by the engine
pub trait PositionSource: Send + Sync {
    /// Normalized play position in `[0, 1]`
    fn play_position(&self) -> f64;
    /// Track duration in seconds (zero when nothing is loaded)
    fn duration_secs(&self) -> f64;
}

/// Atomic play position and duration, written by the engine callback
pub struct PlaybackPosition {
    /// Normalized position (f64 bits)
    play_position: AtomicU64,
    /// Duration in seconds (f64 bits)
    duration_secs: AtomicU64,
}

impl PlaybackPosition {
    pub fn new() -> Self {
        Self {
            play_position: AtomicU64::new(0.0_f64.to_bits()),
            duration_secs: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    #[inline]
    pub fn set_play_position(&self, position: f64) {
        self.play_position
            .store(position.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn set_duration_secs(&self, seconds: f64) {
        self.duration_secs
            .store(seconds.max(0.0).to_bits(), Ordering::Relaxed);
    }

    /// Move the play position to an absolute frame
    pub fn set_frame(&self, frame: FramePos, sample_rate: u32) {
        let total = self.duration_secs() * sample_rate as f64;
        if total > 0.0 && frame.is_valid() {
            self.set_play_position(frame.value() / total);
        }
    }
}

impl Default for PlaybackPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for PlaybackPosition {
    #[inline]
    fn play_position(&self) -> f64 {
        f64::from_bits(self.play_position.load(Ordering::Relaxed))
    }

    #[inline]
    fn duration_secs(&self) -> f64 {
        f64::from_bits(self.duration_secs.load(Ordering::Relaxed))
    }
}

/// Values read once at the start of a navigator operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub play_position: f64,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

impl PlaybackSnapshot {
    pub fn read(source: &dyn PositionSource, sample_rate: u32) -> Self {
        Self {
            play_position: source.play_position(),
            duration_secs: source.duration_secs(),
            sample_rate,
        }
    }

    /// Current absolute position, `None` while duration or rate is unknown
    pub fn absolute_position(&self) -> Option<FramePos> {
        to_absolute_position(self.play_position, self.duration_secs, self.sample_rate)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SEEK
// ═══════════════════════════════════════════════════════════════════════════

/// Absolute-seek primitive of the audio engine. Fire-and-forget.
pub trait SeekSink: Send + Sync {
    fn seek_abs(&self, target: FramePos);
}

/// Bounded seek mailbox between the control context and the engine.
///
/// Sending never blocks; when the engine falls behind, new requests are
/// dropped.
pub struct SeekQueue {
    tx: Sender<FramePos>,
    rx: Receiver<FramePos>,
}

impl SeekQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Take all pending seek targets, oldest first
    pub fn drain(&self) -> Vec<FramePos> {
        self.rx.try_iter().collect()
    }

    /// Most recent pending target, discarding older ones
    pub fn latest(&self) -> Option<FramePos> {
        self.rx.try_iter().last()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl SeekSink for SeekQueue {
    fn seek_abs(&self, target: FramePos) {
        if !target.is_valid() {
            return;
        }
        match self.tx.try_send(target) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Seek queue full, dropping seek to frame {}", target.value());
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Seek queue disconnected");
            }
        }
    }
}
