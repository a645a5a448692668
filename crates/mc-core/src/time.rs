//! Position units and conversions
//!
//! Three spaces are in play:
//! - normalized play position in `[0, 1]` (what the transport reports)
//! - frames (one per sample instant, independent of channel count)
//! - engine samples (frames × channels), the comparable scalar
//!
//! Every marker comparison happens in engine samples.

use serde::{Deserialize, Serialize};

/// Interleaved output channels per frame
pub const CHANNEL_COUNT: u32 = 2;

/// Two positions closer than this (engine samples) are the same position.
///
/// Half a sample absorbs the rounding of the normalized → frame round trip.
pub const POSITION_TOLERANCE: f64 = 0.5;

/// Absolute frame position on a track
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct FramePos(pub f64);

impl FramePos {
    pub const ZERO: Self = Self(0.0);
    pub const INVALID: Self = Self(f64::NAN);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0.is_finite()
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn from_engine_sample_pos(engine_samples: f64) -> Self {
        Self(engine_samples / CHANNEL_COUNT as f64)
    }

    #[inline]
    pub fn to_engine_sample_pos(self) -> f64 {
        self.0 * CHANNEL_COUNT as f64
    }

    #[inline]
    pub fn from_seconds(seconds: f64, sample_rate: u32) -> Self {
        Self(seconds * sample_rate as f64)
    }

    #[inline]
    pub fn to_seconds(self, sample_rate: u32) -> f64 {
        self.0 / sample_rate as f64
    }
}

impl Default for FramePos {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Absolute frame position for a normalized play position.
///
/// Returns `None` when nothing usable is loaded: duration not positive,
/// sample rate zero, or any input non-finite.
#[inline]
pub fn to_absolute_position(play_position: f64, duration_secs: f64, sample_rate: u32) -> Option<FramePos> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || sample_rate == 0 || !play_position.is_finite() {
        return None;
    }
    Some(FramePos(play_position * duration_secs * sample_rate as f64))
}

/// Length of a time window expressed in engine samples
#[inline]
pub fn seconds_to_engine_samples(seconds: f64, sample_rate: u32) -> f64 {
    FramePos::from_seconds(seconds, sample_rate).to_engine_sample_pos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_absolute_position() {
        let pos = to_absolute_position(0.5, 10.0, 48000).unwrap();
        assert_relative_eq!(pos.value(), 240_000.0);
        assert_relative_eq!(pos.to_engine_sample_pos(), 480_000.0);
    }

    #[test]
    fn test_absolute_position_unavailable() {
        assert!(to_absolute_position(0.5, 0.0, 48000).is_none());
        assert!(to_absolute_position(0.5, -3.0, 48000).is_none());
        assert!(to_absolute_position(0.5, f64::NAN, 48000).is_none());
        assert!(to_absolute_position(0.5, 10.0, 0).is_none());
        assert!(to_absolute_position(f64::NAN, 10.0, 44100).is_none());
    }

    #[test]
    fn test_engine_sample_round_trip() {
        let pos = FramePos::from_engine_sample_pos(1000.0);
        assert_relative_eq!(pos.value(), 500.0);
        assert_relative_eq!(pos.to_engine_sample_pos(), 1000.0);
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(!FramePos::INVALID.is_valid());
        assert!(FramePos::ZERO.is_valid());
        assert!(!FramePos(f64::INFINITY).is_valid());
    }

    #[test]
    fn test_skip_window_units() {
        // 1.5 s at 44.1 kHz stereo
        assert_relative_eq!(seconds_to_engine_samples(1.5, 44100), 132_300.0);
    }
}
