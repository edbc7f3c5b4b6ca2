//! Frame clock.
//!
//! Time is counted in whole frames since some caller-chosen epoch. The
//! curve cache only compares times, so any monotonic frame counter works.

use std::time::Duration;

/// Frames per second assumed when converting from wall-clock time.
pub const FRAMES_PER_SECOND: u32 = 60;

/// A frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(pub i32);

impl Time {
    pub const ZERO: Time = Time(0);

    /// The frame that `d` after the epoch falls in. Saturates at `i32::MAX`.
    pub fn from_duration(d: Duration) -> Self {
        let frames = d.as_nanos() * FRAMES_PER_SECOND as u128 / 1_000_000_000;
        Time(frames.min(i32::MAX as u128) as i32)
    }

    /// Start of this frame relative to the epoch. Negative times map to zero.
    pub fn to_duration(self) -> Duration {
        let frames = self.0.max(0) as u64;
        Duration::from_nanos(frames * 1_000_000_000 / FRAMES_PER_SECOND as u64)
    }

    pub fn next(self) -> Self {
        Time(self.0.saturating_add(1))
    }
}
