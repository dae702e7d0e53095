//! # Game Time
//!
//! Frame timing handed to systems by the host loop.

use std::time::Duration;

/// Time elapsed during the current frame and since the loop started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameTime {
    /// Duration of the current frame.
    pub elapsed: Duration,
    /// Accumulated duration of every frame so far, current one included.
    pub total: Duration,
}

impl GameTime {
    /// Creates a time sample.
    #[inline]
    #[must_use]
    pub const fn new(elapsed: Duration, total: Duration) -> Self {
        Self { elapsed, total }
    }

    /// Time sample of a first frame lasting `elapsed`.
    #[inline]
    #[must_use]
    pub const fn from_elapsed(elapsed: Duration) -> Self {
        Self::new(elapsed, elapsed)
    }

    /// Starts the next frame, lasting `delta`.
    pub fn advance(&mut self, delta: Duration) -> Self {
        self.elapsed = delta;
        self.total += delta;
        *self
    }

    /// Frame duration in seconds.
    #[inline]
    #[must_use]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
