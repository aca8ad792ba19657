use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick (or construction), in seconds.
    pub dt: f32,

    /// Same interval, unrounded.
    pub delta: Duration,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Measures wall-clock time between ticks.
///
/// Starts running at construction, so the first tick reports the time since then.
/// Deltas are never negative. An optional upper clamp keeps animation stable after
/// long stalls (debugger, minimized window).
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_max: Option<Duration>,
}

impl FrameClock {
    /// Unclamped clock.
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), None)
    }

    /// Clock whose deltas never exceed `dt_max`.
    pub fn with_max_delta(dt_max: Duration) -> Self {
        Self::starting_at(Instant::now(), Some(dt_max))
    }

    pub(crate) fn starting_at(start: Instant, dt_max: Option<Duration>) -> Self {
        Self { last: start, frame_index: 0, dt_max }
    }

    /// Resets the baseline so the next tick ignores time spent since the last one.
    ///
    /// Used when rendering resumes after a suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&mut self, now: Instant) -> FrameTime {
        let mut delta = now.saturating_duration_since(self.last);
        if let Some(max) = self.dt_max {
            delta = delta.min(max);
        }

        self.last = now;

        let ft = FrameTime {
            dt: delta.as_secs_f32(),
            delta,
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
