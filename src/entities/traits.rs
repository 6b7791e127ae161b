//! Abstract traits for dependency inversion.
//!
//! The engine drives a scroll surface and reads a clock without knowing
//! what either is. Production code plugs in the real UI viewport and
//! `SystemClock`; tests plug in `ManualClock` and a recording surface.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// The scrollable viewport the engine animates.
///
/// These three calls are the only things the engine ever asks of the UI:
/// set the scroll offset, and read the two heights needed to compute a
/// keyframe's relative position.
pub trait ScrollSurface {
    /// Apply an absolute scroll offset in pixels.
    fn set_scroll_offset(&mut self, y: f32);

    /// Visible height of the viewport in pixels.
    fn viewport_height(&self) -> f32;

    /// Total scrollable content height in pixels.
    fn scrollable_height(&self) -> f32;
}

/// Monotonic time source. Timestamps are durations since an arbitrary
/// per-clock epoch; only differences are meaningful.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock implementation backed by `Instant`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually advanced clock for deterministic timing tests.
///
/// Clones share the same underlying time, so a test can keep one handle
/// and hand another to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Recording scroll surface used by engine and player tests.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct TestSurface {
    pub offsets: Vec<f32>,
    pub viewport: f32,
    pub scrollable: f32,
}

#[cfg(test)]
impl TestSurface {
    pub fn new() -> Self {
        Self { offsets: Vec::new(), viewport: 600.0, scrollable: 3000.0 }
    }

    pub fn last_offset(&self) -> Option<f32> {
        self.offsets.last().copied()
    }
}

#[cfg(test)]
impl ScrollSurface for TestSurface {
    fn set_scroll_offset(&mut self, y: f32) {
        self.offsets.push(y);
    }

    fn viewport_height(&self) -> f32 {
        self.viewport
    }

    fn scrollable_height(&self) -> f32 {
        self.scrollable
    }
}
