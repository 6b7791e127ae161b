//! Keyframe navigator - positional stepping through the ordered set.
//!
//! Holds only the current index (-1 = nothing selected, the state right
//! after a media item loads). Stepping is circular in both directions:
//! "next" past the end wraps to the first keyframe, "prev" before the
//! start wraps to the last. Circular wrap lets the same stepper serve as
//! the playback-advance primitive and as the manual prev/next control.
//!
//! The navigator never touches the store; callers hand it the current
//! `KeyframeSet` from the cache.

use log::trace;

use crate::entities::keyframe::KeyframeSet;

/// Index sentinel for "no keyframe selected".
pub const NO_SELECTION: i32 = -1;

/// Target of a completed navigation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavTarget {
    pub index: usize,
    pub y_position: f32,
}

/// Stepper over one media item's keyframe set.
#[derive(Debug, Clone)]
pub struct KeyframeNavigator {
    current_index: i32,
}

impl Default for KeyframeNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeNavigator {
    pub fn new() -> Self {
        Self { current_index: NO_SELECTION }
    }

    /// Current index, `NO_SELECTION` (-1) when nothing is selected.
    pub fn current_index(&self) -> i32 {
        self.current_index
    }

    /// Back to the unselected state. Called on media item change.
    pub fn reset(&mut self) {
        self.current_index = NO_SELECTION;
    }

    /// Clamp a possibly-stale index back into the set's range.
    ///
    /// The set can shrink underneath us (clear while an index is held);
    /// indexing out of bounds is a programming hazard we guard against
    /// rather than propagate.
    pub fn clamp_to(&mut self, set: &KeyframeSet) {
        match set.last_index() {
            None => self.current_index = NO_SELECTION,
            Some(last) => {
                if self.current_index > last as i32 {
                    self.current_index = last as i32;
                }
            }
        }
    }

    /// Advance to the next keyframe, wrapping past the end to index 0.
    /// From the unselected state, moves to index 0. Empty set: no-op.
    pub fn step_next(&mut self, set: &KeyframeSet) -> Option<NavTarget> {
        let last = set.last_index()?;
        self.clamp_to(set);
        let next = if self.current_index < 0 || self.current_index as usize >= last {
            0
        } else {
            self.current_index as usize + 1
        };
        self.move_to(set, next)
    }

    /// Step back to the previous keyframe, wrapping before the start to
    /// the last index. From the unselected state, moves to the last
    /// keyframe. Empty set: no-op.
    pub fn step_prev(&mut self, set: &KeyframeSet) -> Option<NavTarget> {
        let last = set.last_index()?;
        self.clamp_to(set);
        let prev = if self.current_index <= 0 {
            last
        } else {
            self.current_index as usize - 1
        };
        self.move_to(set, prev)
    }

    /// Jump straight to an index (click-to-jump UI). Out-of-range indices
    /// are clamped to the last keyframe.
    pub fn jump_to(&mut self, set: &KeyframeSet, index: usize) -> Option<NavTarget> {
        let last = set.last_index()?;
        self.move_to(set, index.min(last))
    }

    fn move_to(&mut self, set: &KeyframeSet, index: usize) -> Option<NavTarget> {
        let kf = set.get(index)?;
        trace!("Navigator: index {} -> {} (y={})", self.current_index, index, kf.y_position);
        self.current_index = index as i32;
        Some(NavTarget { index, y_position: kf.y_position })
    }
}
