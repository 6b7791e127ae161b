//! Keyframe data model - named scroll positions within a media item
//!
//! A keyframe is an absolute scroll offset inside a long image, ordered
//! among its siblings by `order_index`. Position fields are immutable
//! after creation; only the advisory `loop_count_hint` may change.
//!
//! **Used by**: store (persistence), cache, navigator, player

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded scroll position within a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Stable identity, assigned on creation
    pub id: Uuid,
    /// Media item this keyframe belongs to
    pub media_item_id: Uuid,
    /// Position among siblings; unique per media item
    pub order_index: u32,
    /// Absolute scroll offset in pixels - primary navigation key
    pub y_position: f32,
    /// Fractional position (0..1) within the scrollable range.
    /// Stored for UI convenience, not authoritative.
    pub relative_position: f32,
    /// Advisory loop count shown in the UI (e.g. 2, 3, 4).
    /// Never consulted by playback logic.
    pub loop_count_hint: Option<u32>,
}

impl Keyframe {
    pub fn new(media_item_id: Uuid, order_index: u32, y_position: f32, relative_position: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_item_id,
            order_index,
            y_position,
            relative_position: relative_position.clamp(0.0, 1.0),
            loop_count_hint: None,
        }
    }

    /// 1-based number shown in the UI
    pub fn display_number(&self) -> u32 {
        self.order_index + 1
    }
}

/// Ordered keyframe sequence for one media item.
///
/// Ordering is by explicit `order_index`, not by `y_position` - keyframes
/// are usually added in scroll order so the two agree, but nothing here
/// assumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSet {
    frames: Vec<Keyframe>,
}

impl KeyframeSet {
    /// Build a set from keyframes in any order; sorts by `order_index`.
    pub fn from_unordered(mut frames: Vec<Keyframe>) -> Self {
        frames.sort_by_key(|k| k.order_index);
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Keyframe> {
        self.frames.get(index)
    }

    /// Index of the last keyframe, or None for an empty set
    pub fn last_index(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.frames.iter()
    }

    /// Find the positional index of a keyframe by id
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.frames.iter().position(|k| k.id == id)
    }
}

/// Persisted dwell duration for one keyframe.
///
/// Carries the media item id redundantly so timing records can be bulk
/// cleared per media item even after the keyframes themselves are gone
/// (clearing keyframes does not clear timing data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub keyframe_id: Uuid,
    pub media_item_id: Uuid,
    /// Dwell time at this keyframe before departing to the next one
    pub duration_secs: f64,
}
