//! Keyframe persistence boundary.
//!
//! `KeyframeStore` is the narrow repository contract the engine talks to:
//! keyframe CRUD plus per-keyframe timing records. Any durable keyed
//! storage satisfies it; `MemoryKeyframeStore` here is the always-available
//! implementation, `JsonKeyframeStore` (json_store module) the file-backed one.
//!
//! Failure semantics: operations fail only on underlying persistence
//! unavailability (`StoreError::Unavailable`). "No keyframes" is an empty
//! list, never an error. Writes are single-record and atomic at the store
//! level - callers only update in-memory state after a successful write.

use std::collections::HashMap;

use log::{debug, info};
use thiserror::Error;
use uuid::Uuid;

use super::keyframe::Keyframe;

/// Persistence failure. Recoverable: the engine surfaces it as a failed
/// operation and leaves in-memory state untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("keyframe store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an add attempt. Proximity rejection is an expected outcome,
/// not an error - it must not be conflated with store unavailability.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Keyframe),
    /// An existing keyframe lies within the minimum-distance tolerance.
    /// Carries the offending keyframe's position for the status message.
    TooClose { existing_y: f32 },
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }
}

/// Repository contract for keyframes and their timing records.
///
/// Ordering: `list_keyframes` returns siblings sorted by `order_index`.
/// Timing records are keyed by keyframe id with overwrite semantics and
/// survive `clear_keyframes` (separate lifecycle, separate clear).
pub trait KeyframeStore {
    /// All keyframes for a media item, ordered by `order_index`.
    /// Empty vec when none exist.
    fn list_keyframes(&self, media_item_id: Uuid) -> Result<Vec<Keyframe>, StoreError>;

    /// Add a keyframe at `y_position`, rejecting when any existing sibling
    /// is within the store's minimum-distance tolerance.
    fn add_keyframe(
        &mut self,
        media_item_id: Uuid,
        y_position: f32,
        relative_position: f32,
    ) -> Result<AddOutcome, StoreError>;

    /// Delete all keyframes (and their loop hints) for a media item.
    /// Leaves timing records alone. Idempotent.
    fn clear_keyframes(&mut self, media_item_id: Uuid) -> Result<(), StoreError>;

    /// Set or clear (`None`) the advisory loop count on one keyframe.
    /// Returns false when the keyframe does not exist.
    fn update_loop_count_hint(
        &mut self,
        keyframe_id: Uuid,
        loop_count: Option<u32>,
    ) -> Result<bool, StoreError>;

    /// Recorded dwell duration for a keyframe, if any.
    fn get_timing(&self, keyframe_id: Uuid) -> Result<Option<f64>, StoreError>;

    /// Record a dwell duration, overwriting any previous value.
    fn set_timing(&mut self, keyframe_id: Uuid, duration_secs: f64) -> Result<(), StoreError>;

    /// True iff at least one keyframe of this media item has a timing record.
    fn has_timing(&self, media_item_id: Uuid) -> Result<bool, StoreError>;

    /// Drop all timing records for a media item. Idempotent.
    fn clear_timing(&mut self, media_item_id: Uuid) -> Result<(), StoreError>;
}

/// HashMap-backed store. Never fails; used as the default store and as the
/// test double throughout the engine tests.
#[derive(Debug, Default)]
pub struct MemoryKeyframeStore {
    /// media_item_id -> keyframes (kept sorted by order_index)
    keyframes: HashMap<Uuid, Vec<Keyframe>>,
    /// keyframe_id -> dwell seconds
    timing: HashMap<Uuid, f64>,
    /// keyframe_id -> media_item_id, retained after clear_keyframes so
    /// timing records can still be bulk cleared per media item
    keyframe_media: HashMap<Uuid, Uuid>,
    min_distance_px: f32,
}

impl MemoryKeyframeStore {
    pub fn new(min_distance_px: f32) -> Self {
        Self {
            min_distance_px,
            ..Default::default()
        }
    }

    pub fn min_distance_px(&self) -> f32 {
        self.min_distance_px
    }
}

impl KeyframeStore for MemoryKeyframeStore {
    fn list_keyframes(&self, media_item_id: Uuid) -> Result<Vec<Keyframe>, StoreError> {
        let mut frames = self.keyframes.get(&media_item_id).cloned().unwrap_or_default();
        frames.sort_by_key(|k| k.order_index);
        Ok(frames)
    }

    fn add_keyframe(
        &mut self,
        media_item_id: Uuid,
        y_position: f32,
        relative_position: f32,
    ) -> Result<AddOutcome, StoreError> {
        let siblings = self.keyframes.entry(media_item_id).or_default();

        if let Some(existing) = siblings
            .iter()
            .find(|k| (k.y_position - y_position).abs() < self.min_distance_px)
        {
            debug!(
                "Keyframe at y={} rejected: existing at y={} within {}px",
                y_position, existing.y_position, self.min_distance_px
            );
            return Ok(AddOutcome::TooClose {
                existing_y: existing.y_position,
            });
        }

        let order_index = siblings.iter().map(|k| k.order_index + 1).max().unwrap_or(0);
        let kf = Keyframe::new(media_item_id, order_index, y_position, relative_position);
        self.keyframe_media.insert(kf.id, media_item_id);
        siblings.push(kf.clone());
        info!("Added keyframe #{} at y={} for {}", kf.display_number(), y_position, media_item_id);
        Ok(AddOutcome::Added(kf))
    }

    fn clear_keyframes(&mut self, media_item_id: Uuid) -> Result<(), StoreError> {
        let removed = self.keyframes.remove(&media_item_id).map(|v| v.len()).unwrap_or(0);
        if removed > 0 {
            info!("Cleared {} keyframes for {}", removed, media_item_id);
        }
        Ok(())
    }

    fn update_loop_count_hint(
        &mut self,
        keyframe_id: Uuid,
        loop_count: Option<u32>,
    ) -> Result<bool, StoreError> {
        for siblings in self.keyframes.values_mut() {
            if let Some(kf) = siblings.iter_mut().find(|k| k.id == keyframe_id) {
                kf.loop_count_hint = loop_count;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_timing(&self, keyframe_id: Uuid) -> Result<Option<f64>, StoreError> {
        Ok(self.timing.get(&keyframe_id).copied())
    }

    fn set_timing(&mut self, keyframe_id: Uuid, duration_secs: f64) -> Result<(), StoreError> {
        self.timing.insert(keyframe_id, duration_secs);
        Ok(())
    }

    fn has_timing(&self, media_item_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .timing
            .keys()
            .any(|kf| self.keyframe_media.get(kf) == Some(&media_item_id)))
    }

    fn clear_timing(&mut self, media_item_id: Uuid) -> Result<(), StoreError> {
        let media = &self.keyframe_media;
        self.timing.retain(|kf, _| media.get(kf) != Some(&media_item_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryKeyframeStore {
        MemoryKeyframeStore::new(20.0)
    }

    fn add(store: &mut MemoryKeyframeStore, media: Uuid, y: f32) -> AddOutcome {
        store.add_keyframe(media, y, 0.0).unwrap()
    }

    #[test]
    fn add_assigns_sequential_order_indices() {
        let mut s = store();
        let media = Uuid::new_v4();
        for y in [100.0, 400.0, 900.0] {
            assert!(add(&mut s, media, y).is_added());
        }
        let frames = s.list_keyframes(media).unwrap();
        let order: Vec<u32> = frames.iter().map(|k| k.order_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_within_tolerance_without_mutating() {
        // Scenario B: [100, 400, 900] at 20px tolerance - 500 fits, 505 doesn't
        let mut s = store();
        let media = Uuid::new_v4();
        for y in [100.0, 400.0, 900.0] {
            add(&mut s, media, y);
        }
        assert!(add(&mut s, media, 500.0).is_added());
        match add(&mut s, media, 505.0) {
            AddOutcome::TooClose { existing_y } => assert_eq!(existing_y, 500.0),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(s.list_keyframes(media).unwrap().len(), 4);
    }

    #[test]
    fn no_two_accepted_keyframes_within_tolerance() {
        // P1: sweep a dense range, verify pairwise distances of survivors
        let mut s = store();
        let media = Uuid::new_v4();
        for i in 0..200 {
            add(&mut s, media, i as f32 * 7.0);
        }
        let frames = s.list_keyframes(media).unwrap();
        for a in &frames {
            for b in &frames {
                if a.id != b.id {
                    assert!((a.y_position - b.y_position).abs() >= 20.0);
                }
            }
        }
    }

    #[test]
    fn clear_is_idempotent() {
        // P5
        let mut s = store();
        let media = Uuid::new_v4();
        add(&mut s, media, 100.0);
        s.clear_keyframes(media).unwrap();
        assert!(s.list_keyframes(media).unwrap().is_empty());
        s.clear_keyframes(media).unwrap();
        assert!(s.list_keyframes(media).unwrap().is_empty());
    }

    #[test]
    fn loop_hint_does_not_touch_position_or_order() {
        // P6
        let mut s = store();
        let media = Uuid::new_v4();
        add(&mut s, media, 100.0);
        add(&mut s, media, 400.0);
        let before = s.list_keyframes(media).unwrap();
        let target = before[0].id;

        assert!(s.update_loop_count_hint(target, Some(3)).unwrap());
        let after = s.list_keyframes(media).unwrap();
        assert_eq!(after[0].loop_count_hint, Some(3));
        assert_eq!(after[0].order_index, before[0].order_index);
        assert_eq!(after[0].y_position, before[0].y_position);
        assert_eq!(after[1], before[1]);

        assert!(s.update_loop_count_hint(target, None).unwrap());
        assert_eq!(s.list_keyframes(media).unwrap()[0].loop_count_hint, None);
    }

    #[test]
    fn loop_hint_on_unknown_keyframe_returns_false() {
        let mut s = store();
        assert!(!s.update_loop_count_hint(Uuid::new_v4(), Some(2)).unwrap());
    }

    #[test]
    fn timing_overwrites_and_clears_per_media() {
        let mut s = store();
        let media = Uuid::new_v4();
        let AddOutcome::Added(kf) = add(&mut s, media, 100.0) else { unreachable!() };

        assert!(!s.has_timing(media).unwrap());
        s.set_timing(kf.id, 3.0).unwrap();
        assert_eq!(s.get_timing(kf.id).unwrap(), Some(3.0));
        s.set_timing(kf.id, 1.5).unwrap();
        assert_eq!(s.get_timing(kf.id).unwrap(), Some(1.5));
        assert!(s.has_timing(media).unwrap());

        s.clear_timing(media).unwrap();
        assert_eq!(s.get_timing(kf.id).unwrap(), None);
        assert!(!s.has_timing(media).unwrap());
    }

    #[test]
    fn timing_survives_keyframe_clear() {
        let mut s = store();
        let media = Uuid::new_v4();
        let AddOutcome::Added(kf) = add(&mut s, media, 100.0) else { unreachable!() };
        s.set_timing(kf.id, 2.0).unwrap();

        s.clear_keyframes(media).unwrap();
        assert_eq!(s.get_timing(kf.id).unwrap(), Some(2.0));
        assert!(s.has_timing(media).unwrap());

        // ...and can still be bulk cleared afterwards
        s.clear_timing(media).unwrap();
        assert_eq!(s.get_timing(kf.id).unwrap(), None);
    }

    #[test]
    fn timing_is_scoped_per_media_item() {
        let mut s = store();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let AddOutcome::Added(kf_a) = add(&mut s, a, 100.0) else { unreachable!() };
        let AddOutcome::Added(kf_b) = add(&mut s, b, 100.0) else { unreachable!() };
        s.set_timing(kf_a.id, 1.0).unwrap();
        s.set_timing(kf_b.id, 2.0).unwrap();

        s.clear_timing(a).unwrap();
        assert_eq!(s.get_timing(kf_a.id).unwrap(), None);
        assert_eq!(s.get_timing(kf_b.id).unwrap(), Some(2.0));
    }
}
