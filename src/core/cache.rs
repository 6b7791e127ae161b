//! Per-media-item keyframe cache.
//!
//! Avoids store round-trips during interactive navigation: the first read
//! for a media item fetches through to the store, later reads hit the
//! cached `KeyframeSet`. Structural mutations invalidate the entry *after*
//! the store write succeeds; the engine then refetches eagerly so the next
//! read is warm (avoids a visible hiccup right after an edit).
//!
//! Single interaction thread by design - no internal locking.

use indexmap::IndexMap;
use log::{debug, trace};
use uuid::Uuid;

use crate::entities::keyframe::KeyframeSet;
use crate::entities::store::{KeyframeStore, StoreError};

/// Hit/miss counters for monitoring cache effectiveness.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

/// In-memory map of media item -> ordered keyframe set.
#[derive(Debug, Default)]
pub struct KeyframeCache {
    sets: IndexMap<Uuid, KeyframeSet>,
    stats: CacheStats,
}

impl KeyframeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached set for a media item, fetching through the store on a miss.
    pub fn get(
        &mut self,
        media_item_id: Uuid,
        store: &dyn KeyframeStore,
    ) -> Result<&KeyframeSet, StoreError> {
        if self.sets.contains_key(&media_item_id) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let set = KeyframeSet::from_unordered(store.list_keyframes(media_item_id)?);
            trace!("Cache miss for {}: fetched {} keyframes", media_item_id, set.len());
            self.sets.insert(media_item_id, set);
        }
        Ok(&self.sets[&media_item_id])
    }

    /// Drop the cached entry; the next `get` refetches.
    pub fn invalidate(&mut self, media_item_id: Uuid) {
        if self.sets.shift_remove(&media_item_id).is_some() {
            debug!("Invalidated keyframe cache for {}", media_item_id);
        }
    }

    /// Invalidate and immediately refetch (warm-cache path after a
    /// successful structural mutation).
    pub fn refresh(
        &mut self,
        media_item_id: Uuid,
        store: &dyn KeyframeStore,
    ) -> Result<&KeyframeSet, StoreError> {
        self.invalidate(media_item_id);
        let set = KeyframeSet::from_unordered(store.list_keyframes(media_item_id)?);
        self.sets.insert(media_item_id, set);
        Ok(&self.sets[&media_item_id])
    }

    /// Drop everything (media library switch, shutdown).
    pub fn clear(&mut self) {
        self.sets.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
