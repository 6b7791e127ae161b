//! File-backed keyframe store - one JSON document per collection.
//!
//! Keeps the whole document in memory and rewrites the file after every
//! mutation. Fine for the data sizes involved (tens of keyframes per media
//! item); a real database behind `KeyframeStore` would replace this
//! wholesale without the engine noticing.
//!
//! I/O failures map to `StoreError::Unavailable`. Saves are staged to a
//! sibling temp file and renamed into place, and the in-memory document is
//! only updated when the save succeeds, so neither a failed nor an
//! interrupted write can truncate the previous good document.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyframe::{Keyframe, TimingRecord};
use super::store::{AddOutcome, KeyframeStore, StoreError};

/// On-disk document shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KeyframeDoc {
    keyframes: Vec<Keyframe>,
    timing: Vec<TimingRecord>,
}

/// JSON-file-backed `KeyframeStore`.
#[derive(Debug)]
pub struct JsonKeyframeStore {
    path: PathBuf,
    doc: KeyframeDoc,
    min_distance_px: f32,
}

impl JsonKeyframeStore {
    /// Open an existing document, or start an empty one if the file is missing.
    pub fn open<P: AsRef<Path>>(path: P, min_distance_px: f32) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let json = fs::read_to_string(&path)
                .map_err(|e| StoreError::Unavailable(format!("read {}: {}", path.display(), e)))?;
            serde_json::from_str(&json)
                .map_err(|e| StoreError::Unavailable(format!("parse {}: {}", path.display(), e)))?
        } else {
            KeyframeDoc::default()
        };
        info!(
            "Opened keyframe document {} ({} keyframes, {} timing records)",
            path.display(),
            doc.keyframes.len(),
            doc.timing.len()
        );
        Ok(Self { path, doc, min_distance_px })
    }

    /// Distinct media items present in the document, in first-seen order.
    pub fn media_items(&self) -> Vec<Uuid> {
        let mut seen = Vec::new();
        for kf in &self.doc.keyframes {
            if !seen.contains(&kf.media_item_id) {
                seen.push(kf.media_item_id);
            }
        }
        seen
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a candidate document, then adopt it. The write goes to a
    /// sibling temp file and is renamed over the target, so a crash or
    /// ENOSPC mid-write leaves the previous document intact. The live
    /// document is untouched when the save fails.
    fn save(&mut self, doc: KeyframeDoc) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::Unavailable(format!("serialize: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Unavailable(format!("rename {}: {}", self.path.display(), e)))?;
        self.doc = doc;
        Ok(())
    }

    /// Media item a timing record should be filed under. Nil when the
    /// keyframe was never part of this document.
    fn media_of(&self, keyframe_id: Uuid) -> Uuid {
        self.doc
            .keyframes
            .iter()
            .find(|k| k.id == keyframe_id)
            .map(|k| k.media_item_id)
            .or_else(|| {
                self.doc
                    .timing
                    .iter()
                    .find(|t| t.keyframe_id == keyframe_id)
                    .map(|t| t.media_item_id)
            })
            .unwrap_or(Uuid::nil())
    }
}

impl KeyframeStore for JsonKeyframeStore {
    fn list_keyframes(&self, media_item_id: Uuid) -> Result<Vec<Keyframe>, StoreError> {
        let mut frames: Vec<Keyframe> = self
            .doc
            .keyframes
            .iter()
            .filter(|k| k.media_item_id == media_item_id)
            .cloned()
            .collect();
        frames.sort_by_key(|k| k.order_index);
        Ok(frames)
    }

    fn add_keyframe(
        &mut self,
        media_item_id: Uuid,
        y_position: f32,
        relative_position: f32,
    ) -> Result<AddOutcome, StoreError> {
        let siblings = self.list_keyframes(media_item_id)?;
        if let Some(existing) = siblings
            .iter()
            .find(|k| (k.y_position - y_position).abs() < self.min_distance_px)
        {
            return Ok(AddOutcome::TooClose { existing_y: existing.y_position });
        }

        let order_index = siblings.iter().map(|k| k.order_index + 1).max().unwrap_or(0);
        let kf = Keyframe::new(media_item_id, order_index, y_position, relative_position);

        let mut doc = self.doc.clone();
        doc.keyframes.push(kf.clone());
        self.save(doc)?;
        Ok(AddOutcome::Added(kf))
    }

    fn clear_keyframes(&mut self, media_item_id: Uuid) -> Result<(), StoreError> {
        if !self.doc.keyframes.iter().any(|k| k.media_item_id == media_item_id) {
            return Ok(());
        }
        let mut doc = self.doc.clone();
        doc.keyframes.retain(|k| k.media_item_id != media_item_id);
        self.save(doc)
    }

    fn update_loop_count_hint(
        &mut self,
        keyframe_id: Uuid,
        loop_count: Option<u32>,
    ) -> Result<bool, StoreError> {
        let mut doc = self.doc.clone();
        let Some(kf) = doc.keyframes.iter_mut().find(|k| k.id == keyframe_id) else {
            return Ok(false);
        };
        kf.loop_count_hint = loop_count;
        self.save(doc)?;
        Ok(true)
    }

    fn get_timing(&self, keyframe_id: Uuid) -> Result<Option<f64>, StoreError> {
        Ok(self
            .doc
            .timing
            .iter()
            .find(|t| t.keyframe_id == keyframe_id)
            .map(|t| t.duration_secs))
    }

    fn set_timing(&mut self, keyframe_id: Uuid, duration_secs: f64) -> Result<(), StoreError> {
        let media_item_id = self.media_of(keyframe_id);
        let mut doc = self.doc.clone();
        match doc.timing.iter_mut().find(|t| t.keyframe_id == keyframe_id) {
            Some(rec) => rec.duration_secs = duration_secs,
            None => doc.timing.push(TimingRecord { keyframe_id, media_item_id, duration_secs }),
        }
        self.save(doc)
    }

    fn has_timing(&self, media_item_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.doc.timing.iter().any(|t| t.media_item_id == media_item_id))
    }

    fn clear_timing(&mut self, media_item_id: Uuid) -> Result<(), StoreError> {
        if !self.doc.timing.iter().any(|t| t.media_item_id == media_item_id) {
            return Ok(());
        }
        let mut doc = self.doc.clone();
        doc.timing.retain(|t| t.media_item_id != media_item_id);
        self.save(doc)
    }
}
