//! Timing recorder - captures dwell durations during a manual playthrough.
//!
//! Semantics that matter: a duration is recorded *retroactively at
//! departure*. When the user moves from keyframe K to K+1, the elapsed
//! time since arriving at K is written as K's dwell duration. The last
//! keyframe of a pass never gets a departure, so its previous record (if
//! any) is left untouched by `stop()`.

use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::entities::store::{KeyframeStore, StoreError};

#[derive(Debug, Clone, Copy)]
struct Pass {
    media_item_id: Uuid,
    /// Time of the most recent arrival (or of `start`)
    last_mark: Duration,
}

/// Records wall-clock dwell times keyed by keyframe id.
#[derive(Debug, Default)]
pub struct TimingRecorder {
    pass: Option<Pass>,
}

impl TimingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.pass.is_some()
    }

    pub fn media_item_id(&self) -> Option<Uuid> {
        self.pass.map(|p| p.media_item_id)
    }

    /// Begin a recording pass. Existing timing data is not cleared; new
    /// departures overwrite record by record.
    pub fn start(&mut self, media_item_id: Uuid, now: Duration) {
        info!("Recording pass started for {}", media_item_id);
        self.pass = Some(Pass { media_item_id, last_mark: now });
    }

    /// The active keyframe is being left: persist its dwell time (elapsed
    /// since the previous arrival) and mark the new arrival time.
    ///
    /// Returns the recorded duration, or None when no pass is active. On a
    /// store failure the arrival mark is left unchanged, so a retry of the
    /// same departure measures from the original arrival.
    pub fn record_departure(
        &mut self,
        store: &mut dyn KeyframeStore,
        departed_keyframe: Uuid,
        now: Duration,
    ) -> Result<Option<f64>, StoreError> {
        let Some(pass) = self.pass.as_mut() else {
            return Ok(None);
        };

        let dwell = now.saturating_sub(pass.last_mark).as_secs_f64();
        store.set_timing(departed_keyframe, dwell)?;
        pass.last_mark = now;
        debug!("Recorded dwell {:.2}s for keyframe {}", dwell, departed_keyframe);
        Ok(Some(dwell))
    }

    /// End the pass. No duration is written for the last-visited keyframe.
    /// Returns true when a pass was actually active.
    pub fn stop(&mut self) -> bool {
        let was_active = self.pass.take().is_some();
        if was_active {
            info!("Recording pass stopped");
        }
        was_active
    }
}
