//! KeyframeEngine - the per-session context object.
//!
//! Owns the store, cache, navigator, recorder, player, and event sender;
//! no hidden statics. A presentation layer constructs one of these per
//! open document, forwards its interaction events (add/step/jump/toggle)
//! into the facade methods here, calls `tick()` at frame rate, and drains
//! the event receiver.
//!
//! All methods run on one logical interaction thread. Manual navigation is
//! routed by playback state: during a recording pass it writes the dwell
//! departure first and steps second; during playback it becomes the
//! correct-and-redirect override; otherwise it is a plain scroll jump.

use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::core::cache::{CacheStats, KeyframeCache};
use crate::core::events::{EngineEvent, EventSender, channel};
use crate::core::navigator::{KeyframeNavigator, NavTarget};
use crate::core::player::{PlaybackEngine, PlaybackState};
use crate::core::recorder::TimingRecorder;
use crate::core::settings::EngineSettings;
use crate::entities::keyframe::{Keyframe, KeyframeSet};
use crate::entities::store::{AddOutcome, KeyframeStore, StoreError};
use crate::entities::traits::{Clock, ScrollSurface};

/// Recoverable engine failures. All of these surface as a transient
/// status message at the UI; none of them crash or leave half-written
/// state behind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("no media item is active")]
    NoActiveMediaItem,
    #[error("media item has no keyframes")]
    EmptyKeyframeSet,
    #[error("keyframe too close to an existing one at y={existing_y}")]
    TooClose { existing_y: f32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

enum NavOp {
    Next,
    Prev,
    Jump(usize),
}

/// Facade over the whole keyframe subsystem for one session.
pub struct KeyframeEngine<S: KeyframeStore, C: Clock> {
    store: S,
    clock: C,
    cache: KeyframeCache,
    navigator: KeyframeNavigator,
    recorder: TimingRecorder,
    player: PlaybackEngine,
    events: EventSender,
    settings: EngineSettings,
    active_media: Option<Uuid>,
}

impl<S: KeyframeStore, C: Clock> KeyframeEngine<S, C> {
    pub fn new(store: S, clock: C, settings: EngineSettings, events: EventSender) -> Self {
        Self {
            store,
            clock,
            cache: KeyframeCache::new(),
            navigator: KeyframeNavigator::new(),
            recorder: TimingRecorder::new(),
            player: PlaybackEngine::new(),
            events,
            settings,
            active_media: None,
        }
    }

    /// Construct with a fresh event channel; the caller keeps the receiver.
    pub fn with_channel(
        store: S,
        clock: C,
        settings: EngineSettings,
    ) -> (Self, crossbeam_channel::Receiver<EngineEvent>) {
        let (tx, rx) = channel();
        (Self::new(store, clock, settings, tx), rx)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EngineSettings {
        &mut self.settings
    }

    pub fn active_media(&self) -> Option<Uuid> {
        self.active_media
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Navigator index; -1 when nothing is selected.
    pub fn current_index(&self) -> i32 {
        self.navigator.current_index()
    }

    pub fn completed_play_count(&self) -> u32 {
        self.player.completed_count()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // === Media item lifecycle ===

    /// Switch the active media item. Cancels any in-flight playback or
    /// recording for the previous item and resets the navigator, so no
    /// scroll/timer state leaks across items.
    pub fn set_active_media(&mut self, media_item_id: Option<Uuid>) {
        if self.active_media == media_item_id {
            return;
        }
        if self.player.is_play_active() {
            self.player.stop(&self.events);
        }
        if self.recorder.stop() {
            self.player.end_recording();
            self.events.emit(EngineEvent::RecordingStateChanged(false));
        }
        self.navigator.reset();
        self.player.set_position(0.0);
        self.active_media = media_item_id;
        info!("Active media item -> {:?}", media_item_id);
    }

    // === Keyframe CRUD ===

    /// Add a keyframe at the given scroll position; the relative position
    /// is derived from the surface's current heights.
    pub fn add_keyframe_at(
        &mut self,
        y_position: f32,
        surface: &dyn ScrollSurface,
    ) -> Result<Keyframe, EngineError> {
        let media = self.require_media()?;
        let relative = relative_position(y_position, surface);
        let outcome = self.store.add_keyframe(media, y_position, relative);
        match self.check_store(outcome)? {
            AddOutcome::Added(kf) => {
                // Invalidate only after the successful write, then refetch
                // eagerly so the next interactive read is warm
                let refreshed = self.cache.refresh(media, &self.store).map(|_| ());
                self.check_store(refreshed)?;
                Ok(kf)
            }
            AddOutcome::TooClose { existing_y } => {
                self.status(format!("Keyframe too close to existing one at y={existing_y:.0}"));
                Err(EngineError::TooClose { existing_y })
            }
        }
    }

    /// Delete every keyframe of the active media item. Stops playback if
    /// it was running (there is nothing left to play).
    pub fn clear_keyframes(&mut self) -> Result<(), EngineError> {
        let media = self.require_media()?;
        let cleared = self.store.clear_keyframes(media);
        self.check_store(cleared)?;
        let refreshed = self.cache.refresh(media, &self.store).map(|s| s.clone());
        let set = self.check_store(refreshed)?;
        if self.player.is_play_active() {
            self.player.stop(&self.events);
        }
        self.navigator.clamp_to(&set);
        Ok(())
    }

    /// Set or clear the advisory loop hint on one keyframe.
    pub fn set_loop_hint(
        &mut self,
        keyframe_id: Uuid,
        hint: Option<u32>,
    ) -> Result<bool, EngineError> {
        let media = self.require_media()?;
        let updated = self.store.update_loop_count_hint(keyframe_id, hint);
        let found = self.check_store(updated)?;
        if found {
            let refreshed = self.cache.refresh(media, &self.store).map(|_| ());
            self.check_store(refreshed)?;
        }
        Ok(found)
    }

    pub fn keyframes(&mut self) -> Result<KeyframeSet, EngineError> {
        let media = self.require_media()?;
        let cached = self.cache.get(media, &self.store).map(|s| s.clone());
        self.check_store(cached)
    }

    // === Timing data ===

    pub fn has_timing(&self) -> Result<bool, EngineError> {
        let media = self.require_media()?;
        let res = self.store.has_timing(media);
        self.check_store(res)
    }

    pub fn clear_timing(&mut self) -> Result<(), EngineError> {
        let media = self.require_media()?;
        let res = self.store.clear_timing(media);
        self.check_store(res)
    }

    // === Manual navigation ===

    pub fn step_next(&mut self, surface: &mut dyn ScrollSurface) -> Result<NavTarget, EngineError> {
        self.manual_nav(NavOp::Next, surface)
    }

    pub fn step_prev(&mut self, surface: &mut dyn ScrollSurface) -> Result<NavTarget, EngineError> {
        self.manual_nav(NavOp::Prev, surface)
    }

    /// Click-to-jump. Routed like a step, so jumping during playback is a
    /// manual override too.
    pub fn jump_to(
        &mut self,
        index: usize,
        surface: &mut dyn ScrollSurface,
    ) -> Result<NavTarget, EngineError> {
        self.manual_nav(NavOp::Jump(index), surface)
    }

    fn manual_nav(
        &mut self,
        op: NavOp,
        surface: &mut dyn ScrollSurface,
    ) -> Result<NavTarget, EngineError> {
        let media = self.require_media()?;
        let cached = self.cache.get(media, &self.store).map(|s| s.clone());
        let set = self.check_store(cached)?;
        if set.is_empty() {
            self.status("No keyframes for this media item");
            return Err(EngineError::EmptyKeyframeSet);
        }

        // Recording pass: the keyframe being left gets its dwell duration
        // now, before the index moves (write-then-step ordering).
        if self.recorder.is_active() {
            let idx = self.navigator.current_index();
            if idx >= 0
                && let Some(departed) = set.get(idx as usize)
            {
                let recorded = self
                    .recorder
                    .record_departure(&mut self.store, departed.id, self.clock.now());
                self.check_store(recorded)?;
            }
        }

        let target = match op {
            NavOp::Next => self.navigator.step_next(&set),
            NavOp::Prev => self.navigator.step_prev(&set),
            NavOp::Jump(index) => self.navigator.jump_to(&set, index),
        }
        .expect("non-empty set always yields a target");

        if self.player.is_play_active() {
            // Manual override: correct history, cancel the wait, redirect
            let redirected = self
                .player
                .redirect(target, &set, &mut self.store, surface, &self.events);
            self.check_store(redirected)?;
        } else {
            surface.set_scroll_offset(target.y_position);
            self.player.set_position(target.y_position);
            self.events.emit(EngineEvent::CurrentKeyframeChanged {
                index: target.index,
                y_position: target.y_position,
            });
        }
        Ok(target)
    }

    // === Recording ===

    /// Toggle the recording pass. Returns the new recording state.
    pub fn toggle_recording(
        &mut self,
        surface: &mut dyn ScrollSurface,
    ) -> Result<bool, EngineError> {
        if self.recorder.is_active() {
            self.recorder.stop();
            self.player.end_recording();
            self.events.emit(EngineEvent::RecordingStateChanged(false));
            return Ok(false);
        }

        let media = self.require_media()?;
        if self.player.is_play_active() {
            self.status("Stop playback before recording");
            return Ok(false);
        }
        let cached = self.cache.get(media, &self.store).map(|s| s.clone());
        let set = self.check_store(cached)?;
        if set.is_empty() {
            self.status("No keyframes to record timing for");
            return Err(EngineError::EmptyKeyframeSet);
        }

        // Start tracking at the selected keyframe, or the first one when
        // nothing is selected yet
        if self.navigator.current_index() < 0 {
            let target = self
                .navigator
                .jump_to(&set, 0)
                .expect("non-empty set has index 0");
            surface.set_scroll_offset(target.y_position);
            self.player.set_position(target.y_position);
            self.events.emit(EngineEvent::CurrentKeyframeChanged {
                index: target.index,
                y_position: target.y_position,
            });
        }

        self.player.begin_recording();
        self.recorder.start(media, self.clock.now());
        self.events.emit(EngineEvent::RecordingStateChanged(true));
        Ok(true)
    }

    // === Playback ===

    /// Toggle playback. Idle starts a deterministic playthrough from the
    /// first keyframe; Playing or Paused stops and freezes the scroll.
    pub fn toggle_playback(&mut self, surface: &mut dyn ScrollSurface) -> Result<(), EngineError> {
        let media = self.require_media()?;

        if self.player.is_play_active() {
            self.player.stop(&self.events);
            return Ok(());
        }
        if self.player.state() == PlaybackState::Recording {
            self.status("Recording in progress");
            return Ok(());
        }

        let cached = self.cache.get(media, &self.store).map(|s| s.clone());
        let set = self.check_store(cached)?;
        if set.is_empty() {
            self.status("No keyframes for this media item");
            return Err(EngineError::EmptyKeyframeSet);
        }

        let started = self.player.start(
            &set,
            &mut self.navigator,
            &self.store,
            surface,
            &self.events,
            &self.settings,
        );
        self.check_store(started)
    }

    /// Pause/resume an active playthrough. Returns false when idle.
    pub fn toggle_pause(&mut self) -> bool {
        self.player.toggle_pause(&self.events)
    }

    /// Advance playback timers. Call at UI frame rate.
    pub fn tick(&mut self, surface: &mut dyn ScrollSurface) -> Result<(), EngineError> {
        let Some(media) = self.active_media else {
            return Ok(());
        };
        if !self.player.is_playing() {
            return Ok(());
        }
        // Borrow the cached set directly; ticks run at frame rate and must
        // not clone it
        let set = match self.cache.get(media, &self.store) {
            Ok(set) => set,
            Err(e) => {
                self.status(format!("Keyframe store failure: {}", e));
                return Err(e.into());
            }
        };
        let ticked = self.player.tick(
            self.clock.now(),
            set,
            &mut self.navigator,
            &self.store,
            surface,
            &self.events,
        );
        self.check_store(ticked)
    }

    // === Helpers ===

    /// Route a store failure into a status event before propagating it.
    fn check_store<T>(&self, result: Result<T, StoreError>) -> Result<T, EngineError> {
        result.map_err(|e| {
            self.status(format!("Keyframe store failure: {}", e));
            EngineError::Store(e)
        })
    }

    fn require_media(&self) -> Result<Uuid, EngineError> {
        match self.active_media {
            Some(media) => Ok(media),
            None => {
                self.status("No media item selected");
                Err(EngineError::NoActiveMediaItem)
            }
        }
    }

    fn status(&self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{}", msg);
        self.events.emit(EngineEvent::Status(msg));
    }
}

/// Fractional position of a scroll offset within the scrollable range.
fn relative_position(y: f32, surface: &dyn ScrollSurface) -> f32 {
    let range = surface.scrollable_height() - surface.viewport_height();
    if range <= 0.0 {
        0.0
    } else {
        (y / range).clamp(0.0, 1.0)
    }
}
