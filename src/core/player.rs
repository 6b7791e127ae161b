//! Playback engine - the animate/dwell state machine.
//!
//! **Architecture**: the player does NOT own the keyframe set, navigator,
//! or store. Callers pass them into each method; `KeyframeEngine` owns the
//! single instance of everything and is the only caller.
//!
//! # Timing model
//!
//! `tick()` is called at UI frame rate with the current clock reading and
//! advances whatever phase is active by the elapsed delta. Waits are
//! deadline checks, never sleeps, so a stop/pause/override issued between
//! ticks takes effect on the very next tick.
//!
//! # Phases while Playing
//!
//! - **Glide**: eased scroll animation toward the next keyframe over the
//!   configured transition time (independent of recorded dwell times).
//! - **Dwell**: wait at the keyframe for `max(recorded, default)` seconds,
//!   then advance circularly. Wrapping past the last keyframe completes a
//!   pass and consumes one unit of the finite repeat budget.
//!
//! # Manual override
//!
//! A prev/next issued while Playing does not pause anything: the dwell
//! elapsed so far is written back as the *corrected* duration of the
//! keyframe being departed, the remaining wait is cancelled, and the loop
//! redirects its glide at the requested target. Rapid repeated overrides
//! are safe - once the glide is in flight there is no dwell to correct, so
//! each departed keyframe is corrected exactly once.

use std::time::Duration;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::easing::{self, Easing};
use crate::core::events::{EngineEvent, EventSender};
use crate::core::navigator::{KeyframeNavigator, NavTarget};
use crate::core::settings::EngineSettings;
use crate::entities::keyframe::KeyframeSet;
use crate::entities::store::{KeyframeStore, StoreError};
use crate::entities::traits::ScrollSurface;

/// Playback state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Recording,
    Playing,
    Paused,
}

/// In-flight scroll interpolation between two keyframe positions.
#[derive(Debug, Clone, Copy)]
struct Animation {
    start: f32,
    end: f32,
    duration_secs: f64,
    elapsed_secs: f64,
    easing: Easing,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Animating toward the keyframe at `target_index`
    Glide { anim: Animation, target_index: usize },
    /// Waiting at a keyframe before advancing
    Dwell {
        keyframe_id: Uuid,
        index: usize,
        total_secs: f64,
        elapsed_secs: f64,
    },
}

/// Tick-driven playback state machine.
pub struct PlaybackEngine {
    state: PlaybackState,
    phase: Option<Phase>,
    /// Passes remaining; -1 = infinite
    repeats_left: i32,
    completed_count: u32,
    /// Engine's view of the scroll position; kept in sync with every
    /// offset it writes to the surface
    current_pos: f32,
    last_tick: Option<Duration>,
    // Knobs snapshotted from settings when playback starts
    transition_secs: f64,
    default_dwell_secs: f64,
    easing: Easing,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            phase: None,
            repeats_left: -1,
            completed_count: 0,
            current_pos: 0.0,
            last_tick: None,
            transition_secs: 0.0,
            default_dwell_secs: 0.0,
            easing: Easing::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Playing or Paused - an active playthrough exists either way.
    pub fn is_play_active(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn current_position(&self) -> f32 {
        self.current_pos
    }

    /// Sync the engine's position after a direct (non-playback) jump.
    pub fn set_position(&mut self, y: f32) {
        self.current_pos = y;
    }

    // === Recording state (the recorder itself lives in KeyframeEngine) ===

    /// Idle -> Recording. Returns false from any other state.
    pub fn begin_recording(&mut self) -> bool {
        if self.state != PlaybackState::Idle {
            return false;
        }
        self.state = PlaybackState::Recording;
        true
    }

    /// Recording -> Idle. Returns false from any other state.
    pub fn end_recording(&mut self) -> bool {
        if self.state != PlaybackState::Recording {
            return false;
        }
        self.state = PlaybackState::Idle;
        true
    }

    // === Playback ===

    /// Start a playthrough from the first keyframe.
    ///
    /// Always begins at index 0 so explicit plays are reproducible, no
    /// matter where manual navigation left the index. Caller guarantees a
    /// non-empty set.
    pub fn start(
        &mut self,
        set: &KeyframeSet,
        navigator: &mut KeyframeNavigator,
        store: &dyn KeyframeStore,
        surface: &mut dyn ScrollSurface,
        events: &EventSender,
        settings: &EngineSettings,
    ) -> Result<(), StoreError> {
        debug_assert!(!set.is_empty());

        self.transition_secs = settings.transition_secs;
        self.default_dwell_secs = settings.default_dwell_secs;
        self.easing = settings.easing;
        self.repeats_left = settings.play_repeat_count;
        self.completed_count = 0;
        self.last_tick = None;

        self.state = PlaybackState::Playing;
        events.emit(EngineEvent::PlayingStateChanged(true));
        info!(
            "Playback started: {} keyframes, repeat={}, transition={}s",
            set.len(),
            self.repeats_left,
            self.transition_secs
        );

        let target = navigator
            .jump_to(set, 0)
            .expect("non-empty set has index 0");
        self.begin_glide(target, set, store, surface, events)
    }

    /// Stop an active playthrough; scroll freezes where it is.
    pub fn stop(&mut self, events: &EventSender) {
        if !self.is_play_active() {
            return;
        }
        if matches!(self.phase, Some(Phase::Glide { .. })) {
            events.emit(EngineEvent::ScrollAnimationCancelRequested);
        }
        self.phase = None;
        self.last_tick = None;
        self.state = PlaybackState::Idle;
        events.emit(EngineEvent::PlayingStateChanged(false));
        info!("Playback stopped");
    }

    /// Playing <-> Paused. Freezes the current glide and dwell timers
    /// without resetting their elapsed time. Returns false when no
    /// playthrough is active.
    pub fn toggle_pause(&mut self, events: &EventSender) -> bool {
        match self.state {
            PlaybackState::Playing => {
                self.state = PlaybackState::Paused;
                self.last_tick = None;
                if matches!(self.phase, Some(Phase::Glide { .. })) {
                    events.emit(EngineEvent::ScrollAnimationCancelRequested);
                }
                events.emit(EngineEvent::PlayingStateChanged(false));
                debug!("Playback paused");
                true
            }
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                self.last_tick = None;
                if let Some(Phase::Glide { anim, .. }) = &self.phase {
                    // Restart the UI-side animation for the remaining leg
                    events.emit(EngineEvent::ScrollAnimationRequested {
                        start: self.current_pos,
                        end: anim.end,
                        duration_secs: (anim.duration_secs - anim.elapsed_secs).max(0.0),
                        easing: anim.easing,
                    });
                }
                events.emit(EngineEvent::PlayingStateChanged(true));
                debug!("Playback resumed");
                true
            }
            _ => false,
        }
    }

    /// Manual navigation landed on `target` while a playthrough is active:
    /// correct history and redirect the running loop.
    ///
    /// While Playing and dwelling, the dwell elapsed so far overwrites the
    /// departed keyframe's recorded duration. The correction write happens
    /// here, before the redirect glide starts, so a slow store can never
    /// reorder it behind the next navigation. A correction failure is
    /// returned to the caller but does not derail the redirect - playback
    /// state must stay coherent with the navigator, which already moved.
    ///
    /// While Paused there is no running dwell to correct; the redirect
    /// glide is armed without a UI animation event, which resume emits.
    pub fn redirect(
        &mut self,
        target: NavTarget,
        set: &KeyframeSet,
        store: &mut dyn KeyframeStore,
        surface: &mut dyn ScrollSurface,
        events: &EventSender,
    ) -> Result<(), StoreError> {
        let mut correction: Result<(), StoreError> = Ok(());

        if self.state == PlaybackState::Playing {
            if let Some(Phase::Dwell { keyframe_id, elapsed_secs, .. }) = self.phase {
                correction = store.set_timing(keyframe_id, elapsed_secs);
                match &correction {
                    Ok(()) => {
                        info!("Corrected dwell of {} to {:.2}s", keyframe_id, elapsed_secs)
                    }
                    Err(e) => debug!("Dwell correction failed for {}: {}", keyframe_id, e),
                }
            }
        }

        events.emit(EngineEvent::ScrollAnimationCancelRequested);
        let glide = self.begin_glide(target, set, store, surface, events);
        correction.and(glide)
    }

    /// Advance all timers. Call at UI frame rate with the current clock
    /// reading; no-op unless Playing.
    pub fn tick(
        &mut self,
        now: Duration,
        set: &KeyframeSet,
        navigator: &mut KeyframeNavigator,
        store: &dyn KeyframeStore,
        surface: &mut dyn ScrollSurface,
        events: &EventSender,
    ) -> Result<(), StoreError> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }

        let dt = match self.last_tick {
            Some(last) => now.saturating_sub(last).as_secs_f64(),
            None => 0.0,
        };
        self.last_tick = Some(now);

        match self.phase {
            Some(Phase::Glide { mut anim, target_index }) => {
                anim.elapsed_secs += dt;
                let pos = easing::sample(
                    anim.easing,
                    anim.start,
                    anim.end,
                    anim.duration_secs,
                    anim.elapsed_secs,
                );
                self.current_pos = pos;
                surface.set_scroll_offset(pos);

                if anim.elapsed_secs >= anim.duration_secs {
                    self.arrive(target_index, set, store)?;
                } else {
                    self.phase = Some(Phase::Glide { anim, target_index });
                }
            }
            Some(Phase::Dwell { keyframe_id, index, total_secs, elapsed_secs }) => {
                let elapsed_secs = elapsed_secs + dt;
                if elapsed_secs >= total_secs {
                    self.advance(set, navigator, store, surface, events)?;
                } else {
                    self.phase = Some(Phase::Dwell { keyframe_id, index, total_secs, elapsed_secs });
                }
            }
            None => {
                // Playing with no phase shouldn't happen; recover by stopping
                self.stop(events);
            }
        }
        Ok(())
    }

    /// Dwell finished: step circularly, book passes, stop when the repeat
    /// budget runs out.
    fn advance(
        &mut self,
        set: &KeyframeSet,
        navigator: &mut KeyframeNavigator,
        store: &dyn KeyframeStore,
        surface: &mut dyn ScrollSurface,
        events: &EventSender,
    ) -> Result<(), StoreError> {
        let was_last = set
            .last_index()
            .is_some_and(|last| navigator.current_index() == last as i32);

        let Some(target) = navigator.step_next(set) else {
            // Set emptied mid-playback
            self.stop(events);
            return Ok(());
        };

        if was_last && target.index == 0 {
            self.completed_count += 1;
            trace!("Pass {} complete", self.completed_count);
            if self.repeats_left > 0 {
                self.repeats_left -= 1;
            }
            if self.repeats_left == 0 {
                // Land back on the first keyframe, then report completion
                self.current_pos = target.y_position;
                surface.set_scroll_offset(target.y_position);
                events.emit(EngineEvent::CurrentKeyframeChanged {
                    index: target.index,
                    y_position: target.y_position,
                });
                let completed = self.completed_count;
                self.stop(events);
                events.emit(EngineEvent::PlayFinished { completed_count: completed });
                return Ok(());
            }
        }

        self.begin_glide(target, set, store, surface, events)
    }

    /// Kick off the glide toward `target`. Zero transition time or an
    /// already-reached position becomes a direct jump into the dwell.
    fn begin_glide(
        &mut self,
        target: NavTarget,
        set: &KeyframeSet,
        store: &dyn KeyframeStore,
        surface: &mut dyn ScrollSurface,
        events: &EventSender,
    ) -> Result<(), StoreError> {
        events.emit(EngineEvent::CurrentKeyframeChanged {
            index: target.index,
            y_position: target.y_position,
        });

        if self.transition_secs <= 0.0 || self.current_pos == target.y_position {
            self.current_pos = target.y_position;
            surface.set_scroll_offset(target.y_position);
            return self.arrive(target.index, set, store);
        }

        let anim = Animation {
            start: self.current_pos,
            end: target.y_position,
            duration_secs: self.transition_secs,
            elapsed_secs: 0.0,
            easing: self.easing,
        };
        // A paused redirect arms the glide silently; resume announces it
        if self.state == PlaybackState::Playing {
            events.emit(EngineEvent::ScrollAnimationRequested {
                start: anim.start,
                end: anim.end,
                duration_secs: anim.duration_secs,
                easing: anim.easing,
            });
        }
        self.phase = Some(Phase::Glide { anim, target_index: target.index });
        Ok(())
    }

    /// Landed on a keyframe: begin its dwell.
    fn arrive(
        &mut self,
        index: usize,
        set: &KeyframeSet,
        store: &dyn KeyframeStore,
    ) -> Result<(), StoreError> {
        let Some(kf) = set.get(index) else {
            // Stale index after a shrink; the next advance re-clamps
            self.phase = None;
            return Ok(());
        };
        let recorded = store.get_timing(kf.id)?;
        let total_secs = recorded
            .map(|d| d.max(self.default_dwell_secs))
            .unwrap_or(self.default_dwell_secs);
        trace!("Arrived at keyframe {} (y={}), dwelling {:.2}s", index, kf.y_position, total_secs);
        self.phase = Some(Phase::Dwell {
            keyframe_id: kf.id,
            index,
            total_secs,
            elapsed_secs: 0.0,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events;
    use crate::entities::store::{AddOutcome, MemoryKeyframeStore};
    use crate::entities::traits::TestSurface;
    use uuid::Uuid;

    struct Rig {
        store: MemoryKeyframeStore,
        set: KeyframeSet,
        nav: KeyframeNavigator,
        surface: TestSurface,
        player: PlaybackEngine,
        media: Uuid,
    }

    fn rig(ys: &[f32]) -> Rig {
        let mut store = MemoryKeyframeStore::new(20.0);
        let media = Uuid::new_v4();
        for &y in ys {
            assert!(store.add_keyframe(media, y, 0.0).unwrap().is_added());
        }
        let set = KeyframeSet::from_unordered(store.list_keyframes(media).unwrap());
        Rig {
            store,
            set,
            nav: KeyframeNavigator::new(),
            surface: TestSurface::new(),
            player: PlaybackEngine::new(),
            media,
        }
    }

    fn settings(transition: f64, dwell: f64, repeat: i32) -> EngineSettings {
        EngineSettings {
            transition_secs: transition,
            default_dwell_secs: dwell,
            easing: Easing::Linear,
            play_repeat_count: repeat,
            ..Default::default()
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    /// Tick in 0.1s increments up to `until`.
    fn run_until(r: &mut Rig, ev: &EventSender, from: f64, until: f64) {
        let mut t = from;
        while t < until {
            t += 0.1;
            r.player
                .tick(secs(t), &r.set, &mut r.nav, &r.store, &mut r.surface, ev)
                .unwrap();
        }
    }

    #[test]
    fn glide_interpolates_then_dwells() {
        let mut r = rig(&[100.0, 400.0]);
        let (tx, rx) = events::channel();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(1.0, 2.0, -1))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::PlayingStateChanged(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::CurrentKeyframeChanged { index: 0, y_position: 100.0 }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            EngineEvent::ScrollAnimationRequested { end, .. } if end == 100.0
        ));

        // First tick establishes the time base, then half the glide
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        r.player.tick(secs(0.5), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        let mid = r.surface.last_offset().unwrap();
        assert!(mid > 0.0 && mid < 100.0, "midway offset was {}", mid);

        r.player.tick(secs(1.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.surface.last_offset(), Some(100.0));
        assert_eq!(r.player.current_position(), 100.0);
    }

    #[test]
    fn recorded_dwell_is_floored_by_default() {
        let mut r = rig(&[100.0, 400.0]);
        let kf0 = r.set.get(0).unwrap().id;
        r.store.set_timing(kf0, 0.5).unwrap(); // below the 2.0 default
        let tx = EventSender::dummy();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(0.0, 2.0, -1))
            .unwrap();

        // Instant cut: already dwelling at keyframe 0
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        run_until(&mut r, &tx, 0.0, 1.5);
        assert_eq!(r.nav.current_index(), 0, "left the keyframe before the default floor");
        run_until(&mut r, &tx, 1.5, 2.2);
        assert_eq!(r.nav.current_index(), 1, "did not advance after the floored dwell");
    }

    #[test]
    fn finite_repeat_stops_with_play_finished() {
        // Scenario D: 2 keyframes, repeat=1, one full pass then stop
        let mut r = rig(&[100.0, 400.0]);
        let (tx, rx) = events::channel();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(0.0, 1.0, 1))
            .unwrap();

        run_until(&mut r, &tx, 0.0, 5.0);
        assert_eq!(r.player.state(), PlaybackState::Idle);
        assert_eq!(r.player.completed_count(), 1);

        let evs: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(evs.contains(&EngineEvent::PlayFinished { completed_count: 1 }));
        // Both keyframes were visited exactly once
        let visits: Vec<usize> = evs
            .iter()
            .filter_map(|e| match e {
                EngineEvent::CurrentKeyframeChanged { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(visits, vec![0, 1, 0]);
    }

    #[test]
    fn single_keyframe_loops_in_place_without_animation() {
        let mut r = rig(&[250.0]);
        let (tx, rx) = events::channel();
        // Already scrolled to the keyframe; only the in-place loop runs
        r.player.set_position(250.0);
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(0.5, 1.0, 2))
            .unwrap();

        run_until(&mut r, &tx, 0.0, 5.0);
        assert_eq!(r.player.state(), PlaybackState::Idle);
        assert_eq!(r.player.completed_count(), 2);
        let evs: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(
            !evs.iter().any(|e| matches!(e, EngineEvent::ScrollAnimationRequested { .. })),
            "start == end must not animate"
        );
        assert!(evs.contains(&EngineEvent::PlayFinished { completed_count: 2 }));
    }

    #[test]
    fn pause_preserves_remaining_dwell() {
        let mut r = rig(&[100.0, 400.0]);
        let tx = EventSender::dummy();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(0.0, 2.0, -1))
            .unwrap();

        // Dwell 1.0s of the 2.0s wait, then pause for a long time
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        run_until(&mut r, &tx, 0.0, 1.0);
        assert!(r.player.toggle_pause(&tx));
        assert_eq!(r.player.state(), PlaybackState::Paused);
        run_until(&mut r, &tx, 100.0, 101.0); // ticks ignored while paused
        assert_eq!(r.nav.current_index(), 0);

        // Resume: only ~1.0s of dwell should remain
        assert!(r.player.toggle_pause(&tx));
        run_until(&mut r, &tx, 200.0, 200.5);
        assert_eq!(r.nav.current_index(), 0, "advanced too early after resume");
        run_until(&mut r, &tx, 200.5, 201.3);
        assert_eq!(r.nav.current_index(), 1, "remaining dwell not honored");
    }

    #[test]
    fn pause_mid_glide_resumes_remaining_animation() {
        let mut r = rig(&[100.0, 400.0]);
        let (tx, rx) = events::channel();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(2.0, 1.0, -1))
            .unwrap();

        // Quarter of the way through the 2s glide toward keyframe 0
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        r.player.tick(secs(0.5), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.player.current_position(), 25.0);

        assert!(r.player.toggle_pause(&tx));
        r.player.tick(secs(50.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.player.current_position(), 25.0, "paused glide must not advance");
        let _ = rx.try_iter().count();

        // Resume re-announces only the remaining 1.5s leg
        assert!(r.player.toggle_pause(&tx));
        assert!(rx.try_iter().any(|e| matches!(
            e,
            EngineEvent::ScrollAnimationRequested { start, duration_secs, .. }
                if start == 25.0 && duration_secs == 1.5
        )));

        r.player.tick(secs(100.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        r.player.tick(secs(101.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.player.current_position(), 75.0, "elapsed glide time not preserved");
        r.player.tick(secs(101.5), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.player.current_position(), 100.0);
        assert_eq!(r.player.state(), PlaybackState::Playing);
    }

    #[test]
    fn redirect_while_paused_defers_animation_to_resume() {
        let mut r = rig(&[100.0, 400.0, 900.0]);
        let (tx, rx) = events::channel();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(1.0, 5.0, -1))
            .unwrap();

        // Finish the initial glide, then pause during the dwell
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        r.player.tick(secs(1.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert!(r.player.toggle_pause(&tx));
        let _ = rx.try_iter().count();

        let target = r.nav.step_next(&r.set).unwrap();
        r.player
            .redirect(target, &r.set, &mut r.store, &mut r.surface, &tx)
            .unwrap();
        assert!(
            !rx.try_iter().any(|e| matches!(e, EngineEvent::ScrollAnimationRequested { .. })),
            "a paused redirect must not start a UI animation"
        );

        assert!(r.player.toggle_pause(&tx));
        let requests: Vec<EngineEvent> = rx
            .try_iter()
            .filter(|e| matches!(e, EngineEvent::ScrollAnimationRequested { .. }))
            .collect();
        assert_eq!(requests.len(), 1, "resume announces the pending glide exactly once");
        assert!(matches!(
            &requests[0],
            EngineEvent::ScrollAnimationRequested { end, .. } if *end == 400.0
        ));
    }

    #[test]
    fn stop_freezes_position_mid_glide() {
        let mut r = rig(&[100.0, 900.0]);
        let (tx, rx) = events::channel();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(2.0, 1.0, -1))
            .unwrap();

        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        r.player.tick(secs(0.5), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        let frozen = r.player.current_position();
        assert!(frozen > 0.0 && frozen < 100.0);

        r.player.stop(&tx);
        assert_eq!(r.player.state(), PlaybackState::Idle);
        let evs: Vec<EngineEvent> = rx.try_iter().collect();
        assert!(evs.contains(&EngineEvent::ScrollAnimationCancelRequested));
        assert!(evs.contains(&EngineEvent::PlayingStateChanged(false)));

        // No further offsets after stop
        let writes = r.surface.offsets.len();
        r.player.tick(secs(5.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        assert_eq!(r.surface.offsets.len(), writes);
        assert_eq!(r.player.current_position(), frozen);
    }

    #[test]
    fn recording_toggles_only_from_idle() {
        let mut p = PlaybackEngine::new();
        assert!(p.begin_recording());
        assert_eq!(p.state(), PlaybackState::Recording);
        assert!(!p.begin_recording());
        assert!(p.end_recording());
        assert_eq!(p.state(), PlaybackState::Idle);
        assert!(!p.end_recording());
    }

    #[test]
    fn redirect_corrects_departed_dwell_and_reanimates() {
        // P4 at the player level (engine-level test covers the full route)
        let mut r = rig(&[100.0, 400.0, 900.0]);
        let kf0 = r.set.get(0).unwrap().id;
        r.store.set_timing(kf0, 10.0).unwrap();
        let tx = EventSender::dummy();
        r.player
            .start(&r.set, &mut r.nav, &r.store, &mut r.surface, &tx, &settings(0.0, 1.0, -1))
            .unwrap();

        // Dwell ~3s of the recorded 10s, then a manual next arrives
        r.player.tick(secs(0.0), &r.set, &mut r.nav, &r.store, &mut r.surface, &tx).unwrap();
        run_until(&mut r, &tx, 0.0, 3.0);
        assert_eq!(r.nav.current_index(), 0);

        let target = r.nav.step_next(&r.set).unwrap();
        r.player
            .redirect(target, &r.set, &mut r.store, &mut r.surface, &tx)
            .unwrap();

        let corrected = r.store.get_timing(kf0).unwrap().unwrap();
        assert!((corrected - 3.0).abs() < 0.11, "corrected to {}", corrected);
        // Loop keeps running at the new keyframe, still Playing
        assert_eq!(r.player.state(), PlaybackState::Playing);
        assert_eq!(r.nav.current_index(), 1);

        // A second rapid override must not touch kf0 again
        let target = r.nav.step_next(&r.set).unwrap();
        r.player
            .redirect(target, &r.set, &mut r.store, &mut r.surface, &tx)
            .unwrap();
        assert_eq!(r.store.get_timing(kf0).unwrap().unwrap(), corrected);
    }
}
