//! Engine notification events.
//!
//! The engine never touches a UI toolkit; everything the presentation
//! layer needs to know arrives as `EngineEvent`s over a channel. The
//! sender wrapper is silent when no receiver is attached, so headless
//! and test setups can run the engine without draining events.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::easing::Easing;

/// Discrete notifications produced by the engine toward presentation code.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Recording pass started (true) or ended (false)
    RecordingStateChanged(bool),
    /// Playback started (true) or stopped (false)
    PlayingStateChanged(bool),
    /// Playback ran out of its repeat budget
    PlayFinished { completed_count: u32 },
    /// The navigator landed on a keyframe (manual step, jump, or playback)
    CurrentKeyframeChanged { index: usize, y_position: f32 },
    /// A scroll glide should be visualized from `start` to `end`
    ScrollAnimationRequested {
        start: f32,
        end: f32,
        duration_secs: f64,
        easing: Easing,
    },
    /// Any in-flight scroll glide should stop where it is
    ScrollAnimationCancelRequested,
    /// Transient user-facing status message (no-data, too-close, store failure)
    Status(String),
}

/// Event sender handed to the engine.
///
/// Holds an optional channel sender; `dummy()` produces a no-op sender for
/// tests and for construction before the presentation side is wired up.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    sender: Option<Sender<EngineEvent>>,
}

impl EventSender {
    pub fn new(sender: Sender<EngineEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    /// No-op sender (events are dropped).
    pub fn dummy() -> Self {
        Self { sender: None }
    }

    /// Emit event (silent if no receiver).
    pub fn emit(&self, event: EngineEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event); // Receiver may be gone; ignore
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (EventSender, Receiver<EngineEvent>) {
    let (tx, rx) = unbounded();
    (EventSender::new(tx), rx)
}
