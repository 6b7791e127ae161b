//! Core engine modules - cache, events, navigation, timing, playback
//!
//! These modules form the keyframe engine, independent of UI.

pub mod cache;
pub mod easing;
pub mod engine;
pub mod events;
pub mod navigator;
pub mod player;
pub mod recorder;
pub mod settings;

// Re-exports for convenience
pub use cache::{CacheStats, KeyframeCache};
pub use easing::Easing;
pub use engine::{EngineError, KeyframeEngine};
pub use events::{EngineEvent, EventSender};
pub use navigator::{KeyframeNavigator, NavTarget, NO_SELECTION};
pub use player::{PlaybackEngine, PlaybackState};
pub use recorder::TimingRecorder;
pub use settings::EngineSettings;
