//! SCROLLA - Keyframe scroll recorder/player library
//!
//! Records named scroll positions ("keyframes") inside long images,
//! captures per-keyframe dwell timing from a manual playthrough, and
//! replays the sequence with eased scroll glides. The engine is
//! UI-agnostic: it drives an abstract scroll surface and reports state
//! through typed events.

// Core engine (cache, easing, navigation, recording, playback)
pub mod core;

// Data model and infrastructure seams
pub mod entities;

// CLI args for the headless player binary
pub mod cli;

// Re-export commonly used types from core
pub use core::engine::{EngineError, KeyframeEngine};
pub use core::events::{EngineEvent, EventSender};
pub use core::easing::Easing;
pub use core::player::PlaybackState;
pub use core::settings::EngineSettings;

// Re-export entities
pub use entities::{
    AddOutcome, Clock, JsonKeyframeStore, Keyframe, KeyframeSet, KeyframeStore,
    MemoryKeyframeStore, ScrollSurface, StoreError, SystemClock, TimingRecord,
};
