//! Entities module - data model and infrastructure seams
//!
//! Everything the core engine persists or talks to lives here: the
//! keyframe data model, the store contract with its two implementations,
//! and the scroll-surface/clock traits the UI side implements.

pub mod json_store;
pub mod keyframe;
pub mod store;
pub mod traits;

pub use json_store::JsonKeyframeStore;
pub use keyframe::{Keyframe, KeyframeSet, TimingRecord};
pub use store::{AddOutcome, KeyframeStore, MemoryKeyframeStore, StoreError};
pub use traits::{Clock, ManualClock, ScrollSurface, SystemClock};
