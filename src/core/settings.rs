//! Engine configuration knobs.
//!
//! Persisted as part of application settings (serde), so field names are
//! stable. Defaults match the behavior users expect out of the box: a
//! short eased glide between keyframes, a few seconds of dwell when no
//! timing was recorded, infinite looping.

use serde::{Deserialize, Serialize};

use crate::core::easing::Easing;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Minimum pixel distance between sibling keyframes; adds inside this
    /// tolerance of an existing keyframe are rejected.
    pub min_distance_px: f32,
    /// Dwell time used for keyframes without a recorded duration. Also the
    /// floor for recorded durations at playback time.
    pub default_dwell_secs: f64,
    /// Visual scroll-glide time between consecutive keyframes. Independent
    /// of recorded dwell durations. Zero means instant cuts.
    pub transition_secs: f64,
    /// Easing curve for the glide.
    pub easing: Easing,
    /// Full passes through the keyframe sequence: -1 = loop forever,
    /// otherwise a finite budget.
    pub play_repeat_count: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_distance_px: 20.0,
            default_dwell_secs: 3.0,
            transition_secs: 0.8,
            easing: Easing::CssEaseInOut,
            play_repeat_count: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{ "transition_secs": 0.0 }"#).unwrap();
        assert_eq!(s.transition_secs, 0.0);
        assert_eq!(s.min_distance_px, 20.0);
        assert_eq!(s.easing, Easing::CssEaseInOut);
        assert_eq!(s.play_repeat_count, -1);
    }
}
