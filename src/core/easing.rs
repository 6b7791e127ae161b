//! Easing curve library - pure progress remapping for scroll glides.
//!
//! All curves map `t` in [0, 1] to eased progress in [0, 1], with exact
//! endpoints. The curve set is a closed enum rather than string dispatch;
//! `from_name` keeps the historical string spellings working (persisted
//! settings may carry them) and falls back to `Linear` for anything
//! unknown.

use log::debug;
use serde::{Deserialize, Serialize};

/// Cubic bezier control points for the `Bezier` curve - a gentle
/// ease-in-out with a softer start (same shape as the CSS `ease` keyword).
const BEZIER_PTS: (f32, f32, f32, f32) = (0.25, 0.1, 0.25, 1.0);

/// Control points matching the CSS `ease-in-out` timing function.
const CSS_EASE_IN_OUT_PTS: (f32, f32, f32, f32) = (0.42, 0.0, 0.58, 1.0);

/// Named animation curves for keyframe-to-keyframe scroll glides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Identity - constant scroll speed
    #[default]
    Linear,
    /// Cubic ease-in-out, fast through the middle
    OptimizedCubic,
    /// Exponential deceleration to the target
    EaseOutExpo,
    /// Fixed-control-point cubic bezier, smooth ease-in-out
    Bezier,
    /// The CSS `ease-in-out` timing function
    CssEaseInOut,
}

impl Easing {
    /// Parse a persisted curve name. Unknown names fall back to `Linear`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "linear" => Easing::Linear,
            "optimizedcubic" | "cubic" => Easing::OptimizedCubic,
            "easeoutexpo" | "expo" => Easing::EaseOutExpo,
            "bezier" => Easing::Bezier,
            "csseaseinout" | "ease-in-out" => Easing::CssEaseInOut,
            other => {
                debug!("Unknown easing '{}', falling back to Linear", other);
                Easing::Linear
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::OptimizedCubic => "optimizedcubic",
            Easing::EaseOutExpo => "easeoutexpo",
            Easing::Bezier => "bezier",
            Easing::CssEaseInOut => "csseaseinout",
        }
    }

    /// Remap linear progress `t` in [0, 1] to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OptimizedCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            Easing::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - (2.0_f32).powf(-10.0 * t)
                }
            }
            Easing::Bezier => {
                let (x1, y1, x2, y2) = BEZIER_PTS;
                CubicBezier::new(x1, y1, x2, y2).solve(t)
            }
            Easing::CssEaseInOut => {
                let (x1, y1, x2, y2) = CSS_EASE_IN_OUT_PTS;
                CubicBezier::new(x1, y1, x2, y2).solve(t)
            }
        }
    }
}

/// Sample the scroll position `elapsed_secs` into a glide.
///
/// `duration_secs <= 0` means an instant cut: the target is applied
/// immediately with no interpolation (used when redirecting after a
/// manual override).
pub fn sample(easing: Easing, start: f32, end: f32, duration_secs: f64, elapsed_secs: f64) -> f32 {
    if duration_secs <= 0.0 {
        return end;
    }
    let t = (elapsed_secs / duration_secs).clamp(0.0, 1.0) as f32;
    start + (end - start) * easing.apply(t)
}

/// Cubic bezier timing function with endpoints (0,0) and (1,1).
///
/// Solved the way browsers do: Horner-form polynomial evaluation, Newton
/// iteration on the x axis, bisection fallback when the derivative gets
/// too flat near the ends.
struct CubicBezier {
    ax: f32,
    bx: f32,
    cx: f32,
    ay: f32,
    by: f32,
    cy: f32,
}

impl CubicBezier {
    const NEWTON_ITERATIONS: usize = 8;
    const EPSILON: f32 = 1e-6;

    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self { ax, bx, cx, ay, by, cy }
    }

    fn sample_x(&self, u: f32) -> f32 {
        ((self.ax * u + self.bx) * u + self.cx) * u
    }

    fn sample_y(&self, u: f32) -> f32 {
        ((self.ay * u + self.by) * u + self.cy) * u
    }

    fn sample_dx(&self, u: f32) -> f32 {
        (3.0 * self.ax * u + 2.0 * self.bx) * u + self.cx
    }

    /// Find curve parameter for a given x, then evaluate y there.
    fn solve(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        // Newton-Raphson, usually converges in 2-3 iterations
        let mut u = x;
        for _ in 0..Self::NEWTON_ITERATIONS {
            let err = self.sample_x(u) - x;
            if err.abs() < Self::EPSILON {
                return self.sample_y(u);
            }
            let dx = self.sample_dx(u);
            if dx.abs() < Self::EPSILON {
                break;
            }
            u -= err / dx;
        }

        // Bisection fallback for flat-derivative regions
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        u = x;
        while hi - lo > Self::EPSILON {
            if self.sample_x(u) < x {
                lo = u;
            } else {
                hi = u;
            }
            u = (lo + hi) / 2.0;
        }
        self.sample_y(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::OptimizedCubic,
        Easing::EaseOutExpo,
        Easing::Bezier,
        Easing::CssEaseInOut,
    ];

    #[test]
    fn endpoints_are_exact() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{:?} at 0", e);
            assert_eq!(e.apply(1.0), 1.0, "{:?} at 1", e);
        }
    }

    #[test]
    fn curves_are_monotonic_and_bounded() {
        for e in ALL {
            let mut prev = 0.0;
            for i in 0..=100 {
                let v = e.apply(i as f32 / 100.0);
                assert!((0.0..=1.0).contains(&v), "{:?} out of range: {}", e, v);
                assert!(v >= prev - 1e-4, "{:?} not monotonic at step {}", e, i);
                prev = v;
            }
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        for e in ALL {
            assert_eq!(e.apply(-0.5), 0.0);
            assert_eq!(e.apply(1.5), 1.0);
        }
    }

    #[test]
    fn css_ease_in_out_is_symmetric_at_midpoint() {
        let mid = Easing::CssEaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 1e-3, "midpoint was {}", mid);
    }

    #[test]
    fn cubic_matches_closed_form() {
        assert!((Easing::OptimizedCubic.apply(0.25) - 0.0625).abs() < 1e-6);
        assert!((Easing::OptimizedCubic.apply(0.75) - 0.9375).abs() < 1e-6);
    }

    #[test]
    fn unknown_name_falls_back_to_linear() {
        assert_eq!(Easing::from_name("bounce"), Easing::Linear);
        assert_eq!(Easing::from_name(""), Easing::Linear);
    }

    #[test]
    fn names_roundtrip() {
        for e in ALL {
            assert_eq!(Easing::from_name(e.name()), e);
        }
    }

    #[test]
    fn sample_interpolates_between_positions() {
        let half = sample(Easing::Linear, 100.0, 300.0, 2.0, 1.0);
        assert_eq!(half, 200.0);
        assert_eq!(sample(Easing::Linear, 100.0, 300.0, 2.0, 5.0), 300.0);
    }

    #[test]
    fn zero_duration_is_an_instant_cut() {
        assert_eq!(sample(Easing::CssEaseInOut, 100.0, 900.0, 0.0, 0.0), 900.0);
        assert_eq!(sample(Easing::Linear, 100.0, 900.0, -1.0, 0.0), 900.0);
    }
}
