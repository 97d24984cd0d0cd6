//! Easing functions for animation timing.
//!
//! An easing maps a linear progression (0.0 to 1.0) to an eased output value.
//! Curves that overshoot take an `elasticity` parameter in [0, 1]; the other
//! curves ignore it.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Easing function applied to a tween's progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// No easing.
    Linear,
    /// Quadratic acceleration from zero.
    InQuad,
    /// Quadratic deceleration to zero.
    OutQuad,
    /// Quadratic acceleration then deceleration.
    InOutQuad,
    /// Cubic deceleration to zero.
    OutCubic,
    /// Exponentially decaying spring past the end value. `elasticity`
    /// shortens the oscillation period, adding wobble.
    OutElastic,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::OutElastic
    }
}

impl Easing {
    /// Evaluate the easing at the given progression.
    ///
    /// The input is clamped to [0, 1]; the output may overshoot that range
    /// for the elastic curve.
    pub fn evaluate(&self, progression: f64, elasticity: f64) -> f64 {
        let t = progression.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => t * (2.0 - t),
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::OutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::OutElastic => out_elastic(t, elasticity),
        }
    }

    /// Name used in logs and loaders.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::InQuad => "in_quad",
            Easing::OutQuad => "out_quad",
            Easing::InOutQuad => "in_out_quad",
            Easing::OutCubic => "out_cubic",
            Easing::OutElastic => "out_elastic",
        }
    }
}

fn out_elastic(t: f64, elasticity: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    // Higher elasticity shrinks the period, which raises the number of
    // oscillations before the curve settles.
    let period = 1.0 - 0.6 * elasticity.clamp(0.0, 1.0);
    let decay = (2.0f64).powf(-10.0 * t);
    decay * ((t - period / 4.0) * TAU / period).sin() + 1.0
}
