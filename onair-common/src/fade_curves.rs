//! Gain ramp curves
//!
//! Ducking and station switching move a bus gain from one level to another
//! over a fixed window. The curve decides the shape of that move.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Shape of a gain ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FadeCurve {
    /// Constant rate of change: p(t) = t
    #[default]
    Linear,

    /// Smooth start and finish: p(t) = 0.5 × (1 - cos(π × t))
    SCurve,

    /// Fast start, gentle landing: p(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Progress (0.0 to 1.0) through a ramp at normalized `position`
    pub fn progress(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Gain at `position` on a ramp from `from` to `to`
    pub fn interpolate(&self, from: f32, to: f32, position: f32) -> f32 {
        from + (to - from) * self.progress(position)
    }}
