// curves/easing.rs
//
// Pure easing functions for tween interpolation.
// No dependencies on tweens or targets, just math.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TweenError;

/// Inputs closer than this to 0 or 1 snap to the boundary for Expo and Elastic.
const BOUNDARY_EPSILON: f32 = 1e-6;

const C1: f32 = 1.70158;
const C2: f32 = C1 * 1.525;
const C3: f32 = C1 + 1.0;
const C4: f32 = (2.0 * PI) / 3.0;
const C5: f32 = (2.0 * PI) / 4.5;

/// Easing curve applied to normalized tween time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Constant velocity (no easing).
    #[default]
    Linear,
    // Sine wave easing (smooth).
    InSine,
    OutSine,
    InOutSine,
    // Quadratic.
    InQuad,
    OutQuad,
    InOutQuad,
    // Cubic.
    InCubic,
    OutCubic,
    InOutCubic,
    // Quartic.
    InQuart,
    OutQuart,
    InOutQuart,
    // Quintic.
    InQuint,
    OutQuint,
    InOutQuint,
    // Exponential (dramatic).
    InExpo,
    OutExpo,
    InOutExpo,
    // Circular.
    InCirc,
    OutCirc,
    InOutCirc,
    /// Pull back before moving in.
    InBack,
    /// Overshoot then settle.
    OutBack,
    InOutBack,
    // Elastic spring.
    InElastic,
    OutElastic,
    InOutElastic,
    // Bouncy.
    InBounce,
    OutBounce,
    InOutBounce,
}

impl Easing {
    /// Every curve, in declaration order.
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::InSine,
        Easing::OutSine,
        Easing::InOutSine,
        Easing::InQuad,
        Easing::OutQuad,
        Easing::InOutQuad,
        Easing::InCubic,
        Easing::OutCubic,
        Easing::InOutCubic,
        Easing::InQuart,
        Easing::OutQuart,
        Easing::InOutQuart,
        Easing::InQuint,
        Easing::OutQuint,
        Easing::InOutQuint,
        Easing::InExpo,
        Easing::OutExpo,
        Easing::InOutExpo,
        Easing::InCirc,
        Easing::OutCirc,
        Easing::InOutCirc,
        Easing::InBack,
        Easing::OutBack,
        Easing::InOutBack,
        Easing::InElastic,
        Easing::OutElastic,
        Easing::InOutElastic,
        Easing::InBounce,
        Easing::OutBounce,
        Easing::InOutBounce,
    ];

    /// Apply the easing function to a normalized time value `x` in [0, 1].
    ///
    /// Input outside [0, 1] is clamped. The endpoints map exactly to 0 and 1;
    /// Back and Elastic curves may leave [0, 1] in between.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 {
            return 0.0;
        }
        if x == 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => x,

            // Sine
            Easing::InSine => 1.0 - (x * PI / 2.0).cos(),
            Easing::OutSine => (x * PI / 2.0).sin(),
            Easing::InOutSine => -((PI * x).cos() - 1.0) / 2.0,

            // Quadratic
            Easing::InQuad => x * x,
            Easing::OutQuad => 1.0 - (1.0 - x) * (1.0 - x),
            Easing::InOutQuad => {
                if x < 0.5 {
                    2.0 * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
                }
            }

            // Cubic
            Easing::InCubic => x * x * x,
            Easing::OutCubic => 1.0 - (1.0 - x).powi(3),
            Easing::InOutCubic => {
                if x < 0.5 {
                    4.0 * x * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
                }
            }

            // Quartic
            Easing::InQuart => x * x * x * x,
            Easing::OutQuart => 1.0 - (1.0 - x).powi(4),
            Easing::InOutQuart => {
                if x < 0.5 {
                    8.0 * x * x * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(4) / 2.0
                }
            }

            // Quintic
            Easing::InQuint => x.powi(5),
            Easing::OutQuint => 1.0 - (1.0 - x).powi(5),
            Easing::InOutQuint => {
                if x < 0.5 {
                    16.0 * x.powi(5)
                } else {
                    // Exponent 6 on the out phase is the shipped curve; the
                    // symmetric form would use 5. See DESIGN.md.
                    1.0 - (-2.0 * x + 2.0).powi(6) / 2.0
                }
            }

            // Exponential
            Easing::InExpo => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else {
                    2.0_f32.powf(10.0 * x - 10.0)
                }
            }
            Easing::OutExpo => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * x)
                }
            }
            Easing::InOutExpo => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else if x < 0.5 {
                    2.0_f32.powf(20.0 * x - 10.0) / 2.0
                } else {
                    (2.0 - 2.0_f32.powf(-20.0 * x + 10.0)) / 2.0
                }
            }

            // Circular
            Easing::InCirc => 1.0 - (1.0 - x * x).max(0.0).sqrt(),
            Easing::OutCirc => (1.0 - (x - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::InOutCirc => {
                if x < 0.5 {
                    (1.0 - (1.0 - (2.0 * x).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * x + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }

            // Back (overshoot)
            Easing::InBack => C3 * x * x * x - C1 * x * x,
            Easing::OutBack => 1.0 + C3 * (x - 1.0).powi(3) + C1 * (x - 1.0).powi(2),
            Easing::InOutBack => {
                if x < 0.5 {
                    (2.0 * x).powi(2) * ((C2 + 1.0) * 2.0 * x - C2) / 2.0
                } else {
                    ((2.0 * x - 2.0).powi(2) * ((C2 + 1.0) * (x * 2.0 - 2.0) + C2) + 2.0) / 2.0
                }
            }

            // Elastic
            Easing::InElastic => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else {
                    -(2.0_f32.powf(10.0 * x - 10.0)) * ((x * 10.0 - 10.75) * C4).sin()
                }
            }
            Easing::OutElastic => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else {
                    2.0_f32.powf(-10.0 * x) * ((x * 10.0 - 0.75) * C4).sin() + 1.0
                }
            }
            Easing::InOutElastic => {
                if near_zero(x) {
                    0.0
                } else if near_one(x) {
                    1.0
                } else if x < 0.5 {
                    -(2.0_f32.powf(20.0 * x - 10.0) * ((20.0 * x - 11.125) * C5).sin()) / 2.0
                } else {
                    2.0_f32.powf(-20.0 * x + 10.0) * ((20.0 * x - 11.125) * C5).sin() / 2.0 + 1.0
                }
            }

            // Bounce
            Easing::InBounce => 1.0 - out_bounce(1.0 - x),
            Easing::OutBounce => out_bounce(x),
            Easing::InOutBounce => {
                if x < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * x)) / 2.0
                } else {
                    (1.0 + out_bounce(2.0 * x - 1.0)) / 2.0
                }
            }
        }
    }

    /// Canonical name, as accepted by `FromStr` and serde.
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::InSine => "InSine",
            Easing::OutSine => "OutSine",
            Easing::InOutSine => "InOutSine",
            Easing::InQuad => "InQuad",
            Easing::OutQuad => "OutQuad",
            Easing::InOutQuad => "InOutQuad",
            Easing::InCubic => "InCubic",
            Easing::OutCubic => "OutCubic",
            Easing::InOutCubic => "InOutCubic",
            Easing::InQuart => "InQuart",
            Easing::OutQuart => "OutQuart",
            Easing::InOutQuart => "InOutQuart",
            Easing::InQuint => "InQuint",
            Easing::OutQuint => "OutQuint",
            Easing::InOutQuint => "InOutQuint",
            Easing::InExpo => "InExpo",
            Easing::OutExpo => "OutExpo",
            Easing::InOutExpo => "InOutExpo",
            Easing::InCirc => "InCirc",
            Easing::OutCirc => "OutCirc",
            Easing::InOutCirc => "InOutCirc",
            Easing::InBack => "InBack",
            Easing::OutBack => "OutBack",
            Easing::InOutBack => "InOutBack",
            Easing::InElastic => "InElastic",
            Easing::OutElastic => "OutElastic",
            Easing::InOutElastic => "InOutElastic",
            Easing::InBounce => "InBounce",
            Easing::OutBounce => "OutBounce",
            Easing::InOutBounce => "InOutBounce",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = TweenError;

    /// Case-insensitive; underscores and dashes are ignored (`in_out_quad`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Easing::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| TweenError::UnknownEasing(s.to_string()))
    }
}

pub(crate) fn normalize_name(s: &str) -> String {
    s.chars().filter(|c| *c != '_' && *c != '-' && !c.is_whitespace()).collect()
}

#[inline]
fn near_zero(x: f32) -> bool {
    x.abs() < BOUNDARY_EPSILON
}

#[inline]
fn near_one(x: f32) -> bool {
    (1.0 - x).abs() < BOUNDARY_EPSILON
}

#[inline]
fn out_bounce(x: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if x < 1.0 / D1 {
        N1 * x * x
    } else if x < 2.0 / D1 {
        let x = x - 1.5 / D1;
        N1 * x * x + 0.75
    } else if x < 2.5 / D1 {
        let x = x - 2.25 / D1;
        N1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / D1;
        N1 * x * x + 0.984375
    }
}

// ── Interpolation helpers ────────────────────────────────────────────────

/// Linearly interpolate between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate with easing.
#[inline]
pub fn ease(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    lerp(a, b, easing.apply(t))
}
