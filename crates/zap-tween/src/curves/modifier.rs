// curves/modifier.rs
//
// Time modifiers remap normalized tween time before the easing curve runs:
//   raw t → Modifier → Easing → driver

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::easing::normalize_name;
use crate::error::TweenError;

/// Remapping of normalized time. Output always stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Modifier {
    /// Identity.
    #[default]
    None,
    /// Play backwards: `1 - x`.
    Reverse,
    /// Ping-pong inside one iteration: out to 1 at the half, back to 0.
    Yoyo,
    /// `|sin(πx)|`, a smooth out-and-back.
    AbsSin,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [Modifier::None, Modifier::Reverse, Modifier::Yoyo, Modifier::AbsSin];

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Modifier::None => x,
            Modifier::Reverse => 1.0 - x,
            Modifier::Yoyo => {
                if x < 0.5 {
                    x * 2.0
                } else {
                    (1.0 - x) * 2.0
                }
            }
            Modifier::AbsSin => (PI * x).sin().abs().min(1.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::None => "None",
            Modifier::Reverse => "Reverse",
            Modifier::Yoyo => "Yoyo",
            Modifier::AbsSin => "AbsSin",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modifier {
    type Err = TweenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Modifier::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| TweenError::UnknownModifier(s.to_string()))
    }
}
