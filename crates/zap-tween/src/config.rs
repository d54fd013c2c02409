use serde::{Deserialize, Serialize};

use crate::core::state::LoopMode;
use crate::curves::{Easing, Modifier};
use crate::error::TweenError;

/// Engine-wide defaults, provided by the game.
/// Loadable from JSON; every field is optional there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenerConfig {
    /// Easing given to new tweens (default: Linear).
    pub default_easing: Easing,
    /// Modifier given to new tweens (default: None).
    pub default_modifier: Modifier,
    /// Loop mode given to new tweens (default: Restart).
    pub default_loop_mode: LoopMode,
    /// Initial value of the global time-scale channel (default: 1.0).
    pub time_scale: f32,
    /// Upper bound on a single tick's delta in seconds, to survive frame
    /// spikes. Zero or negative disables the cap (default: 0.0).
    pub max_delta: f32,
    /// Pre-allocated slots for live tweens (default: 64).
    pub capacity: usize,
}

impl Default for TweenerConfig {
    fn default() -> Self {
        Self {
            default_easing: Easing::Linear,
            default_modifier: Modifier::None,
            default_loop_mode: LoopMode::Restart,
            time_scale: 1.0,
            max_delta: 0.0,
            capacity: 64,
        }
    }
}

impl TweenerConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TweenError> {
        let config: TweenerConfig = serde_json::from_str(json)?;
        if !config.time_scale.is_finite() || config.time_scale < 0.0 {
            return Err(TweenError::InvalidConfig(format!(
                "time_scale must be a non-negative number, got {}",
                config.time_scale
            )));
        }
        Ok(config)
    }

    /// Clamp a raw frame delta: negatives and non-finite values become 0,
    /// large values are capped at `max_delta`.
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        if self.max_delta > 0.0 {
            dt.min(self.max_delta)
        } else {
            dt
        }
    }
}
