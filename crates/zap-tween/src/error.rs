//! Errors raised while configuring tweens, sequences and the engine.

use thiserror::Error;

use crate::core::state::TweenState;
use crate::core::tween::TweenId;

/// Configuration-time failure. Runtime ticking never produces errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// Duration must be positive and finite.
    #[error("invalid duration {0}: must be positive and finite")]
    InvalidDuration(f32),

    /// Delay must be non-negative and finite.
    #[error("invalid delay {0}: must be non-negative and finite")]
    InvalidDelay(f32),

    /// Sequence offsets and intervals must be non-negative and finite.
    #[error("invalid sequence offset {0}")]
    InvalidOffset(f32),

    /// A frame tween needs at least one frame.
    #[error("frame tween has no frames")]
    EmptyFrames,

    /// The bound target was dropped before the tween could read it.
    #[error("tween {0} target is no longer alive")]
    StaleTarget(TweenId),

    /// Configuration is frozen once the tween left `Idle`.
    #[error("tween {id} is {state:?} and can no longer be modified")]
    Locked { id: TweenId, state: TweenState },

    /// The tween belongs to a sequence and is driven by it.
    #[error("tween {0} is owned by a sequence and cannot be played directly")]
    Nested(TweenId),

    /// Sequences cannot hold infinitely looping children.
    #[error("tween {0} loops forever and cannot be placed in a sequence")]
    InfiniteChild(TweenId),

    /// Only idle, unowned tweens can be added to a sequence.
    #[error("tween {0} is not idle or already belongs to a sequence")]
    ChildNotIdle(TweenId),

    /// A curve name that no `Easing` variant matches.
    #[error("unknown easing '{0}'")]
    UnknownEasing(String),

    /// A modifier name that no `Modifier` variant matches.
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    /// Engine configuration could not be parsed.
    #[error("invalid tweener config: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for TweenError {
    fn from(err: serde_json::Error) -> Self {
        TweenError::InvalidConfig(err.to_string())
    }
}
