pub mod api;
pub mod config;
pub mod core;
pub mod curves;
pub mod error;
pub mod kinds;
pub mod systems;

// Re-export key types at crate root for convenience
pub use config::TweenerConfig;
pub use error::TweenError;
pub use systems::scheduler::Tweener;
pub use systems::group::{GroupKey, Replace};
pub use crate::core::state::{LoopMode, Outcome, TweenSettings, TweenState};
pub use crate::core::time_scale::{FixedTimeScale, ProxyTimeScale, TimeScaleProvider};
pub use crate::core::tween::{Callback, Tween, TweenId};
pub use curves::{ease, lerp, Easing, Modifier};
pub use kinds::binding::Binding;
pub use kinds::sequence::Sequence;
pub use kinds::typed::{EndValue, StartValue};
pub use kinds::value::{AxisMask, Color, Tweenable};
pub use kinds::frames::{horizontal_strip, vertical_strip, strip_duration};
