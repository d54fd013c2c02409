pub mod state;
pub mod time_scale;
pub mod tween;

pub use state::{LoopMode, Outcome, TweenSettings, TweenState};
pub use time_scale::{FixedTimeScale, ProxyTimeScale, TimeScaleProvider};
pub use tween::{Callback, Tween, TweenId};
