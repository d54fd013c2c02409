// kinds/mod.rs
//
// Concrete tween kinds. Each implements the crate-private driver interface
// behind `Tween`; games only see the factories on `Tweener` and the value
// types below.

pub mod binding;
pub mod frames;
pub mod sequence;
pub mod shake;
pub mod typed;
pub mod value;

pub use binding::Binding;
pub use frames::{horizontal_strip, strip_duration, vertical_strip};
pub use sequence::Sequence;
pub use typed::{EndValue, StartValue};
pub use value::{AxisMask, Color, Tweenable};
