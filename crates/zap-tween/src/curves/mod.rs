//! Pure curve math: easing curves and time modifiers.

pub mod easing;
pub mod modifier;

pub use easing::{ease, lerp, Easing};
pub use modifier::Modifier;
