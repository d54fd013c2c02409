pub mod group;
pub mod scheduler;

pub use group::{GroupKey, Replace};
pub use scheduler::Tweener;
