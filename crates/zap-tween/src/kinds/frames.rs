//! Frame tween: steps through a list of discrete frames.
//!
//! The eased value picks the frame, so a sprite sequence can be played with
//! any curve, looped or ping-ponged like any other tween.

use std::rc::Rc;

use super::binding::Binding;
use crate::core::tween::{Deferred, TweenDriver};

/// Atlas cells of a horizontal strip (consecutive columns, same row).
pub fn horizontal_strip(row: f32, start_col: f32, frame_count: u32) -> Vec<(f32, f32)> {
    (0..frame_count)
        .map(|i| (start_col + i as f32, row))
        .collect()
}

/// Atlas cells of a vertical strip (consecutive rows, same column).
pub fn vertical_strip(col: f32, start_row: f32, frame_count: u32) -> Vec<(f32, f32)> {
    (0..frame_count)
        .map(|i| (col, start_row + i as f32))
        .collect()
}

/// Duration that shows `frame_count` frames at `fps`.
pub fn strip_duration(frame_count: usize, fps: f32) -> f32 {
    frame_count as f32 / fps
}

/// Frame index for eased value `v`: each frame owns an equal slice of
/// [0, 1), the last one also owns 1.
pub(crate) fn frame_index(v: f32, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let scaled = (v.clamp(0.0, 1.0) * count as f32).floor() as usize;
    scaled.min(count - 1)
}

pub(crate) struct FrameDriver<F: Clone + 'static> {
    target: Binding<F>,
    frames: Rc<[F]>,
    shown: Option<usize>,
}

impl<F: Clone + 'static> FrameDriver<F> {
    pub fn new(target: Binding<F>, frames: Vec<F>) -> Self {
        Self {
            target,
            frames: frames.into(),
            shown: None,
        }
    }
}

impl<F: Clone + 'static> TweenDriver for FrameDriver<F> {
    fn kind(&self) -> &'static str {
        "frames"
    }

    fn evaluate(&mut self, v: f32) -> Vec<Deferred> {
        if self.frames.is_empty() {
            return Vec::new();
        }
        let index = frame_index(v, self.frames.len());
        if self.shown == Some(index) {
            return Vec::new();
        }
        if self.target.set(self.frames[index].clone()) {
            self.shown = Some(index);
        } else {
            log::trace!("frame target gone; frame {} skipped", index);
        }
        Vec::new()
    }

    fn clone_driver(&self) -> Box<dyn TweenDriver> {
        Box::new(FrameDriver {
            target: self.target.clone(),
            frames: self.frames.clone(),
            shown: None,
        })
    }
}
