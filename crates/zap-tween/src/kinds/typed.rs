// kinds/typed.rs
//
// Typed value tween: lerps a Tweenable from Start to End and writes it
// through a Binding. Dynamic start/end values are captured at play time.

use super::binding::Binding;
use super::value::{AxisMask, Tweenable};
use crate::core::tween::{Deferred, TweenDriver, TweenId};
use crate::error::TweenError;

/// Where a typed tween starts.
#[derive(Debug, Clone)]
pub enum StartValue<T> {
    Fixed(T),
    /// Read from the target when the tween is played.
    Current,
}

/// Where a typed tween ends.
#[derive(Debug, Clone)]
pub enum EndValue<T> {
    Fixed(T),
    /// Read from the target when the tween is played.
    Current,
    /// Start plus this offset.
    Delta(T),
    /// Read from another binding on every evaluation, so the destination
    /// may itself be moving.
    Reference(Binding<T>),
}

pub(crate) struct ValueDriver<T: Tweenable> {
    target: Binding<T>,
    start: StartValue<T>,
    end: EndValue<T>,
    mask: AxisMask,
    /// (start, end) captured at play; `end` is the last known reference value.
    resolved: Option<(T, T)>,
}

impl<T: Tweenable> ValueDriver<T> {
    pub fn new(target: Binding<T>, start: StartValue<T>, end: EndValue<T>) -> Self {
        Self {
            target,
            start,
            end,
            mask: AxisMask::ALL,
            resolved: None,
        }
    }

    fn copy(&self, resolved: Option<(T, T)>) -> Self {
        Self {
            target: self.target.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
            mask: self.mask,
            resolved,
        }
    }

    fn current(&self, id: TweenId) -> Result<T, TweenError> {
        self.target.get().ok_or(TweenError::StaleTarget(id))
    }
}

impl<T: Tweenable> TweenDriver for ValueDriver<T> {
    fn kind(&self) -> &'static str {
        "value"
    }

    fn on_play(&mut self, id: TweenId) -> Result<(), TweenError> {
        if self.resolved.is_some() {
            return Ok(());
        }
        let start = match &self.start {
            StartValue::Fixed(v) => *v,
            StartValue::Current => self.current(id)?,
        };
        let end = match &self.end {
            EndValue::Fixed(v) => *v,
            EndValue::Current => self.current(id)?,
            EndValue::Delta(delta) => start.offset(*delta),
            EndValue::Reference(reference) => reference.get().ok_or(TweenError::StaleTarget(id))?,
        };
        self.resolved = Some((start, end));
        Ok(())
    }

    fn evaluate(&mut self, v: f32) -> Vec<Deferred> {
        let Some((start, mut end)) = self.resolved else {
            return Vec::new();
        };
        if let EndValue::Reference(reference) = &self.end {
            match reference.get() {
                Some(live) => {
                    end = live;
                    self.resolved = Some((start, live));
                }
                None => log::trace!("follow reference gone; holding last known end"),
            }
        }

        let mut value = T::lerp(start, end, v);
        if !self.mask.is_all() {
            match self.target.get() {
                Some(current) => value = value.masked(current, self.mask),
                None => {
                    log::trace!("masked write skipped: target unreadable");
                    return Vec::new();
                }
            }
        }
        if !self.target.set(value) {
            log::trace!("tween target gone; write skipped");
        }
        Vec::new()
    }

    fn set_axes(&mut self, mask: AxisMask) -> bool {
        self.mask = mask;
        true
    }

    fn clone_driver(&self) -> Box<dyn TweenDriver> {
        Box::new(self.copy(None))
    }

    fn replay_driver(&self) -> Box<dyn TweenDriver> {
        Box::new(self.copy(self.resolved))
    }
}
