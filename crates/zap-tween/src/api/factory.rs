// api/factory.rs
//
// Factory surface of the Tweener. Every call returns an Idle tween seeded
// with the configured defaults; chain setters and callbacks, then `play()`.
//
//   tweener.to(Binding::field(&panel, |p| &mut p.alpha), 0.0, 0.25)
//       .set_easing(Easing::OutQuad)
//       .set_group(GroupKey::of(&panel))
//       .set_group_replace(Replace::Stop)
//       .on_complete(move || panel_closed.set(true))
//       .play()?;

use crate::core::tween::Tween;
use crate::error::TweenError;
use crate::kinds::binding::Binding;
use crate::kinds::frames::FrameDriver;
use crate::kinds::sequence::Sequence;
use crate::kinds::shake::ShakeDriver;
use crate::kinds::typed::{EndValue, StartValue, ValueDriver};
use crate::kinds::value::Tweenable;
use crate::systems::scheduler::Tweener;

impl Tweener {
    /// General typed tween; the other value factories are shorthands for it.
    pub fn typed<T: Tweenable>(
        &self,
        target: Binding<T>,
        start: StartValue<T>,
        end: EndValue<T>,
        duration: f32,
    ) -> Tween {
        let driver = ValueDriver::new(target, start, end);
        Tween::new(self.weak(), self.settings(duration), Box::new(driver))
    }

    /// From the target's value at play time to `end`.
    pub fn to<T: Tweenable>(&self, target: Binding<T>, end: T, duration: f32) -> Tween {
        self.typed(target, StartValue::Current, EndValue::Fixed(end), duration)
    }

    /// From `start` to the target's value at play time.
    pub fn from<T: Tweenable>(&self, target: Binding<T>, start: T, duration: f32) -> Tween {
        self.typed(target, StartValue::Fixed(start), EndValue::Current, duration)
    }

    pub fn between<T: Tweenable>(&self, target: Binding<T>, start: T, end: T, duration: f32) -> Tween {
        self.typed(target, StartValue::Fixed(start), EndValue::Fixed(end), duration)
    }

    /// From the target's value at play time to that value plus `delta`.
    pub fn by<T: Tweenable>(&self, target: Binding<T>, delta: T, duration: f32) -> Tween {
        self.typed(target, StartValue::Current, EndValue::Delta(delta), duration)
    }

    /// From the target's value at play time towards `reference`, read again
    /// on every tick.
    pub fn follow<T: Tweenable>(&self, target: Binding<T>, reference: Binding<T>, duration: f32) -> Tween {
        self.typed(target, StartValue::Current, EndValue::Reference(reference), duration)
    }

    /// Plain scalar fed into a closure.
    pub fn value(&self, from: f32, to: f32, duration: f32, f: impl FnMut(f32) + 'static) -> Tween {
        self.between(Binding::sink(f), from, to, duration)
    }

    /// Step through `frames`, each shown for an equal share of `duration`.
    pub fn frames<F: Clone + 'static>(&self, target: Binding<F>, frames: Vec<F>, duration: f32) -> Tween {
        let empty = frames.is_empty();
        let tween = Tween::new(
            self.weak(),
            self.settings(duration),
            Box::new(FrameDriver::new(target, frames)),
        );
        if empty {
            tween.reject(TweenError::EmptyFrames);
        }
        tween
    }

    /// Jitter around the target's value at play time, `strength` at most,
    /// decaying along the easing curve. Same seed, same shake.
    pub fn shake<T: Tweenable>(&self, target: Binding<T>, strength: f32, duration: f32, seed: u64) -> Tween {
        let tween = Tween::new(
            self.weak(),
            self.settings(duration),
            Box::new(ShakeDriver::new(target, strength, seed)),
        );
        if !(strength.is_finite() && strength >= 0.0) {
            tween.reject(TweenError::InvalidConfig(format!(
                "shake strength must be non-negative, got {}",
                strength
            )));
        }
        tween
    }

    /// Empty sequence; fill it with `append`, `join`, `insert` and friends.
    pub fn sequence(&self) -> Sequence {
        Sequence::new(self.weak())
    }
}
