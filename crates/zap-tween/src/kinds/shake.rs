// kinds/shake.rs
//
// Shake tween: decaying jitter around the value found at play time.
// Deterministic for a given seed; lands exactly on the origin at the end.

use super::binding::Binding;
use super::value::Tweenable;
use crate::core::tween::{Deferred, TweenDriver, TweenId};
use crate::error::TweenError;

/// Seedable pseudo-random number generator (xorshift64).
#[derive(Debug, Clone)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1).
    pub fn next_signed(&mut self) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        unit * 2.0 - 1.0
    }
}

/// Spreads small seeds over the whole xorshift state.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

pub(crate) struct ShakeDriver<T: Tweenable> {
    target: Binding<T>,
    strength: f32,
    seed: u64,
    rng: Rng,
    origin: Option<T>,
}

impl<T: Tweenable> ShakeDriver<T> {
    pub fn new(target: Binding<T>, strength: f32, seed: u64) -> Self {
        Self {
            target,
            strength,
            seed,
            rng: Rng::new(seed.wrapping_mul(GOLDEN_GAMMA)),
            origin: None,
        }
    }

    fn restore(&mut self) {
        if let Some(origin) = self.origin {
            if !self.target.set(origin) {
                log::trace!("shake target gone; origin not restored");
            }
        }
    }
}

impl<T: Tweenable> TweenDriver for ShakeDriver<T> {
    fn kind(&self) -> &'static str {
        "shake"
    }

    fn on_play(&mut self, id: TweenId) -> Result<(), TweenError> {
        if self.origin.is_some() {
            return Ok(());
        }
        let origin = self.target.get().ok_or(TweenError::StaleTarget(id))?;
        self.origin = Some(origin);
        Ok(())
    }

    /// `v` is the decay: full strength at 0, at rest on 1.
    fn evaluate(&mut self, v: f32) -> Vec<Deferred> {
        let Some(origin) = self.origin else {
            return Vec::new();
        };
        if v >= 1.0 {
            self.restore();
            return Vec::new();
        }
        let amount = self.strength * (1.0 - v);
        let rng = &mut self.rng;
        let value = origin.jitter(amount, &mut || rng.next_signed());
        if !self.target.set(value) {
            log::trace!("shake target gone; write skipped");
        }
        Vec::new()
    }

    fn finish(&mut self) -> Vec<Deferred> {
        self.restore();
        Vec::new()
    }

    fn stop(&mut self) -> Vec<Deferred> {
        self.restore();
        Vec::new()
    }

    fn clone_driver(&self) -> Box<dyn TweenDriver> {
        Box::new(ShakeDriver::new(self.target.clone(), self.strength, self.seed))
    }

    fn replay_driver(&self) -> Box<dyn TweenDriver> {
        let mut replay = ShakeDriver::new(self.target.clone(), self.strength, self.seed);
        replay.origin = self.origin;
        Box::new(replay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tweener;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn rng_deterministic() {
        let mut rng1 = Rng::new(42);
        let mut rng2 = Rng::new(42);
        for _ in 0..10 {
            assert_eq!(rng1.next_signed(), rng2.next_signed());
        }
    }

    #[test]
    fn rng_stays_in_range() {
        let mut rng = Rng::new(0);
        for _ in 0..1000 {
            let v = rng.next_signed();
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn shake_stays_within_strength_and_returns_to_origin() {
        let tweener = Tweener::new();
        let x = Rc::new(RefCell::new(10.0_f32));
        tweener.shake(Binding::cell(&x), 2.0, 1.0, 7).play().unwrap();

        let mut moved = false;
        for _ in 0..9 {
            tweener.tick(0.1);
            let value = *x.borrow();
            assert!((value - 10.0).abs() <= 2.0);
            moved |= value != 10.0;
        }
        assert!(moved);

        tweener.tick(0.5);
        assert_eq!(*x.borrow(), 10.0);
    }

    #[test]
    fn same_seed_same_shake() {
        let run = |seed: u64| {
            let tweener = Tweener::new();
            let x = Rc::new(RefCell::new(0.0_f32));
            tweener.shake(Binding::cell(&x), 1.0, 1.0, seed).play().unwrap();
            (0..5)
                .map(|_| {
                    tweener.tick(0.1);
                    *x.borrow()
                })
                .collect::<Vec<f32>>()
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn stopping_restores_origin() {
        let tweener = Tweener::new();
        let x = Rc::new(RefCell::new(1.0_f32));
        let tween = tweener.shake(Binding::cell(&x), 5.0, 2.0, 1).play().unwrap();
        tweener.tick(0.3);
        tween.stop();
        assert_eq!(*x.borrow(), 1.0);
    }
}
