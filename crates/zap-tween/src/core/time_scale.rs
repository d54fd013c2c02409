// core/time_scale.rs
//
// Time-scale channels: scalar sources multiplied into the raw frame delta
// before a tween accumulates it. Channels are injected per tween, so
// gameplay tweens can freeze while UI tweens keep running.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Source of the per-tick time multiplier.
pub trait TimeScaleProvider {
    fn value(&self) -> f32;
}

impl<F: Fn() -> f32> TimeScaleProvider for F {
    fn value(&self) -> f32 {
        self()
    }
}

/// Editable scalar channel.
#[derive(Debug)]
pub struct FixedTimeScale {
    value: Cell<f32>,
}

impl FixedTimeScale {
    pub fn new(value: f32) -> Self {
        Self {
            value: Cell::new(value),
        }
    }

    /// Shared channel, ready to hand to several tweens.
    pub fn shared(value: f32) -> Rc<Self> {
        Rc::new(Self::new(value))
    }

    pub fn set(&self, value: f32) {
        self.value.set(value);
    }

    pub fn get(&self) -> f32 {
        self.value.get()
    }
}

impl Default for FixedTimeScale {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TimeScaleProvider for FixedTimeScale {
    fn value(&self) -> f32 {
        self.value.get()
    }
}

/// Channel that follows another channel, multiplied by its own factor.
///
/// Typical use: a gameplay domain proxied onto the engine's global scale, so
/// both a global slow-motion and a local pause apply.
pub struct ProxyTimeScale {
    source: Rc<dyn TimeScaleProvider>,
    factor: Cell<f32>,
}

impl ProxyTimeScale {
    pub fn new(source: Rc<dyn TimeScaleProvider>) -> Self {
        Self {
            source,
            factor: Cell::new(1.0),
        }
    }

    pub fn with_factor(self, factor: f32) -> Self {
        self.factor.set(factor);
        self
    }

    pub fn set_factor(&self, factor: f32) {
        self.factor.set(factor);
    }

    pub fn factor(&self) -> f32 {
        self.factor.get()
    }
}

impl TimeScaleProvider for ProxyTimeScale {
    fn value(&self) -> f32 {
        self.source.value() * self.factor.get()
    }
}

impl fmt::Debug for ProxyTimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyTimeScale")
            .field("value", &self.value())
            .field("factor", &self.factor.get())
            .finish()
    }
}

/// Negative or non-finite scales read as 0.
pub(crate) fn sanitize(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_scale_is_editable_through_shared_ref() {
        let scale = FixedTimeScale::shared(1.0);
        let alias = scale.clone();
        alias.set(0.25);
        assert_eq!(scale.value(), 0.25);
    }

    #[test]
    fn proxy_multiplies_source() {
        let global = FixedTimeScale::shared(0.5);
        let gameplay = ProxyTimeScale::new(global.clone()).with_factor(2.0);
        assert_eq!(gameplay.value(), 1.0);

        global.set(0.0);
        assert_eq!(gameplay.value(), 0.0);
    }

    #[test]
    fn closures_are_channels() {
        let channel = || 3.0_f32;
        assert_eq!(channel.value(), 3.0);
    }

    #[test]
    fn sanitize_rejects_bad_values() {
        assert_eq!(sanitize(-1.0), 0.0);
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 0.0);
        assert_eq!(sanitize(2.0), 2.0);
    }
}
