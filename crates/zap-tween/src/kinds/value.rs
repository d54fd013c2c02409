//! Interpolable value types.
//!
//! Anything a typed tween writes implements [`Tweenable`]: scalars, glam
//! vectors (feature `vectors`) and [`Color`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Set of components a typed tween may overwrite.
///
/// Components map to `x, y, z, w` for vectors and `r, g, b, a` for colors.
/// Scalars only look at `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisMask(u8);

impl AxisMask {
    pub const NONE: AxisMask = AxisMask(0);
    pub const X: AxisMask = AxisMask(1);
    pub const Y: AxisMask = AxisMask(1 << 1);
    pub const Z: AxisMask = AxisMask(1 << 2);
    pub const W: AxisMask = AxisMask(1 << 3);
    pub const ALL: AxisMask = AxisMask(0b1111);

    pub fn contains(self, other: AxisMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for AxisMask {
    type Output = AxisMask;

    fn bitor(self, rhs: AxisMask) -> AxisMask {
        AxisMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for AxisMask {
    fn bitor_assign(&mut self, rhs: AxisMask) {
        self.0 |= rhs.0;
    }
}

/// A value a typed tween can interpolate and write.
pub trait Tweenable: Copy + PartialEq + fmt::Debug + 'static {
    /// `from + (to - from) * t`. `t` may leave [0, 1] for overshooting curves.
    fn lerp(from: Self, to: Self, t: f32) -> Self;

    /// `self + delta`, used to resolve relative end values.
    fn offset(self, delta: Self) -> Self;

    /// Components in `mask` from `self`, the rest from `current`.
    fn masked(self, current: Self, mask: AxisMask) -> Self;

    /// Every component displaced by `amount * noise()`, with `noise` in [-1, 1].
    fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> Self;
}

impl Tweenable for f32 {
    fn lerp(from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * t
    }

    fn offset(self, delta: f32) -> f32 {
        self + delta
    }

    fn masked(self, current: f32, mask: AxisMask) -> f32 {
        if mask.contains(AxisMask::X) {
            self
        } else {
            current
        }
    }

    fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> f32 {
        self + amount * noise()
    }
}

fn pick(mask: AxisMask, axis: AxisMask, new: f32, current: f32) -> f32 {
    if mask.contains(axis) {
        new
    } else {
        current
    }
}

#[cfg(feature = "vectors")]
mod vectors {
    use super::{pick, AxisMask, Tweenable};
    use glam::{Vec2, Vec3, Vec4};

    impl Tweenable for Vec2 {
        fn lerp(from: Vec2, to: Vec2, t: f32) -> Vec2 {
            from + (to - from) * t
        }

        fn offset(self, delta: Vec2) -> Vec2 {
            self + delta
        }

        fn masked(self, current: Vec2, mask: AxisMask) -> Vec2 {
            Vec2::new(
                pick(mask, AxisMask::X, self.x, current.x),
                pick(mask, AxisMask::Y, self.y, current.y),
            )
        }

        fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> Vec2 {
            let x = noise();
            let y = noise();
            self + Vec2::new(x, y) * amount
        }
    }

    impl Tweenable for Vec3 {
        fn lerp(from: Vec3, to: Vec3, t: f32) -> Vec3 {
            from + (to - from) * t
        }

        fn offset(self, delta: Vec3) -> Vec3 {
            self + delta
        }

        fn masked(self, current: Vec3, mask: AxisMask) -> Vec3 {
            Vec3::new(
                pick(mask, AxisMask::X, self.x, current.x),
                pick(mask, AxisMask::Y, self.y, current.y),
                pick(mask, AxisMask::Z, self.z, current.z),
            )
        }

        fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> Vec3 {
            let x = noise();
            let y = noise();
            let z = noise();
            self + Vec3::new(x, y, z) * amount
        }
    }

    impl Tweenable for Vec4 {
        fn lerp(from: Vec4, to: Vec4, t: f32) -> Vec4 {
            from + (to - from) * t
        }

        fn offset(self, delta: Vec4) -> Vec4 {
            self + delta
        }

        fn masked(self, current: Vec4, mask: AxisMask) -> Vec4 {
            Vec4::new(
                pick(mask, AxisMask::X, self.x, current.x),
                pick(mask, AxisMask::Y, self.y, current.y),
                pick(mask, AxisMask::Z, self.z, current.z),
                pick(mask, AxisMask::W, self.w, current.w),
            )
        }

        fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> Vec4 {
            let x = noise();
            let y = noise();
            let z = noise();
            let w = noise();
            self + Vec4::new(x, y, z, w) * amount
        }
    }
}

/// Linear RGBA color, layout-compatible with a `[f32; 4]` GPU attribute.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Same color, different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        bytemuck::cast(self)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(rgba: [f32; 4]) -> Self {
        bytemuck::cast(rgba)
    }
}

impl Tweenable for Color {
    fn lerp(from: Color, to: Color, t: f32) -> Color {
        Color::rgba(
            <f32 as Tweenable>::lerp(from.r, to.r, t),
            <f32 as Tweenable>::lerp(from.g, to.g, t),
            <f32 as Tweenable>::lerp(from.b, to.b, t),
            <f32 as Tweenable>::lerp(from.a, to.a, t),
        )
    }

    fn offset(self, delta: Color) -> Color {
        Color::rgba(self.r + delta.r, self.g + delta.g, self.b + delta.b, self.a + delta.a)
    }

    fn masked(self, current: Color, mask: AxisMask) -> Color {
        Color::rgba(
            pick(mask, AxisMask::X, self.r, current.r),
            pick(mask, AxisMask::Y, self.g, current.g),
            pick(mask, AxisMask::Z, self.b, current.b),
            pick(mask, AxisMask::W, self.a, current.a),
        )
    }

    fn jitter(self, amount: f32, noise: &mut dyn FnMut() -> f32) -> Color {
        let r = noise();
        let g = noise();
        let b = noise();
        Color::rgba(self.r + r * amount, self.g + g * amount, self.b + b * amount, self.a)
    }
}
