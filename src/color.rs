// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Color representations: unpremultiplied float `Color` at the API
//! boundary, `PremultipliedColorU8` for internal pixel storage.

/// A color with four float channels in `[0, 1]`, stored unpremultiplied.
///
/// This is the representation used at the API boundary (`spec.md` §3);
/// all internal pixel buffers are premultiplied `u32`s, see
/// [`PremultipliedColorU8`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    #[allow(missing_docs)]
    pub r: f32,
    #[allow(missing_docs)]
    pub g: f32,
    #[allow(missing_docs)]
    pub b: f32,
    #[allow(missing_docs)]
    pub a: f32,
}

impl Color {
    /// Creates a new color from `[0, 1]` float channels.
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Creates a color from 8-bit channels.
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Opaque black.
    #[inline]
    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Opaque white.
    #[inline]
    pub fn white() -> Self {
        Color::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Fully transparent black.
    #[inline]
    pub fn transparent() -> Self {
        Color::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Premultiplies the color, also applying an extra `opacity` factor
    /// (`premultiply_color` in §4.G: `a' = round(color.a * opacity * 255)`).
    pub fn premultiply(&self, opacity: f32) -> PremultipliedColorU8 {
        let a = (self.a * opacity).clamp(0.0, 1.0);
        let to_u8 = |c: f32| ((c * a).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        PremultipliedColorU8::new(to_u8(self.r), to_u8(self.g), to_u8(self.b), (a * 255.0 + 0.5) as u8)
    }

    /// Converts a single sRGB-encoded channel to linear light.
    pub fn srgb_to_linear(c: f32) -> f32 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    /// Converts a single linear-light channel back to sRGB encoding.
    pub fn linear_to_srgb(c: f32) -> f32 {
        if c <= 0.0031308 {
            c * 12.92
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }
}

/// A premultiplied ARGB32 pixel, packed as `0xAARRGGBB`.
///
/// This is the only pixel representation used internally by the
/// rasterizer and blend pipeline (`spec.md` §3, §4.G).
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct PremultipliedColorU8(u32);

impl PremultipliedColorU8 {
    /// Builds a pixel from already-premultiplied 8-bit channels.
    ///
    /// `debug_assert`s the premultiplied invariant (`r, g, b <= a`);
    /// callers in release builds are trusted not to violate it.
    #[inline]
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        debug_assert!(r <= a && g <= a && b <= a, "channel exceeds alpha: not premultiplied");
        PremultipliedColorU8(pack_argb(a, r, g, b))
    }

    /// Wraps a raw `0xAARRGGBB` value without re-checking the invariant.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        PremultipliedColorU8(raw)
    }

    /// Transparent black, the zero pixel.
    #[inline]
    pub fn transparent() -> Self {
        PremultipliedColorU8(0)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn alpha(self) -> u8 {
        alpha(self.0)
    }

    #[inline]
    pub fn red(self) -> u8 {
        red(self.0)
    }

    #[inline]
    pub fn green(self) -> u8 {
        green(self.0)
    }

    #[inline]
    pub fn blue(self) -> u8 {
        blue(self.0)
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.alpha() == 255
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self.0 == 0
    }

    /// Un-premultiplies into a float `Color`.
    pub fn unpremultiply(self) -> Color {
        let a = self.alpha();
        if a == 0 {
            return Color::transparent();
        }
        let af = a as f32 / 255.0;
        Color::new(
            self.red() as f32 / 255.0 / af,
            self.green() as f32 / 255.0 / af,
            self.blue() as f32 / 255.0 / af,
            af,
        )
    }
}

#[inline]
pub(crate) fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub(crate) fn alpha(p: u32) -> u8 {
    (p >> 24) as u8
}

#[inline]
pub(crate) fn red(p: u32) -> u8 {
    (p >> 16) as u8
}

#[inline]
pub(crate) fn green(p: u32) -> u8 {
    (p >> 8) as u8
}

#[inline]
pub(crate) fn blue(p: u32) -> u8 {
    p as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premultiply_is_premultiplied() {
        let p = Color::new(1.0, 0.5, 0.25, 0.5).premultiply(1.0);
        assert!(p.red() <= p.alpha());
        assert!(p.green() <= p.alpha());
        assert!(p.blue() <= p.alpha());
    }

    #[test]
    fn srgb_round_trip() {
        let c = 0.42f32;
        let back = Color::linear_to_srgb(Color::srgb_to_linear(c));
        assert!((back - c).abs() < 1e-4);
    }

    #[test]
    fn transparent_is_zero() {
        assert_eq!(PremultipliedColorU8::transparent().raw(), 0);
    }
}
