// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mask surfaces (`spec.md` section 4.I step 4): an auxiliary surface
//! whose alpha or luminance modulates per-pixel coverage during
//! compositing.

use crate::pixmap::Surface;

/// How a [`Mask`]'s pixels are reduced to a single coverage value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaskMode {
    /// Use the pixel's alpha channel directly.
    Alpha,
    /// Use BT.709 luma of the (unpremultiplied) color.
    Luminance,
    /// `255 - alpha`.
    InvertedAlpha,
}

/// A mask surface plus the mode used to read it and an `(ox, oy)` offset
/// subtracted from destination coordinates before lookup.
pub struct Mask {
    pub surface: Surface,
    pub mode: MaskMode,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Mask {
    pub fn new(surface: Surface, mode: MaskMode) -> Mask {
        Mask { surface, mode, offset_x: 0, offset_y: 0 }
    }

    /// The modulating coverage at destination pixel `(x, y)`, or `0` if
    /// it falls outside the mask (section 4.I: "pixels outside the mask
    /// contribute zero").
    pub fn coverage_at(&self, x: i32, y: i32) -> u8 {
        let mx = x - self.offset_x;
        let my = y - self.offset_y;
        if mx < 0 || my < 0 {
            return 0;
        }
        let Some(px) = self.surface.get_pixel(mx as u32, my as u32) else {
            return 0;
        };

        match self.mode {
            MaskMode::Alpha => px.alpha(),
            MaskMode::InvertedAlpha => 255 - px.alpha(),
            MaskMode::Luminance => {
                let c = px.unpremultiply();
                let luma = 0.2126 * c.r + 0.7152 * c.g + 0.0722 * c.b;
                ((luma * c.a).clamp(0.0, 1.0) * 255.0 + 0.5) as u8
            }
        }
    }

    /// Modulates `coverage` by this mask at `(x, y)`:
    /// `(coverage * mask_coverage) / 255` (section 4.I step 4).
    #[inline]
    pub fn modulate(&self, coverage: u8, x: i32, y: i32) -> u8 {
        crate::pixel::byte_mul(coverage, self.coverage_at(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PremultipliedColorU8;

    #[test]
    fn alpha_mode_reads_alpha_channel() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.fill(PremultipliedColorU8::new(10, 10, 10, 128));
        let mask = Mask::new(surface, MaskMode::Alpha);
        assert_eq!(mask.coverage_at(0, 0), 128);
    }

    #[test]
    fn inverted_alpha_flips_it() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.fill(PremultipliedColorU8::new(10, 10, 10, 200));
        let mask = Mask::new(surface, MaskMode::InvertedAlpha);
        assert_eq!(mask.coverage_at(0, 0), 55);
    }

    #[test]
    fn outside_mask_is_zero() {
        let surface = Surface::new(1, 1).unwrap();
        let mask = Mask::new(surface, MaskMode::Alpha);
        assert_eq!(mask.coverage_at(5, 5), 0);
    }

    #[test]
    fn offset_shifts_lookup() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.fill(PremultipliedColorU8::new(10, 10, 10, 255));
        let mask = Mask { surface, mode: MaskMode::Alpha, offset_x: 3, offset_y: 3 };
        assert_eq!(mask.coverage_at(3, 3), 255);
        assert_eq!(mask.coverage_at(0, 0), 0);
    }
}
