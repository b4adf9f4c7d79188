// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Premultiplied-ARGB pixel kernels and the twelve Porter-Duff operators
//! (`spec.md` section 4.G). Operators are dispatched through the
//! [`Operator`] trait rather than a function-pointer table, per the
//! "monomorphized kernels via generics" option named in section 9.

use crate::color::{alpha, blue, green, pack_argb, red, PremultipliedColorU8};

/// Componentwise `(p * a + 127) / 255`, the 8-bit multiply used
/// throughout compositing for coverage/opacity modulation.
#[inline]
pub fn byte_mul(p: u8, a: u8) -> u8 {
    let v = p as u32 * a as u32 + 127;
    ((v + (v >> 8)) >> 8) as u8
}

/// Linear interpolation between `a` and `b` at `t/255`.
#[inline]
pub fn interpolate_255(a: u8, b: u8, t: u8) -> u8 {
    let a = a as u32;
    let b = b as u32;
    let t = t as u32;
    (((a * (255 - t)) + (b * t) + 127) / 255) as u8
}

/// Fills `count` consecutive `u32`s at `dst` with `value`.
#[inline]
pub fn memfill32(dst: &mut [u32], value: u32) {
    dst.fill(value);
}

#[inline]
fn scale_channels(raw: u32, a: u8) -> u32 {
    pack_argb(
        byte_mul(alpha(raw), a),
        byte_mul(red(raw), a),
        byte_mul(green(raw), a),
        byte_mul(blue(raw), a),
    )
}

/// Premultiplies `color` by `opacity` into a packed pixel
/// (`premultiply_color` in section 4.G).
#[inline]
pub fn premultiply_color(color: PremultipliedColorU8, opacity: u8) -> PremultipliedColorU8 {
    PremultipliedColorU8::from_raw(scale_channels(color.raw(), opacity))
}

/// A Porter-Duff compositing operator, dispatched as a monomorphized
/// trait rather than a runtime function-pointer table (section 9).
///
/// Each operator implements both a solid-source and a buffer-source
/// blend, plus `const_alpha` (0..255, a uniform coverage multiplier).
/// `const_alpha == 255` is handled as a distinct fast path by every
/// implementation, matching the "must remain distinct code paths"
/// requirement.
pub trait Operator {
    /// Blends a single solid `src` pixel into `dst` at `const_alpha`.
    fn blend_solid(src: PremultipliedColorU8, dst: PremultipliedColorU8, const_alpha: u8) -> PremultipliedColorU8;

    /// Blends a buffer of `src` pixels into `dst` at `const_alpha`.
    fn blend_buffer(src: &[u32], dst: &mut [u32], const_alpha: u8) {
        for (s, d) in src.iter().zip(dst.iter_mut()) {
            let out = Self::blend_solid(PremultipliedColorU8::from_raw(*s), PremultipliedColorU8::from_raw(*d), const_alpha);
            *d = out.raw();
        }
    }
}

macro_rules! operator {
    ($name:ident, |$sa:ident, $sc:ident, $da:ident, $dc:ident| $formula:expr) => {
        #[doc = concat!("The `", stringify!($name), "` Porter-Duff operator.")]
        pub struct $name;

        impl Operator for $name {
            fn blend_solid(src: PremultipliedColorU8, dst: PremultipliedColorU8, const_alpha: u8) -> PremultipliedColorU8 {
                let src = if const_alpha == 255 { src } else { premultiply_color(src, const_alpha) };

                let $sa = src.alpha() as u32;
                let $da = dst.alpha() as u32;
                let blend_channel = |sc: u8, dc: u8| -> u8 {
                    let $sc = sc as u32;
                    let $dc = dc as u32;
                    let v: u32 = $formula;
                    v.min(255) as u8
                };

                PremultipliedColorU8::new(
                    blend_channel(src.red(), dst.red()),
                    blend_channel(src.green(), dst.green()),
                    blend_channel(src.blue(), dst.blue()),
                    blend_channel(src.alpha(), dst.alpha()),
                )
            }
        }
    };
}

// Each formula follows the standard Porter-Duff algebra over
// premultiplied channels: `result = Fa*src + Fb*dst`, with `Fa`/`Fb`
// picked per operator and division by 255 folded into `byte_mul`-style
// rounding (`(x + 127) / 255`-equivalent via the shared helper below).
#[inline]
fn div255(v: u32) -> u32 {
    (v + 127) / 255
}

operator!(Clear, |_sa, _sc, _da, _dc| 0);
operator!(Src, |_sa, sc, _da, _dc| sc);
operator!(Dst, |_sa, _sc, _da, dc| dc);
operator!(DstOver, |_sa, sc, da, dc| dc + div255(sc * (255 - da)));
operator!(SrcIn, |_sa, sc, da, _dc| div255(sc * da));
operator!(DstIn, |sa, _sc, _da, dc| div255(dc * sa));
operator!(SrcOut, |_sa, sc, da, _dc| div255(sc * (255 - da)));
operator!(DstOut, |sa, _sc, _da, dc| div255(dc * (255 - sa)));
operator!(SrcAtop, |sa, sc, da, dc| div255(sc * da) + div255(dc * (255 - sa)));
operator!(DstAtop, |sa, sc, da, dc| div255(dc * sa) + div255(sc * (255 - da)));
operator!(Xor, |sa, sc, da, dc| div255(sc * (255 - da)) + div255(dc * (255 - sa)));

/// The `SrcOver` Porter-Duff operator.
pub struct SrcOver;

impl Operator for SrcOver {
    fn blend_solid(src: PremultipliedColorU8, dst: PremultipliedColorU8, const_alpha: u8) -> PremultipliedColorU8 {
        let src = if const_alpha == 255 { src } else { premultiply_color(src, const_alpha) };

        let sa = src.alpha() as u32;
        let blend_channel = |sc: u8, dc: u8| -> u8 {
            let sc = sc as u32;
            let dc = dc as u32;
            let v: u32 = sc + div255(dc * (255 - sa));
            v.min(255) as u8
        };

        PremultipliedColorU8::new(
            blend_channel(src.red(), dst.red()),
            blend_channel(src.green(), dst.green()),
            blend_channel(src.blue(), dst.blue()),
            blend_channel(src.alpha(), dst.alpha()),
        )
    }

    fn blend_buffer(src: &[u32], dst: &mut [u32], const_alpha: u8) {
        for (s, d) in src.iter().zip(dst.iter_mut()) {
            let src_px = PremultipliedColorU8::from_raw(*s);
            if const_alpha == 255 {
                if src_px.is_opaque() {
                    // Opaque source fully replaces the destination.
                    *d = *s;
                    continue;
                }
                if src_px.is_transparent() {
                    continue;
                }
            }
            let out = Self::blend_solid(src_px, PremultipliedColorU8::from_raw(*d), const_alpha);
            *d = out.raw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> PremultipliedColorU8 {
        PremultipliedColorU8::new(r, g, b, a)
    }

    #[test]
    fn byte_mul_identity_at_255() {
        assert_eq!(byte_mul(200, 255), 200);
        assert_eq!(byte_mul(200, 0), 0);
    }

    #[test]
    fn clear_always_zero() {
        let out = Clear::blend_solid(px(255, 0, 0, 255), px(0, 0, 255, 255), 255);
        assert_eq!(out.raw(), 0);
    }

    #[test]
    fn src_over_opaque_source_replaces_dst() {
        let out = SrcOver::blend_solid(px(255, 0, 0, 255), px(0, 0, 255, 255), 255);
        assert_eq!(out, px(255, 0, 0, 255));
    }

    #[test]
    fn src_over_transparent_source_is_noop() {
        let dst = px(0, 0, 255, 255);
        let out = SrcOver::blend_solid(PremultipliedColorU8::transparent(), dst, 255);
        assert_eq!(out, dst);
    }

    #[test]
    fn dst_leaves_destination_unchanged() {
        let dst = px(10, 20, 30, 200);
        let out = Dst::blend_solid(px(255, 255, 255, 255), dst, 255);
        assert_eq!(out, dst);
    }

    #[test]
    fn const_alpha_scales_solid_source() {
        let out = SrcOver::blend_solid(px(255, 255, 255, 255), PremultipliedColorU8::transparent(), 128);
        // Half coverage over transparent approximates half the source alpha.
        assert!(out.alpha() > 120 && out.alpha() < 135);
    }

    #[test]
    fn src_over_buffer_opaque_fast_path_memcpys() {
        let src = [px(10, 20, 30, 255).raw()];
        let mut dst = [px(1, 2, 3, 255).raw()];
        SrcOver::blend_buffer(&src, &mut dst, 255);
        assert_eq!(dst[0], src[0]);
    }
}
