// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The blend dispatcher (`spec.md` section 4.I): clips spans, dispatches
//! by paint kind, applies an optional CSS blend mode and mask
//! modulation, and composites through a Porter-Duff [`Operator`].

use crate::blend_mode::BlendMode;
use crate::color::{Color, PremultipliedColorU8};
use crate::geom::{IntRect, Transform};
use crate::mask::Mask;
use crate::paint::{ColorSpace, Paint};
use crate::pixel::{self, Operator};
use crate::pixmap::Surface;
use crate::span::SpanBuffer;

/// A Porter-Duff operator selection, dispatched to the monomorphized
/// [`Operator`] implementations in [`crate::pixel`] (section 9).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    Clear,
    Src,
    Dst,
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcAtop,
    DstAtop,
    Xor,
}

impl Default for Op {
    #[inline]
    fn default() -> Self {
        Op::SrcOver
    }
}

/// Every parameter the dispatcher needs for a single draw call.
pub struct DrawParams<'a> {
    pub spans: &'a SpanBuffer,
    pub paint: &'a Paint<'a>,
    /// Maps paint-local (gradient or texture) space into destination
    /// pixel space; its inverse recovers paint-local coordinates from a
    /// destination pixel. Identity for plain solid fills.
    pub paint_transform: Transform,
    pub op: Op,
    pub blend_mode: BlendMode,
    pub opacity: f32,
    pub color_interp: ColorSpace,
    pub dithering: bool,
    pub clip_rect: Option<IntRect>,
    pub clip_spans: Option<&'a SpanBuffer>,
    pub mask: Option<&'a Mask>,
}

/// Composites `params` onto `target`.
pub fn draw(target: &mut Surface, params: &DrawParams) {
    let mut spans = params.spans.clone();

    if let Some(clip) = params.clip_spans {
        spans = spans.intersect(clip);
        if spans.is_empty() {
            return;
        }
    }

    if let Some(rect) = params.clip_rect {
        spans = spans.clip_to_rect(&rect);
        if spans.is_empty() {
            return;
        }
    }

    let spans = &spans;

    match params.paint {
        Paint::Solid(color) => draw_solid(target, spans, *color, params),
        Paint::Gradient(gradient) => draw_gradient(target, spans, gradient, params),
        Paint::Texture(texture) => draw_texture(target, spans, texture, params),
    }
}

fn span_coverage(params: &DrawParams, x: i32, y: i32, coverage: u8) -> u8 {
    match params.mask {
        Some(mask) => mask.modulate(coverage, x, y),
        None => coverage,
    }
}

fn draw_solid(target: &mut Surface, spans: &SpanBuffer, color: PremultipliedColorU8, params: &DrawParams) {
    let solid = pixel::premultiply_color(color, (params.opacity.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
    let width = target.width() as i32;
    let height = target.height() as i32;

    for span in spans.iter() {
        if span.y < 0 || span.y >= height {
            continue;
        }
        let lo = span.x.max(0);
        let hi = span.right().min(width);
        if hi <= lo {
            continue;
        }
        let row = target.pixels_mut();
        let row_offset = span.y as usize * width as usize;

        if params.blend_mode == BlendMode::Normal {
            for x in lo..hi {
                let cov = span_coverage(params, x, span.y, span.coverage);
                if cov == 0 {
                    continue;
                }
                dispatch_solid(params.op, solid, &mut row[row_offset + x as usize], cov);
            }
        } else {
            for x in lo..hi {
                let cov = span_coverage(params, x, span.y, span.coverage);
                if cov == 0 {
                    continue;
                }
                let idx = row_offset + x as usize;
                let dst = PremultipliedColorU8::from_raw(row[idx]);
                let blended = apply_blend_mode(params.blend_mode, solid, dst);
                dispatch_solid(Op::SrcOver, blended, &mut row[idx], cov);
            }
        }
    }
}

/// Gradient spans are fetched in chunks no larger than this, matching
/// the table's own resolution (section 4.H).
const GRADIENT_CHUNK: usize = 1024;

fn draw_gradient(target: &mut Surface, spans: &SpanBuffer, gradient: &crate::paint::Gradient, params: &DrawParams) {
    let inverse = match params.paint_transform.invert() {
        Some(m) => m,
        None => return,
    };
    let width = target.width() as i32;
    let height = target.height() as i32;
    let global_alpha = (params.opacity.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;

    let mut chunk = [0u32; GRADIENT_CHUNK];

    for span in spans.iter() {
        if span.y < 0 || span.y >= height {
            continue;
        }
        let lo = span.x.max(0);
        let hi = span.right().min(width);
        if hi <= lo {
            continue;
        }

        let mut start = lo;
        while start < hi {
            let end = (start + GRADIENT_CHUNK as i32).min(hi);
            let n = (end - start) as usize;

            for (i, x) in (start..end).enumerate() {
                let p = crate::geom::Point::new(x as f32 + 0.5, span.y as f32 + 0.5);
                let local = inverse.map_point(p);
                let t = gradient.parameter_at(local);
                let mut sample = match t {
                    Some(t) => gradient.sample(t),
                    None => PremultipliedColorU8::transparent(),
                };
                if params.dithering {
                    sample = dither_pixel(sample, crate::paint::bayer_dither(x, span.y));
                }
                chunk[i] = pixel::premultiply_color(sample, global_alpha).raw();
            }

            let row = target.pixels_mut();
            let row_offset = span.y as usize * width as usize;
            for (i, x) in (start..end).enumerate() {
                let cov = span_coverage(params, x, span.y, span.coverage);
                if cov == 0 {
                    continue;
                }
                let idx = row_offset + x as usize;
                let src = PremultipliedColorU8::from_raw(chunk[i]);
                let src = if params.blend_mode == BlendMode::Normal {
                    src
                } else {
                    apply_blend_mode(params.blend_mode, src, PremultipliedColorU8::from_raw(row[idx]))
                };
                let op = if params.blend_mode == BlendMode::Normal { params.op } else { Op::SrcOver };
                dispatch_solid(op, src, &mut row[idx], cov);
            }

            start = end;
            let _ = n;
        }
    }
}

fn dither_pixel(c: PremultipliedColorU8, bias: i32) -> PremultipliedColorU8 {
    let adjust = |v: u8| -> u8 { (v as i32 + bias).clamp(0, 255) as u8 };
    PremultipliedColorU8::new(adjust(c.red()).min(c.alpha()), adjust(c.green()).min(c.alpha()), adjust(c.blue()).min(c.alpha()), c.alpha())
}

fn draw_texture(target: &mut Surface, spans: &SpanBuffer, texture: &crate::paint::Texture<'_>, params: &DrawParams) {
    let width = target.width() as i32;
    let height = target.height() as i32;
    let identity = params.paint_transform.is_identity();
    let fast_path = identity && params.blend_mode == BlendMode::Normal && texture.tile_mode == crate::paint::TileMode::Plain;

    let inverse = if fast_path { None } else { params.paint_transform.invert() };
    if !fast_path && inverse.is_none() {
        return;
    }

    for span in spans.iter() {
        if span.y < 0 || span.y >= height {
            continue;
        }
        let lo = span.x.max(0);
        let hi = span.right().min(width);
        if hi <= lo {
            continue;
        }

        let row = target.pixels_mut();
        let row_offset = span.y as usize * width as usize;

        for x in lo..hi {
            let sample = if fast_path {
                texture.sample(x as f32 + 0.5, span.y as f32 + 0.5)
            } else {
                let inv = inverse.unwrap();
                let local = inv.map_point(crate::geom::Point::new(x as f32 + 0.5, span.y as f32 + 0.5));
                texture.sample(local.x, local.y)
            };

            let idx = row_offset + x as usize;
            if params.blend_mode == BlendMode::Normal {
                let cov = span_coverage(params, x, span.y, combine_texture_coverage(span.coverage, texture.opacity));
                if cov == 0 {
                    continue;
                }
                dispatch_solid(params.op, sample, &mut row[idx], cov);
            } else {
                let cov = span_coverage(params, x, span.y, span.coverage);
                if cov == 0 {
                    continue;
                }
                let blended = apply_blend_mode(params.blend_mode, sample, PremultipliedColorU8::from_raw(row[idx]));
                dispatch_solid(Op::SrcOver, blended, &mut row[idx], cov);
            }
        }
    }
}

/// `(cov * tex_opacity) >> 8`, used when combining span coverage with a
/// texture's own opacity outside of blend-mode paths (section 4.I).
#[inline]
fn combine_texture_coverage(cov: u8, tex_opacity: u8) -> u8 {
    ((cov as u32 * tex_opacity as u32) >> 8) as u8
}

fn apply_blend_mode(mode: BlendMode, src: PremultipliedColorU8, dst: PremultipliedColorU8) -> PremultipliedColorU8 {
    let cs = src.unpremultiply();
    let cb = dst.unpremultiply();
    let blended = mode.blend([cs.r, cs.g, cs.b], [cb.r, cb.g, cb.b]);

    let alpha_b = cb.a;
    let out = [
        (1.0 - alpha_b) * cs.r + alpha_b * blended[0],
        (1.0 - alpha_b) * cs.g + alpha_b * blended[1],
        (1.0 - alpha_b) * cs.b + alpha_b * blended[2],
    ];

    Color::new(out[0], out[1], out[2], cs.a).premultiply(1.0)
}

macro_rules! dispatch_op {
    ($op:expr, $src:expr, $dst_slot:expr, $cov:expr) => {
        match $op {
            Op::Clear => blend_one::<crate::pixel::Clear>($src, $dst_slot, $cov),
            Op::Src => blend_one::<crate::pixel::Src>($src, $dst_slot, $cov),
            Op::Dst => blend_one::<crate::pixel::Dst>($src, $dst_slot, $cov),
            Op::SrcOver => blend_one::<crate::pixel::SrcOver>($src, $dst_slot, $cov),
            Op::DstOver => blend_one::<crate::pixel::DstOver>($src, $dst_slot, $cov),
            Op::SrcIn => blend_one::<crate::pixel::SrcIn>($src, $dst_slot, $cov),
            Op::DstIn => blend_one::<crate::pixel::DstIn>($src, $dst_slot, $cov),
            Op::SrcOut => blend_one::<crate::pixel::SrcOut>($src, $dst_slot, $cov),
            Op::DstOut => blend_one::<crate::pixel::DstOut>($src, $dst_slot, $cov),
            Op::SrcAtop => blend_one::<crate::pixel::SrcAtop>($src, $dst_slot, $cov),
            Op::DstAtop => blend_one::<crate::pixel::DstAtop>($src, $dst_slot, $cov),
            Op::Xor => blend_one::<crate::pixel::Xor>($src, $dst_slot, $cov),
        }
    };
}

#[inline]
fn blend_one<O: Operator>(src: PremultipliedColorU8, dst_slot: &mut u32, const_alpha: u8) {
    let dst = PremultipliedColorU8::from_raw(*dst_slot);
    *dst_slot = O::blend_solid(src, dst, const_alpha).raw();
}

#[inline]
fn dispatch_solid(op: Op, src: PremultipliedColorU8, dst_slot: &mut u32, const_alpha: u8) {
    dispatch_op!(op, src, dst_slot, const_alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskMode;
    use crate::paint::{Gradient, GradientKind, GradientStop, SpreadMode};
    use crate::span::Span;

    fn opaque(r: u8, g: u8, b: u8) -> PremultipliedColorU8 {
        PremultipliedColorU8::new(r, g, b, 255)
    }

    #[test]
    fn solid_src_over_fills_coverage() {
        let mut target = Surface::new(4, 4).unwrap();
        let mut spans = SpanBuffer::default();
        spans.push(Span::new(0, 4, 0, 255));
        let paint = Paint::Solid(opaque(255, 0, 0));
        let params = DrawParams {
            spans: &spans,
            paint: &paint,
            paint_transform: Transform::identity(),
            op: Op::SrcOver,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            color_interp: ColorSpace::Srgb,
            dithering: false,
            clip_rect: None,
            clip_spans: None,
            mask: None,
        };
        draw(&mut target, &params);
        assert_eq!(target.get_pixel(0, 0).unwrap(), opaque(255, 0, 0));
    }

    #[test]
    fn clip_rect_excludes_spans_outside_it() {
        let mut target = Surface::new(4, 4).unwrap();
        let mut spans = SpanBuffer::default();
        spans.push(Span::new(0, 4, 0, 255));
        let paint = Paint::Solid(opaque(0, 255, 0));
        let params = DrawParams {
            spans: &spans,
            paint: &paint,
            paint_transform: Transform::identity(),
            op: Op::SrcOver,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            color_interp: ColorSpace::Srgb,
            dithering: false,
            clip_rect: Some(IntRect::new(2, 0, 4, 1)),
            clip_spans: None,
            mask: None,
        };
        draw(&mut target, &params);
        assert_eq!(target.get_pixel(0, 0).unwrap(), PremultipliedColorU8::transparent());
        assert_eq!(target.get_pixel(2, 0).unwrap(), opaque(0, 255, 0));
    }

    #[test]
    fn mask_modulates_coverage() {
        let mut target = Surface::new(2, 1).unwrap();
        let mut spans = SpanBuffer::default();
        spans.push(Span::new(0, 2, 0, 255));
        let mut mask_surface = Surface::new(2, 1).unwrap();
        mask_surface.fill(PremultipliedColorU8::new(0, 0, 0, 128));
        let mask = Mask::new(mask_surface, MaskMode::Alpha);
        let paint = Paint::Solid(opaque(255, 255, 255));
        let params = DrawParams {
            spans: &spans,
            paint: &paint,
            paint_transform: Transform::identity(),
            op: Op::SrcOver,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            color_interp: ColorSpace::Srgb,
            dithering: false,
            clip_rect: None,
            clip_spans: None,
            mask: Some(&mask),
        };
        draw(&mut target, &params);
        assert_eq!(target.get_pixel(0, 0).unwrap().alpha(), 128);
    }

    #[test]
    fn linear_gradient_endpoints_match_after_dispatch() {
        let mut target = Surface::new(10, 1).unwrap();
        let stops = vec![
            GradientStop { offset: 0.0, color: Color::black() },
            GradientStop { offset: 1.0, color: Color::white() },
        ];
        let gradient = Gradient::new(
            GradientKind::Linear { p0: crate::geom::Point::new(0.0, 0.0), p1: crate::geom::Point::new(10.0, 0.0) },
            SpreadMode::Pad,
            Transform::identity(),
            &stops,
            ColorSpace::Srgb,
            1.0,
        );
        let mut spans = SpanBuffer::default();
        spans.push(Span::new(0, 10, 0, 255));
        let paint = Paint::Gradient(gradient);
        let params = DrawParams {
            spans: &spans,
            paint: &paint,
            paint_transform: Transform::identity(),
            op: Op::SrcOver,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            color_interp: ColorSpace::Srgb,
            dithering: false,
            clip_rect: None,
            clip_spans: None,
            mask: None,
        };
        draw(&mut target, &params);
        assert!(target.get_pixel(0, 0).unwrap().red() < 20);
        assert!(target.get_pixel(9, 0).unwrap().red() > 200);
    }
}
