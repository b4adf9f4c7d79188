// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drop shadows (`spec.md` section 4.I "Shadow rendering"): an offset,
//! solid-color fill of a shape's coverage, blurred with three box-blur
//! passes approximating a Gaussian (the Kutskir box-gauss formulation).

use crate::color::PremultipliedColorU8;
use crate::geom::IntRect;
use crate::pixmap::Surface;
use crate::span::SpanBuffer;

/// A shadow's offset, blur radius and solid color.
#[derive(Clone, Copy, Debug)]
pub struct ShadowStyle {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: PremultipliedColorU8,
}

/// Computes the shadow's render bounds: the span bounds expanded by
/// `ceil(3*blur)` in each direction, offset by the shadow's own offset,
/// then clipped to `target`.
///
/// Returns `None` when the spans are empty or the result clips away
/// entirely.
pub fn shadow_bounds(spans_bounds: IntRect, style: &ShadowStyle, target: IntRect) -> Option<IntRect> {
    if spans_bounds.is_empty() {
        return None;
    }

    let pad = (3.0 * style.blur).ceil() as i32;
    let ox = style.offset_x.round() as i32;
    let oy = style.offset_y.round() as i32;

    let expanded = IntRect::new(
        spans_bounds.left + ox - pad,
        spans_bounds.top + oy - pad,
        spans_bounds.right + ox + pad,
        spans_bounds.bottom + oy + pad,
    );

    expanded.intersect(&target)
}

/// Renders `spans` (offset by the shadow's own offset) as a solid fill
/// of `style.color` into a fresh `bounds`-sized surface, then
/// Gaussian-approximating box-blurs it in place.
pub fn render_shadow(spans: &SpanBuffer, style: &ShadowStyle, bounds: IntRect) -> Surface {
    let width = bounds.width().max(1);
    let height = bounds.height().max(1);
    let mut surface = Surface::new(width, height).expect("shadow bounds are validated non-empty");

    let ox = bounds.left - style.offset_x.round() as i32;
    let oy = bounds.top - style.offset_y.round() as i32;

    {
        let pixels = surface.pixels_mut();
        for span in spans.iter() {
            let y = span.y - oy;
            if y < 0 || y >= height as i32 {
                continue;
            }
            let row_start = y as usize * width as usize;
            for col in 0..span.len {
                let x = span.x + col - ox;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let coverage = crate::pixel::byte_mul(span.coverage, style.color.alpha());
                let c = PremultipliedColorU8::new(
                    crate::pixel::byte_mul(style.color.red(), span.coverage),
                    crate::pixel::byte_mul(style.color.green(), span.coverage),
                    crate::pixel::byte_mul(style.color.blue(), span.coverage),
                    coverage,
                );
                pixels[row_start + x as usize] = c.raw();
            }
        }
    }

    box_blur_surface(&mut surface, style.blur / 2.0, style.blur / 2.0);
    surface
}

/// Three-pass box blur approximating a Gaussian of standard deviation
/// `sigma_x`/`sigma_y`, per Kutskir's box-gauss radius formula.
fn box_blur_surface(surface: &mut Surface, sigma_x: f32, sigma_y: f32) {
    let width = surface.width() as usize;
    let height = surface.height() as usize;
    if width == 0 || height == 0 {
        return;
    }

    let radii_x = box_radii(sigma_x);
    let radii_y = box_radii(sigma_y);

    let mut channels = unpack_channels(surface.pixels());

    for i in 0..3 {
        for channel in channels.iter_mut() {
            box_blur_pass(channel, width, height, radii_x[i], radii_y[i]);
        }
    }

    let dst = surface.pixels_mut();
    repack_channels(&channels, dst);
}

/// Splits the unpremultiplied (but still premultiplied-in-storage) ARGB
/// buffer into four per-channel `f32` planes so the blur's running sum
/// doesn't re-pack/unpack a `u32` on every accumulation step.
fn unpack_channels(pixels: &[u32]) -> [Vec<f32>; 4] {
    let mut a = Vec::with_capacity(pixels.len());
    let mut r = Vec::with_capacity(pixels.len());
    let mut g = Vec::with_capacity(pixels.len());
    let mut b = Vec::with_capacity(pixels.len());
    for &raw in pixels {
        let p = PremultipliedColorU8::from_raw(raw);
        a.push(p.alpha() as f32);
        r.push(p.red() as f32);
        g.push(p.green() as f32);
        b.push(p.blue() as f32);
    }
    [a, r, g, b]
}

fn repack_channels(channels: &[Vec<f32>; 4], dst: &mut [u32]) {
    for i in 0..dst.len() {
        let a = channels[0][i].round().clamp(0.0, 255.0) as u8;
        let r = channels[1][i].round().clamp(0.0, a as f32) as u8;
        let g = channels[2][i].round().clamp(0.0, a as f32) as u8;
        let b = channels[3][i].round().clamp(0.0, a as f32) as u8;
        dst[i] = PremultipliedColorU8::new(r, g, b, a).raw();
    }
}

/// The three box radii approximating a Gaussian of the given sigma
/// (Kutskir's `create_box_gauss`, `n = 3`).
fn box_radii(sigma: f32) -> [usize; 3] {
    if sigma <= 0.0 {
        return [0, 0, 0];
    }

    let n = 3.0f32;
    let w_ideal = (12.0 * sigma * sigma / n).sqrt() + 1.0;
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wu = wl + 2;

    let wl_f = wl as f32;
    let m_ideal = (12.0 * sigma * sigma - n * wl_f * wl_f - 4.0 * n * wl_f - 3.0 * n) / (-4.0 * wl_f - 4.0);
    let m = m_ideal.round() as usize;

    let mut radii = [0usize; 3];
    for (i, r) in radii.iter_mut().enumerate() {
        let box_size = if i < m { wl } else { wu };
        *r = ((box_size.max(1) - 1) / 2) as usize;
    }
    radii
}

/// One horizontal-then-vertical box blur pass over a single channel
/// plane, using a sliding-window running sum per row/column. Samples
/// beyond the plane's edge are treated as zero (matching premultiplied
/// transparent padding, not edge-clamping).
fn box_blur_pass(plane: &mut [f32], width: usize, height: usize, radius_x: usize, radius_y: usize) {
    if radius_x > 0 {
        let mut row_buf = vec![0.0f32; width];
        for y in 0..height {
            let row = &plane[y * width..(y + 1) * width];
            row_buf.copy_from_slice(row);
            box_blur_1d(&row_buf, &mut plane[y * width..(y + 1) * width], radius_x);
        }
    }

    if radius_y > 0 {
        let mut col_in = vec![0.0f32; height];
        let mut col_out = vec![0.0f32; height];
        for x in 0..width {
            for y in 0..height {
                col_in[y] = plane[y * width + x];
            }
            box_blur_1d(&col_in, &mut col_out, radius_y);
            for y in 0..height {
                plane[y * width + x] = col_out[y];
            }
        }
    }
}

/// Sliding-window box blur of a single 1D signal, zero-padded outside
/// `[0, len)`.
fn box_blur_1d(src: &[f32], dst: &mut [f32], radius: usize) {
    let len = src.len();
    if len == 0 {
        return;
    }
    let window = (2 * radius + 1) as f32;

    let mut sum = 0.0f32;
    for i in 0..=radius.min(len - 1) {
        sum += src[i];
    }

    for i in 0..len {
        dst[i] = sum / window;

        let enter = i + radius + 1;
        if enter < len {
            sum += src[enter];
        }
        if i >= radius {
            let leave = i - radius;
            sum -= src[leave];
        }
    }
}
