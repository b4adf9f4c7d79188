// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Paint sources (`spec.md` section 4.H): solid color, gradients
//! (linear/radial/conic) backed by a precomputed color table, and
//! texture sampling.

use crate::color::{Color, PremultipliedColorU8};
use crate::geom::{Point, Transform};

/// How a gradient behaves outside its `[0, 1]` parameter range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpreadMode {
    Pad,
    Repeat,
    Reflect,
}

impl Default for SpreadMode {
    #[inline]
    fn default() -> Self {
        SpreadMode::Pad
    }
}

/// A single gradient color stop.
#[derive(Clone, Copy, Debug)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f32,
    pub color: Color,
}

/// Number of entries in a precomputed gradient lookup table
/// (section 4.H).
const GRADIENT_TABLE_SIZE: usize = 1024;

/// Whether a gradient interpolates in sRGB or linear-light space.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorSpace {
    Srgb,
    LinearRgb,
}

impl Default for ColorSpace {
    #[inline]
    fn default() -> Self {
        ColorSpace::Srgb
    }
}

/// Shape of a gradient's parameter space.
#[derive(Clone, Debug)]
pub enum GradientKind {
    Linear { p0: Point, p1: Point },
    Radial { center: Point, radius: f32, focus: Point },
    Conic { center: Point, angle: f32 },
}

/// A gradient paint: shape, spread, color space and a precomputed
/// `GRADIENT_TABLE_SIZE`-entry lookup table over `[0, 1]`.
#[derive(Clone, Debug)]
pub struct Gradient {
    pub kind: GradientKind,
    pub spread: SpreadMode,
    pub transform: Transform,
    table: Vec<PremultipliedColorU8>,
}

impl Gradient {
    /// Builds a gradient, precomputing its color table from `stops`.
    ///
    /// `stops` need not be sorted or deduplicated; degenerate input
    /// (fewer than one stop) logs a warning and yields a fully
    /// transparent table rather than an error (section 7).
    pub fn new(kind: GradientKind, spread: SpreadMode, transform: Transform, stops: &[GradientStop], space: ColorSpace, opacity: f32) -> Gradient {
        Gradient { kind, spread, transform, table: build_table(stops, space, opacity) }
    }

    /// Samples the table at parameter `t` (any real number; spread mode
    /// folds it back into `[0, 1]`).
    pub fn sample(&self, t: f32) -> PremultipliedColorU8 {
        let t = apply_spread(t, self.spread);
        let idx = ((t * (GRADIENT_TABLE_SIZE - 1) as f32).round() as usize).min(GRADIENT_TABLE_SIZE - 1);
        self.table[idx]
    }

    /// The gradient parameter `t` for a point already mapped into
    /// gradient space by `self.transform`'s inverse.
    ///
    /// Returns `None` for the documented degenerate radial case (equal
    /// center/focus and zero radius produce an all-zero quadratic).
    pub fn parameter_at(&self, p: Point) -> Option<f32> {
        match self.kind {
            GradientKind::Linear { p0, p1 } => {
                let d = p1 - p0;
                let len_sq = d.dot(d);
                if len_sq < f32::EPSILON {
                    return Some(0.0);
                }
                Some((p - p0).dot(d) / len_sq)
            }
            GradientKind::Radial { center, radius, focus } => radial_t(p, center, radius, focus),
            GradientKind::Conic { center, angle } => {
                let d = p - center;
                if d.x == 0.0 && d.y == 0.0 {
                    return Some(0.0);
                }
                let a = d.y.atan2(d.x) - angle.to_radians();
                let turns = a / (2.0 * std::f32::consts::PI);
                let t = turns - turns.floor();
                // At exact multiples of 2*pi the fractional part is
                // exactly zero, matching a hard seam at the start angle
                // rather than wrapping to 1.0 (documented open question).
                Some(t)
            }
        }
    }
}

/// Solves for the radial gradient parameter per the two-circle gradient
/// equation; returns `None` when the defining quadratic degenerates
/// (`spec.md` section 9: concentric gradient with equal radii writes
/// zero pixels rather than an arbitrary fallback value).
fn radial_t(p: Point, center: Point, radius: f32, focus: Point) -> Option<f32> {
    let cf = focus - center;
    let pf = p - focus;

    let a = radius * radius - cf.dot(cf);
    if a.abs() < f32::EPSILON {
        return None;
    }

    let b = 2.0 * pf.dot(cf);
    let c = -pf.dot(pf);

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t0 = (-b + sqrt_d) / (2.0 * a);
    let t1 = (-b - sqrt_d) / (2.0 * a);
    Some(t0.max(t1))
}

fn apply_spread(t: f32, spread: SpreadMode) -> f32 {
    match spread {
        SpreadMode::Pad => t.clamp(0.0, 1.0),
        SpreadMode::Repeat => t.rem_euclid(1.0),
        SpreadMode::Reflect => {
            let period = t.rem_euclid(2.0);
            if period > 1.0 {
                2.0 - period
            } else {
                period
            }
        }
    }
}

fn build_table(stops: &[GradientStop], space: ColorSpace, opacity: f32) -> Vec<PremultipliedColorU8> {
    let mut table = vec![PremultipliedColorU8::transparent(); GRADIENT_TABLE_SIZE];
    if stops.is_empty() {
        log::warn!("gradient has no stops, producing a transparent fill");
        return table;
    }

    let mut sorted: Vec<GradientStop> = stops.to_vec();
    sorted.sort_by(|a, b| a.offset.partial_cmp(&b.offset).unwrap_or(std::cmp::Ordering::Equal));

    for (i, entry) in table.iter_mut().enumerate() {
        let t = i as f32 / (GRADIENT_TABLE_SIZE - 1) as f32;
        *entry = sample_stops(&sorted, t, space).premultiply(opacity);
    }

    table
}

fn sample_stops(stops: &[GradientStop], t: f32, space: ColorSpace) -> Color {
    if stops.len() == 1 {
        return stops[0].color;
    }
    if t <= stops[0].offset {
        return stops[0].color;
    }
    if t >= stops[stops.len() - 1].offset {
        return stops[stops.len() - 1].color;
    }

    for w in stops.windows(2) {
        let (a, b) = (w[0], w[1]);
        if t >= a.offset && t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let local_t = (t - a.offset) / span;
            return interpolate_color(a.color, b.color, local_t, space);
        }
    }

    stops[stops.len() - 1].color
}

fn interpolate_color(a: Color, b: Color, t: f32, space: ColorSpace) -> Color {
    match space {
        ColorSpace::Srgb => Color::new(
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
            a.a + (b.a - a.a) * t,
        ),
        ColorSpace::LinearRgb => {
            let la = [Color::srgb_to_linear(a.r), Color::srgb_to_linear(a.g), Color::srgb_to_linear(a.b)];
            let lb = [Color::srgb_to_linear(b.r), Color::srgb_to_linear(b.g), Color::srgb_to_linear(b.b)];
            let lerp = |x: f32, y: f32| x + (y - x) * t;
            Color::new(
                Color::linear_to_srgb(lerp(la[0], lb[0])),
                Color::linear_to_srgb(lerp(la[1], lb[1])),
                Color::linear_to_srgb(lerp(la[2], lb[2])),
                a.a + (b.a - a.a) * t,
            )
        }
    }
}

/// 4x4 ordered (Bayer) dither matrix, used to break up gradient banding
/// when sampling the 1024-entry table at low precision displays.
const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Returns a dither bias in `[-8, 7]` for pixel `(x, y)`, added to a
/// quantized channel or table index before clamping (section 4.H).
pub fn bayer_dither(x: i32, y: i32) -> i32 {
    BAYER_4X4[(y & 3) as usize][(x & 3) as usize] as i32 - 8
}

/// How a texture repeats outside its own bounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileMode {
    Plain,
    Tiled,
}

/// Nearest-neighbor vs. bilinear texture sampling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterQuality {
    Nearest,
    Bilinear,
}

/// A texture paint source backed by an external premultiplied ARGB32
/// buffer (the image itself is decoded by an [`crate::hooks::ImageCodec`]
/// collaborator; this type only samples already-decoded pixels).
#[derive(Clone, Debug)]
pub struct Texture<'a> {
    pub pixels: &'a [u32],
    pub width: u32,
    pub height: u32,
    pub transform: Transform,
    pub tile_mode: TileMode,
    pub filter: FilterQuality,
    pub opacity: u8,
}

impl<'a> Texture<'a> {
    /// Samples the texture at image-space coordinates `(x, y)`.
    pub fn sample(&self, x: f32, y: f32) -> PremultipliedColorU8 {
        match self.filter {
            FilterQuality::Nearest => self.sample_nearest(x, y),
            FilterQuality::Bilinear => self.sample_bilinear(x, y),
        }
    }

    fn fetch(&self, ix: i32, iy: i32) -> PremultipliedColorU8 {
        let (ix, iy) = match self.tile_mode {
            TileMode::Plain => {
                if ix < 0 || iy < 0 || ix >= self.width as i32 || iy >= self.height as i32 {
                    return PremultipliedColorU8::transparent();
                }
                (ix, iy)
            }
            TileMode::Tiled => (ix.rem_euclid(self.width as i32), iy.rem_euclid(self.height as i32)),
        };
        PremultipliedColorU8::from_raw(self.pixels[(iy as u32 * self.width + ix as u32) as usize])
    }

    fn sample_nearest(&self, x: f32, y: f32) -> PremultipliedColorU8 {
        self.fetch(x.floor() as i32, y.floor() as i32)
    }

    fn sample_bilinear(&self, x: f32, y: f32) -> PremultipliedColorU8 {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let ix = fx.floor();
        let iy = fy.floor();
        let tx = fx - ix;
        let ty = fy - iy;

        let c00 = self.fetch(ix as i32, iy as i32);
        let c10 = self.fetch(ix as i32 + 1, iy as i32);
        let c01 = self.fetch(ix as i32, iy as i32 + 1);
        let c11 = self.fetch(ix as i32 + 1, iy as i32 + 1);

        let lerp_px = |a: PremultipliedColorU8, b: PremultipliedColorU8, t: f32| -> PremultipliedColorU8 {
            let t = (t * 255.0 + 0.5) as u8;
            PremultipliedColorU8::new(
                crate::pixel::interpolate_255(a.red(), b.red(), t),
                crate::pixel::interpolate_255(a.green(), b.green(), t),
                crate::pixel::interpolate_255(a.blue(), b.blue(), t),
                crate::pixel::interpolate_255(a.alpha(), b.alpha(), t),
            )
        };

        let top = lerp_px(c00, c10, tx);
        let bottom = lerp_px(c01, c11, tx);
        lerp_px(top, bottom, ty)
    }
}

/// A paint source to fill or stroke with.
pub enum Paint<'a> {
    Solid(PremultipliedColorU8),
    Gradient(Gradient),
    Texture(Texture<'a>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<GradientStop> {
        vec![
            GradientStop { offset: 0.0, color: Color::black() },
            GradientStop { offset: 1.0, color: Color::white() },
        ]
    }

    #[test]
    fn linear_gradient_endpoints_match_stops() {
        let g = Gradient::new(
            GradientKind::Linear { p0: Point::new(0.0, 0.0), p1: Point::new(10.0, 0.0) },
            SpreadMode::Pad,
            Transform::identity(),
            &stops(),
            ColorSpace::Srgb,
            1.0,
        );
        let start = g.sample(g.parameter_at(Point::new(0.0, 0.0)).unwrap());
        let end = g.sample(g.parameter_at(Point::new(10.0, 0.0)).unwrap());
        assert_eq!(start, Color::black().premultiply(1.0));
        assert_eq!(end, Color::white().premultiply(1.0));
    }

    #[test]
    fn repeat_spread_wraps() {
        assert!((apply_spread(1.5, SpreadMode::Repeat) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reflect_spread_mirrors() {
        assert!((apply_spread(1.5, SpreadMode::Reflect) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_zero_radius_radial_has_no_parameter() {
        let g = Gradient::new(
            GradientKind::Radial { center: Point::new(0.0, 0.0), radius: 0.0, focus: Point::new(0.0, 0.0) },
            SpreadMode::Pad,
            Transform::identity(),
            &stops(),
            ColorSpace::Srgb,
            1.0,
        );
        assert!(g.parameter_at(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn empty_stops_is_transparent() {
        let g = Gradient::new(
            GradientKind::Linear { p0: Point::new(0.0, 0.0), p1: Point::new(1.0, 0.0) },
            SpreadMode::Pad,
            Transform::identity(),
            &[],
            ColorSpace::Srgb,
            1.0,
        );
        assert_eq!(g.sample(0.5), PremultipliedColorU8::transparent());
    }

    #[test]
    fn nearest_texture_sample_reads_exact_pixel() {
        let pixels = [PremultipliedColorU8::new(1, 2, 3, 255).raw(), PremultipliedColorU8::new(4, 5, 6, 255).raw()];
        let tex = Texture {
            pixels: &pixels,
            width: 2,
            height: 1,
            transform: Transform::identity(),
            tile_mode: TileMode::Plain,
            filter: FilterQuality::Nearest,
            opacity: 255,
        };
        assert_eq!(tex.sample(1.5, 0.5), PremultipliedColorU8::new(4, 5, 6, 255));
    }

    #[test]
    fn plain_tile_outside_bounds_is_transparent() {
        let pixels = [PremultipliedColorU8::new(1, 2, 3, 255).raw()];
        let tex = Texture {
            pixels: &pixels,
            width: 1,
            height: 1,
            transform: Transform::identity(),
            tile_mode: TileMode::Plain,
            filter: FilterQuality::Nearest,
            opacity: 255,
        };
        assert_eq!(tex.sample(5.0, 5.0), PremultipliedColorU8::transparent());
    }
}
