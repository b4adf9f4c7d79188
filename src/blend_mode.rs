// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! CSS blend modes (`spec.md` section 4.G): twelve separable modes plus
//! four non-separable HSL modes, applied against unpremultiplied
//! channels before compositing back with `SrcOver`.

/// A CSS `mix-blend-mode` value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl Default for BlendMode {
    #[inline]
    fn default() -> Self {
        BlendMode::Normal
    }
}

impl BlendMode {
    #[inline]
    pub fn is_separable(self) -> bool {
        !matches!(self, BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Luminosity)
    }

    /// Blends unpremultiplied, `[0,1]`-ranged `src`/`dst` RGB triples.
    pub fn blend(self, src: [f32; 3], dst: [f32; 3]) -> [f32; 3] {
        if self.is_separable() {
            let f = separable_fn(self);
            [f(src[0], dst[0]), f(src[1], dst[1]), f(src[2], dst[2])]
        } else {
            blend_hsl(self, src, dst)
        }
    }
}

fn separable_fn(mode: BlendMode) -> fn(f32, f32) -> f32 {
    match mode {
        BlendMode::Normal => |s, _d| s,
        BlendMode::Multiply => |s, d| s * d,
        BlendMode::Screen => |s, d| s + d - s * d,
        BlendMode::Overlay => |s, d| hard_light(d, s),
        BlendMode::Darken => f32::min,
        BlendMode::Lighten => f32::max,
        BlendMode::ColorDodge => color_dodge,
        BlendMode::ColorBurn => color_burn,
        BlendMode::HardLight => |s, d| hard_light(s, d),
        BlendMode::SoftLight => soft_light,
        BlendMode::Difference => |s, d| (s - d).abs(),
        BlendMode::Exclusion => |s, d| s + d - 2.0 * s * d,
        _ => unreachable!("non-separable mode routed through blend_hsl"),
    }
}

fn color_dodge(s: f32, d: f32) -> f32 {
    if d == 0.0 {
        0.0
    } else if s == 1.0 {
        1.0
    } else {
        (d / (1.0 - s)).min(1.0)
    }
}

fn color_burn(s: f32, d: f32) -> f32 {
    if d == 1.0 {
        1.0
    } else if s == 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - d) / s).min(1.0)
    }
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn soft_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d - (1.0 - 2.0 * s) * d * (1.0 - d)
    } else {
        let g = if d <= 0.25 { ((16.0 * d - 12.0) * d + 4.0) * d } else { d.sqrt() };
        d + (2.0 * s - 1.0) * (g - d)
    }
}

// BT.709 luma weights, matching the CSS Compositing and Blending spec's
// non-separable `Lum`/`SetLum`/`ClipColor` helpers.
const LUM_R: f32 = 0.2126;
const LUM_G: f32 = 0.7152;
const LUM_B: f32 = 0.0722;

fn lum(c: [f32; 3]) -> f32 {
    LUM_R * c[0] + LUM_G * c[1] + LUM_B * c[2]
}

fn clip_color(mut c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);

    if n < 0.0 {
        for v in &mut c {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut c {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    c
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(mut c: [f32; 3], s: f32) -> [f32; 3] {
    let (mut lo, mut mid, mut hi) = (0usize, 1usize, 2usize);
    if c[lo] > c[mid] {
        std::mem::swap(&mut lo, &mut mid);
    }
    if c[mid] > c[hi] {
        std::mem::swap(&mut mid, &mut hi);
    }
    if c[lo] > c[mid] {
        std::mem::swap(&mut lo, &mut mid);
    }

    if c[hi] > c[lo] {
        c[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        c[hi] = s;
    } else {
        c[mid] = 0.0;
        c[hi] = 0.0;
    }
    c[lo] = 0.0;
    c
}

fn blend_hsl(mode: BlendMode, src: [f32; 3], dst: [f32; 3]) -> [f32; 3] {
    match mode {
        BlendMode::Hue => set_lum(set_sat(src, sat(dst)), lum(dst)),
        BlendMode::Saturation => set_lum(set_sat(dst, sat(src)), lum(dst)),
        BlendMode::Color => set_lum(src, lum(dst)),
        BlendMode::Luminosity => set_lum(dst, lum(src)),
        _ => unreachable!("separable mode routed through separable_fn"),
    }
}
