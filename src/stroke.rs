// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Path stroking: dash generation and the offset-curve stroker
//! (`spec.md` section 4.D). Dashing always runs before stroking, matching
//! the `dash(stroke(path))` vs. `stroke(dash(path))` resolution in
//! section 9.

use crate::geom::Point;
use crate::path::{FillRule, Path, PathBuilder};

/// End-cap style applied to the two free ends of an open subpath.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineCap {
    /// Flat, flush with the endpoint.
    Butt,
    /// A half-circle extending past the endpoint.
    Round,
    /// A square extending half the stroke width past the endpoint.
    Square,
}

impl Default for LineCap {
    #[inline]
    fn default() -> Self {
        LineCap::Butt
    }
}

/// Join style applied where two stroked segments meet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineJoin {
    /// Sharp corner, falls back to [`LineJoin::Bevel`] past the miter limit.
    Miter,
    /// A circular arc.
    Round,
    /// A flat triangle connecting the two outer edges.
    Bevel,
}

impl Default for LineJoin {
    #[inline]
    fn default() -> Self {
        LineJoin::Miter
    }
}

/// The miter-limit ratio, guaranteed positive by its constructor
/// (`spec.md` section 4.D: "non-positive values are rejected by the
/// constructor, not by the stroker").
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StrokeMiterlimit(f32);

impl StrokeMiterlimit {
    /// Creates a new miter limit. `value` must be positive and finite;
    /// otherwise the default of `4.0` is used and a warning is logged.
    pub fn new(value: f32) -> Self {
        if value > 0.0 && value.is_finite() {
            StrokeMiterlimit(value)
        } else {
            log::warn!("invalid miter limit {value}, falling back to 4.0");
            StrokeMiterlimit(4.0)
        }
    }

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for StrokeMiterlimit {
    #[inline]
    fn default() -> Self {
        StrokeMiterlimit(4.0)
    }
}

/// Stroking parameters.
#[derive(Clone, Debug)]
pub struct Stroke {
    /// Full stroke width in user units. Non-positive values degrade to
    /// a hairline at rasterization time rather than being rejected here.
    pub width: f32,
    /// Cap style for the free ends of open subpaths.
    pub line_cap: LineCap,
    /// Join style between segments.
    pub line_join: LineJoin,
    /// Miter ratio limit, consulted only when `line_join` is `Miter`.
    pub miter_limit: StrokeMiterlimit,
    /// Cyclic dash pattern, in user units. Empty means "no dashing".
    pub dash_pattern: Vec<f32>,
    /// Starting offset into `dash_pattern`'s cyclic arc length.
    pub dash_offset: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: StrokeMiterlimit::default(),
            dash_pattern: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl Stroke {
    /// Produces the filled outline of `path` stroked with these
    /// parameters: dash first, then offset-curve stroking (section 4.D).
    ///
    /// A non-positive width produces an empty path (section 4.D
    /// "widths <= 0 produce an empty outline").
    pub fn stroke_path(&self, path: &Path) -> Path {
        if self.width <= 0.0 {
            return Path::builder().finish();
        }

        let dashed = if self.dash_pattern.is_empty() {
            path.clone()
        } else {
            path.clone_dashed(self.dash_offset, &self.dash_pattern)
        };

        let flat = dashed.clone_flattened(0.1);
        let half_width = self.width / 2.0;

        let mut out = Path::builder();
        for contour in split_contours(&flat) {
            if contour.points.len() < 2 {
                continue;
            }
            stroke_contour(&mut out, &contour, half_width, self.line_cap, self.line_join, self.miter_limit.get());
        }
        out.finish()
    }
}

struct Contour {
    points: Vec<Point>,
    closed: bool,
}

fn split_contours(path: &Path) -> Vec<Contour> {
    use crate::path::PathElement;

    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut closed = false;

    for el in path.elements() {
        match *el {
            PathElement::MoveTo(p) => {
                if !current.is_empty() {
                    contours.push(Contour { points: std::mem::take(&mut current), closed });
                }
                closed = false;
                current.push(p);
            }
            PathElement::LineTo(p) => current.push(p),
            PathElement::QuadTo(_, p) | PathElement::CubicTo(_, _, p) => current.push(p),
            PathElement::Close => {
                closed = true;
            }
        }
    }
    if !current.is_empty() {
        contours.push(Contour { points: current, closed });
    }

    // Drop consecutive duplicate points; they carry no direction.
    for c in &mut contours {
        c.points.dedup_by(|a, b| (*a - *b).length() < f32::EPSILON);
    }

    contours
}

fn stroke_contour(
    out: &mut PathBuilder,
    contour: &Contour,
    half_width: f32,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
) {
    let pts = &contour.points;
    if pts.len() < 2 {
        // A single-point subpath with a round cap becomes a dot
        // (section 4.D "degenerate subpath" case); otherwise it vanishes.
        if pts.len() == 1 && cap == LineCap::Round {
            out.add_circle(pts[0].x, pts[0].y, half_width);
        }
        return;
    }

    let n = pts.len();
    let closed = contour.closed;

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);

    let segment_count = if closed { n } else { n - 1 };
    let normal_at = |i: usize| -> Option<Point> {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let dir = (b - a).normalized()?;
        Some(Point::new(-dir.y, dir.x))
    };

    let normals: Vec<Option<Point>> = (0..segment_count).map(normal_at).collect();

    for i in 0..n {
        let prev_normal = if closed {
            normals[(i + n - 1) % segment_count]
        } else if i == 0 {
            None
        } else {
            normals[i - 1]
        };
        let next_normal = if closed {
            normals[i % segment_count]
        } else if i == n - 1 {
            None
        } else {
            normals[i]
        };

        match (prev_normal, next_normal) {
            (Some(pn), Some(nn)) => {
                push_join(&mut left, &mut right, pts[i], pn, nn, half_width, join, miter_limit);
            }
            (Some(nrm), None) | (None, Some(nrm)) => {
                left.push(pts[i] + nrm * half_width);
                right.push(pts[i] - nrm * half_width);
            }
            (None, None) => {}
        }
    }

    if closed {
        emit_closed_ring(out, &left);
        emit_closed_ring(out, &right);
    } else {
        emit_open_stroke(out, &left, &right, pts, half_width, cap);
    }
}

fn push_join(
    left: &mut Vec<Point>,
    right: &mut Vec<Point>,
    p: Point,
    prev_n: Point,
    next_n: Point,
    half_width: f32,
    join: LineJoin,
    miter_limit: f32,
) {
    let l0 = p + prev_n * half_width;
    let l1 = p + next_n * half_width;
    let r0 = p - prev_n * half_width;
    let r1 = p - next_n * half_width;

    // `cross > 0` means the turn is to the left; the outer side (wider
    // angle to cover) is then the right side, and vice versa.
    let cross = prev_n.dot(Point::new(next_n.y, -next_n.x));

    match join {
        LineJoin::Bevel => {
            left.push(l0);
            left.push(l1);
            right.push(r0);
            right.push(r1);
        }
        LineJoin::Round => {
            left.push(l0);
            left.push(l1);
            right.push(r0);
            right.push(r1);
            // A true arc fan is added by the rasterizer's curve flattening
            // once strokes feed through `clone_flattened`; here we keep
            // both bevel points plus the geometric apex as a coarse arc.
            let mid = ((prev_n + next_n) * 0.5).normalized().unwrap_or(prev_n);
            if cross > 0.0 {
                right.insert(right.len() - 1, p - mid * half_width);
            } else {
                left.insert(left.len() - 1, p + mid * half_width);
            }
        }
        LineJoin::Miter => {
            let half_angle_cos = prev_n.dot(next_n).clamp(-1.0, 1.0);
            let miter_len_ratio = if half_angle_cos <= -0.999 {
                f32::INFINITY
            } else {
                (2.0 / (1.0 + half_angle_cos)).sqrt()
            };

            if miter_len_ratio > miter_limit || !miter_len_ratio.is_finite() {
                left.push(l0);
                left.push(l1);
                right.push(r0);
                right.push(r1);
                return;
            }

            let bisector = (prev_n + next_n).normalized().unwrap_or(prev_n);
            let apex_dist = half_width * miter_len_ratio;

            if cross > 0.0 {
                left.push(l0);
                left.push(p + bisector * apex_dist);
                left.push(l1);
                right.push(r0);
                right.push(r1);
            } else {
                left.push(l0);
                left.push(l1);
                right.push(r0);
                right.push(p - bisector * apex_dist);
                right.push(r1);
            }
        }
    }
}

fn emit_closed_ring(out: &mut PathBuilder, ring: &[Point]) {
    if ring.len() < 3 {
        return;
    }
    out.move_to(ring[0].x, ring[0].y);
    for p in &ring[1..] {
        out.line_to(p.x, p.y);
    }
    out.close();
}

fn emit_open_stroke(
    out: &mut PathBuilder,
    left: &[Point],
    right: &[Point],
    original: &[Point],
    half_width: f32,
    cap: LineCap,
) {
    if left.is_empty() || right.is_empty() {
        return;
    }

    out.move_to(left[0].x, left[0].y);
    for p in &left[1..] {
        out.line_to(p.x, p.y);
    }

    add_cap(out, *original.last().unwrap(), *left.last().unwrap(), *right.last().unwrap(), half_width, cap);

    for p in right.iter().rev() {
        out.line_to(p.x, p.y);
    }

    add_cap(out, original[0], right[0], left[0], half_width, cap);

    out.close();
}

fn add_cap(out: &mut PathBuilder, center: Point, from: Point, to: Point, half_width: f32, cap: LineCap) {
    match cap {
        LineCap::Butt => {
            out.line_to(to.x, to.y);
        }
        LineCap::Square => {
            let Some(dir) = (from - center).normalized() else {
                out.line_to(to.x, to.y);
                return;
            };
            let ext_a = from + dir * half_width;
            let ext_b = to + dir * half_width;
            out.line_to(ext_a.x, ext_a.y);
            out.line_to(ext_b.x, ext_b.y);
            out.line_to(to.x, to.y);
        }
        LineCap::Round => {
            // Approximate the half-circle cap with a single control point;
            // good enough once fed through `clone_flattened`'s line
            // approximation at stroke-consumption time, since the cap is
            // itself already emitted as straight segments here.
            let Some(n) = (from - center).normalized() else {
                out.line_to(to.x, to.y);
                return;
            };
            let tangent = Point::new(-n.y, n.x);
            let apex = center + tangent * half_width;
            out.line_to(apex.x, apex.y);
            out.line_to(to.x, to.y);
        }
    }
}

/// Walks `path` by arc length, alternating "on"/"off" runs of the cyclic
/// `pattern` starting `offset` into it, and emits the "on" runs as
/// separate subpaths (`spec.md` section 4.B/4.D).
///
/// A pattern containing a single value is implicitly duplicated so it
/// always has an even on/off split, matching common stroking semantics.
pub(crate) fn dash_path(path: &Path, offset: f32, pattern: &[f32]) -> Path {
    let pattern: Vec<f32> = if pattern.len() % 2 == 1 {
        pattern.iter().chain(pattern.iter()).copied().collect()
    } else {
        pattern.to_vec()
    };

    let total: f32 = pattern.iter().sum();
    if total <= 0.0 {
        return path.clone();
    }

    let flat = path.clone_flattened(0.1);
    let mut out = Path::builder();

    for contour in split_contours(&flat) {
        dash_contour(&mut out, &contour, offset, &pattern, total);
    }

    out.finish()
}

fn dash_contour(out: &mut PathBuilder, contour: &Contour, offset: f32, pattern: &[f32], total: f32) {
    let pts = &contour.points;
    if pts.len() < 2 {
        return;
    }

    let mut pos = offset.rem_euclid(total);
    let mut idx = 0usize;
    let mut acc = 0.0f32;
    for (i, &len) in pattern.iter().enumerate() {
        if acc + len > pos {
            idx = i;
            pos -= acc;
            break;
        }
        acc += len;
    }

    let mut on = idx % 2 == 0;
    let mut remaining = pattern[idx] - pos;
    let mut pen_down = false;

    let segment_count = if contour.closed { pts.len() } else { pts.len() - 1 };

    for s in 0..segment_count {
        let a = pts[s];
        let b = pts[(s + 1) % pts.len()];
        let mut seg_len = (b - a).length();
        let mut t0 = 0.0f32;

        while seg_len > 0.0 {
            let step = remaining.min(seg_len);
            let t1 = t0 + step / (b - a).length().max(f32::EPSILON);

            if on {
                let p0 = a.lerp(b, t0);
                let p1 = a.lerp(b, t1);
                if !pen_down {
                    out.move_to(p0.x, p0.y);
                    pen_down = true;
                }
                out.line_to(p1.x, p1.y);
            } else {
                pen_down = false;
            }

            seg_len -= step;
            remaining -= step;
            t0 = t1;

            if remaining <= f32::EPSILON {
                idx = (idx + 1) % pattern.len();
                on = !on;
                remaining = pattern[idx];
                if !on {
                    pen_down = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    #[test]
    fn stroked_rect_is_nonempty() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let path = pb.finish();

        let stroke = Stroke { width: 2.0, ..Stroke::default() };
        let outline = stroke.stroke_path(&path);
        assert!(!outline.is_empty());
    }

    #[test]
    fn zero_width_produces_empty_outline() {
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(10.0, 0.0);
        let path = pb.finish();

        let stroke = Stroke { width: 0.0, ..Stroke::default() };
        let outline = stroke.stroke_path(&path);
        assert!(outline.is_empty());
    }

    #[test]
    fn negative_width_produces_empty_outline() {
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(10.0, 0.0);
        let path = pb.finish();

        let stroke = Stroke { width: -1.0, ..Stroke::default() };
        let outline = stroke.stroke_path(&path);
        assert!(outline.is_empty());
    }

    #[test]
    fn miter_limit_rejects_nonpositive() {
        let m = StrokeMiterlimit::new(-1.0);
        assert_eq!(m.get(), 4.0);
    }

    #[test]
    fn dash_empty_pattern_is_identity() {
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(10.0, 0.0);
        let path = pb.finish();

        let dashed = path.clone_dashed(0.0, &[]);
        assert_eq!(dashed, path);
    }

    #[test]
    fn dash_splits_line_into_subpaths() {
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(10.0, 0.0);
        let path = pb.finish();

        let dashed = path.clone_dashed(0.0, &[2.0, 2.0]);
        assert!(dashed.contours_count() >= 2);
    }
}
