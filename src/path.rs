// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The path data model: a sequence of draw commands plus the
//! construction, flattening, dashing and bounds operations of `spec.md`
//! §4.B.

use std::rc::Rc;

use crate::geom::{Point, Rect, Transform};

/// Control-point ratio for approximating a quarter circle with a single
/// cubic Bezier (`k = 0.5522847498...`, `spec.md` section 4.B).
pub const ARC_MAGIC: f32 = 0.552_284_75;

/// A single drawing command.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PathElement {
    /// Starts a new contour at the given point.
    MoveTo(Point),
    /// A straight line to the given point.
    LineTo(Point),
    /// A quadratic Bezier curve, `(control, end)`.
    QuadTo(Point, Point),
    /// A cubic Bezier curve, `(control1, control2, end)`.
    CubicTo(Point, Point, Point),
    /// Closes the current contour back to its `MoveTo` point.
    Close,
}

/// The fill rule used to decide "inside" for self-intersecting paths.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FillRule {
    /// Non-zero winding rule.
    NonZero,
    /// Even-odd crossing rule.
    EvenOdd,
}

impl Default for FillRule {
    #[inline]
    fn default() -> Self {
        FillRule::NonZero
    }
}

#[derive(Clone, Debug, Default)]
struct PathData {
    elements: Vec<PathElement>,
    n_points: u32,
    n_contours: u32,
    n_curves: u32,
}

/// An immutable-by-value sequence of path elements.
///
/// Cheap to clone: the backing storage is reference-counted and only
/// duplicated on the next mutation (copy-on-write, `spec.md` §3
/// "Lifecycles").
#[derive(Clone, Debug)]
pub struct Path {
    data: Rc<PathData>,
}

impl Default for Path {
    fn default() -> Self {
        Path { data: Rc::new(PathData::default()) }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.data.elements == other.data.elements
    }
}

impl Path {
    /// Starts building a new, empty path.
    pub fn builder() -> PathBuilder {
        PathBuilder { data: PathData::default(), start: None, is_open: false }
    }

    /// Iterates over the path's elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &PathElement> {
        self.data.elements.iter()
    }

    /// Number of points across all elements (§3 cached counts).
    pub fn points_count(&self) -> u32 {
        self.data.n_points
    }

    /// Number of contours (`MoveTo` occurrences).
    pub fn contours_count(&self) -> u32 {
        self.data.n_contours
    }

    /// Number of quad/cubic curve elements.
    pub fn curves_count(&self) -> u32 {
        self.data.n_curves
    }

    /// Whether the path has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.elements.is_empty()
    }

    /// Produces a new path with curves replaced by polylines whose
    /// chordal deviation from the original curve is at most `tolerance`.
    pub fn clone_flattened(&self, tolerance: f32) -> Path {
        let mut pb = Path::builder();
        let mut current = Point::default();
        let mut start = Point::default();

        for el in self.elements() {
            match *el {
                PathElement::MoveTo(p) => {
                    pb.move_to(p.x, p.y);
                    current = p;
                    start = p;
                }
                PathElement::LineTo(p) => {
                    pb.line_to(p.x, p.y);
                    current = p;
                }
                PathElement::QuadTo(c, p) => {
                    flatten_quad(current, c, p, tolerance, &mut pb);
                    current = p;
                }
                PathElement::CubicTo(c1, c2, p) => {
                    flatten_cubic(current, c1, c2, p, tolerance, &mut pb);
                    current = p;
                }
                PathElement::Close => {
                    pb.close();
                    current = start;
                }
            }
        }

        pb.finish()
    }

    /// Produces a new path that is the dashed outline of this path:
    /// alternating "pen-down"/"pen-up" subpaths walked by arc length
    /// starting at `offset` into the cyclic `pattern` (§4.B).
    ///
    /// An empty `pattern` means "no dashing" and returns a clone.
    pub fn clone_dashed(&self, offset: f32, pattern: &[f32]) -> Path {
        if pattern.is_empty() || pattern.iter().all(|v| *v <= 0.0) {
            return self.clone();
        }

        crate::stroke::dash_path(self, offset, pattern)
    }

    /// The tight bounding box of the path, after flattening.
    pub fn bounds(&self) -> Rect {
        let flat = self.clone_flattened(0.1);
        let mut bbox = Rect::new_bbox();
        let mut last = Point::default();
        for el in flat.elements() {
            match *el {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => {
                    bbox.expand(Rect::new(p.x, p.y, 0.0, 0.0));
                    last = p;
                }
                PathElement::QuadTo(_, p) | PathElement::CubicTo(_, _, p) => {
                    bbox.expand(Rect::new(p.x, p.y, 0.0, 0.0));
                    last = p;
                }
                PathElement::Close => {}
            }
        }
        let _ = last;
        bbox
    }

    /// Applies `ts` to every point in the path, returning a new path.
    pub fn transformed(&self, ts: &Transform) -> Path {
        if ts.is_identity() {
            return self.clone();
        }

        let map = |p: Point| ts.map_point(p);
        let mut pb = Path::builder();
        for el in self.elements() {
            match *el {
                PathElement::MoveTo(p) => pb.move_to_pt(map(p)),
                PathElement::LineTo(p) => pb.line_to_pt(map(p)),
                PathElement::QuadTo(c, p) => pb.quad_to_pt(map(c), map(p)),
                PathElement::CubicTo(c1, c2, p) => pb.cubic_to_pt(map(c1), map(c2), map(p)),
                PathElement::Close => pb.close(),
            }
        }
        pb.finish()
    }
}

/// Builder for [`Path`]; mirrors the append-only mutation API of
/// `spec.md` §4.B.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    data: PathData,
    start: Option<Point>,
    is_open: bool,
}

impl PathBuilder {
    /// Starts a new contour at `(x, y)`.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.move_to_pt(Point::new(x, y));
    }

    pub(crate) fn move_to_pt(&mut self, p: Point) {
        self.data.elements.push(PathElement::MoveTo(p));
        self.data.n_points += 1;
        self.data.n_contours += 1;
        self.start = Some(p);
        self.is_open = true;
    }

    /// Appends a line to `(x, y)`.
    ///
    /// A no-op (per §4.B "degenerate operations append nothing") if no
    /// contour has been started yet.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.line_to_pt(Point::new(x, y));
    }

    pub(crate) fn line_to_pt(&mut self, p: Point) {
        if !self.is_open {
            return;
        }
        self.data.elements.push(PathElement::LineTo(p));
        self.data.n_points += 1;
    }

    /// Appends a quadratic Bezier curve.
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.quad_to_pt(Point::new(cx, cy), Point::new(x, y));
    }

    pub(crate) fn quad_to_pt(&mut self, c: Point, p: Point) {
        if !self.is_open {
            return;
        }
        self.data.elements.push(PathElement::QuadTo(c, p));
        self.data.n_points += 2;
        self.data.n_curves += 1;
    }

    /// Appends a cubic Bezier curve.
    pub fn cubic_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.cubic_to_pt(Point::new(c1x, c1y), Point::new(c2x, c2y), Point::new(x, y));
    }

    pub(crate) fn cubic_to_pt(&mut self, c1: Point, c2: Point, p: Point) {
        if !self.is_open {
            return;
        }
        self.data.elements.push(PathElement::CubicTo(c1, c2, p));
        self.data.n_points += 3;
        self.data.n_curves += 1;
    }

    /// Closes the current contour.
    ///
    /// A no-op if no contour is open; every contour's `Close` is
    /// optional per the invariants in §3.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.data.elements.push(PathElement::Close);
        self.is_open = false;
    }

    /// Appends an axis-aligned rectangle as a closed contour.
    ///
    /// A zero/negative-sized rect appends nothing (§4.B degenerate case).
    pub fn add_rect(&mut self, rect: Rect) {
        if !rect.is_valid() {
            return;
        }
        self.move_to(rect.x, rect.y);
        self.line_to(rect.right(), rect.y);
        self.line_to(rect.right(), rect.bottom());
        self.line_to(rect.x, rect.bottom());
        self.close();
    }

    /// Appends a rounded rectangle. Falls back to [`Self::add_rect`]
    /// when `rx`/`ry` are non-positive.
    pub fn add_round_rect(&mut self, rect: Rect, rx: f32, ry: f32) {
        if !rect.is_valid() {
            return;
        }
        if rx <= 0.0 || ry <= 0.0 {
            self.add_rect(rect);
            return;
        }

        let rx = rx.min(rect.width / 2.0);
        let ry = ry.min(rect.height / 2.0);
        let kx = rx * ARC_MAGIC;
        let ky = ry * ARC_MAGIC;

        let (x, y, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());

        self.move_to(x + rx, y);
        self.line_to(r - rx, y);
        self.cubic_to(r - rx + kx, y, r, y + ry - ky, r, y + ry);
        self.line_to(r, b - ry);
        self.cubic_to(r, b - ry + ky, r - rx + kx, b, r - rx, b);
        self.line_to(x + rx, b);
        self.cubic_to(x + rx - kx, b, x, b - ry + ky, x, b - ry);
        self.line_to(x, y + ry);
        self.cubic_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
        self.close();
    }

    /// Appends an axis-aligned ellipse centered at `(cx, cy)`.
    ///
    /// A zero-radius ellipse appends nothing (§4.B degenerate case).
    pub fn add_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }

        let kx = rx * ARC_MAGIC;
        let ky = ry * ARC_MAGIC;

        self.move_to(cx + rx, cy);
        self.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        self.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        self.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        self.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        self.close();
    }

    /// Appends a circle, shorthand for [`Self::add_ellipse`] with equal radii.
    pub fn add_circle(&mut self, cx: f32, cy: f32, r: f32) {
        self.add_ellipse(cx, cy, r, r);
    }

    /// Appends an arc of an ellipse from `start_angle` through `sweep_angle`
    /// (both in degrees), decomposed into at most four cubics per
    /// quadrant (§4.B).
    pub fn add_arc(&mut self, cx: f32, cy: f32, r: f32, start_angle: f32, sweep_angle: f32) {
        if r <= 0.0 || sweep_angle == 0.0 {
            return;
        }

        let segments = (sweep_angle.abs() / 90.0).ceil().max(1.0) as u32;
        let step = sweep_angle / segments as f32;

        let point_at = |angle_deg: f32| {
            let rad = angle_deg.to_radians();
            Point::new(cx + r * rad.cos(), cy + r * rad.sin())
        };

        let first = point_at(start_angle);
        self.move_to(first.x, first.y);

        let mut angle = start_angle;
        for _ in 0..segments {
            let next_angle = angle + step;
            arc_segment_cubic(self, cx, cy, r, angle, next_angle);
            angle = next_angle;
        }
    }

    /// SVG-compatible elliptical arc to `(x, y)`, honoring the
    /// large-arc/sweep flags (§4.B). Decomposed into at most four cubics
    /// per quadrant via [`Self::add_arc`]-style stepping.
    pub fn arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        let Some(start) = self.last_point() else { return };
        let end = Point::new(x, y);

        if rx.abs() < f32::EPSILON || ry.abs() < f32::EPSILON {
            self.line_to(x, y);
            return;
        }

        if (start.x - end.x).abs() < f32::EPSILON && (start.y - end.y).abs() < f32::EPSILON {
            // Identical endpoints: no arc is drawn (SVG spec).
            return;
        }

        let Some((cx, cy, rx, ry, start_angle, sweep_angle)) =
            endpoint_to_center(start, end, rx, ry, x_axis_rotation, large_arc, sweep)
        else {
            self.line_to(x, y);
            return;
        };

        let segments = (sweep_angle.abs() / 90.0).ceil().max(1.0) as u32;
        let step = sweep_angle / segments as f32;
        let rot = x_axis_rotation.to_radians();

        let mut angle = start_angle;
        for i in 0..segments {
            let next_angle = angle + step;
            arc_segment_cubic_rotated(self, cx, cy, rx, ry, rot, angle, next_angle, i == segments - 1, end);
            angle = next_angle;
        }
    }

    fn last_point(&self) -> Option<Point> {
        for el in self.data.elements.iter().rev() {
            return Some(match *el {
                PathElement::MoveTo(p)
                | PathElement::LineTo(p)
                | PathElement::QuadTo(_, p)
                | PathElement::CubicTo(_, _, p) => p,
                PathElement::Close => continue,
            });
        }
        None
    }

    /// Finalizes the builder into an immutable [`Path`].
    pub fn finish(self) -> Path {
        Path { data: Rc::new(self.data) }
    }
}

/// Decomposes one quadrant-or-smaller arc segment (degrees) into a single
/// cubic Bezier and appends it.
fn arc_segment_cubic(pb: &mut PathBuilder, cx: f32, cy: f32, r: f32, a0: f32, a1: f32) {
    let (s0, c0) = a0.to_radians().sin_cos();
    let (s1, c1) = a1.to_radians().sin_cos();
    let sweep = (a1 - a0).to_radians();
    let k = (4.0 / 3.0) * (sweep / 4.0).tan();

    let p0 = Point::new(cx + r * c0, cy + r * s0);
    let p3 = Point::new(cx + r * c1, cy + r * s1);
    let c1p = Point::new(p0.x - k * r * s0, p0.y + k * r * c0);
    let c2p = Point::new(p3.x + k * r * s1, p3.y - k * r * c1);

    pb.cubic_to(c1p.x, c1p.y, c2p.x, c2p.y, p3.x, p3.y);
}

#[allow(clippy::too_many_arguments)]
fn arc_segment_cubic_rotated(
    pb: &mut PathBuilder,
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    rot: f32,
    a0: f32,
    a1: f32,
    is_last: bool,
    end: Point,
) {
    let (s0, c0) = a0.sin_cos();
    let (s1, c1) = a1.sin_cos();
    let sweep = a1 - a0;
    let k = (4.0 / 3.0) * (sweep / 4.0).tan();

    let ellipse_pt = |cos_a: f32, sin_a: f32| {
        let ex = rx * cos_a;
        let ey = ry * sin_a;
        Point::new(cx + ex * rot.cos() - ey * rot.sin(), cy + ex * rot.sin() + ey * rot.cos())
    };
    let ellipse_tangent = |cos_a: f32, sin_a: f32| {
        let ex = -rx * sin_a;
        let ey = ry * cos_a;
        Point::new(ex * rot.cos() - ey * rot.sin(), ex * rot.sin() + ey * rot.cos())
    };

    let p0 = ellipse_pt(c0, s0);
    let mut p3 = ellipse_pt(c1, s1);
    let t0 = ellipse_tangent(c0, s0);
    let t3 = ellipse_tangent(c1, s1);

    let c1p = Point::new(p0.x + k * t0.x, p0.y + k * t0.y);
    let c2p = Point::new(p3.x - k * t3.x, p3.y - k * t3.y);

    if is_last {
        // Snap to the caller's exact endpoint to avoid float drift.
        p3 = end;
    }

    pb.cubic_to(c1p.x, c1p.y, c2p.x, c2p.y, p3.x, p3.y);
}

/// SVG endpoint-to-center arc parameterization. Returns
/// `(cx, cy, rx, ry, start_angle_rad, sweep_angle_rad)`.
fn endpoint_to_center(
    p0: Point,
    p1: Point,
    mut rx: f32,
    mut ry: f32,
    x_axis_rotation: f32,
    large_arc: bool,
    sweep: bool,
) -> Option<(f32, f32, f32, f32, f32, f32)> {
    rx = rx.abs();
    ry = ry.abs();
    let phi = x_axis_rotation.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let dx2 = (p0.x - p1.x) / 2.0;
    let dy2 = (p0.y - p1.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = (rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p).max(0.0);
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    if den < f32::EPSILON {
        return None;
    }
    let mut co = (num / den).sqrt();
    if large_arc == sweep {
        co = -co;
    }

    let cxp = co * (rx * y1p / ry);
    let cyp = co * (-ry * x1p / rx);

    let cx = cos_phi * cxp - sin_phi * cyp + (p0.x + p1.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (p0.y + p1.y) / 2.0;

    let angle = |ux: f32, uy: f32, vx: f32, vy: f32| -> f32 {
        let dot = ux * vx + uy * vy;
        let len = ((ux * ux + uy * uy) * (vx * vx + vy * vy)).sqrt();
        let mut a = (dot / len).clamp(-1.0, 1.0).acos();
        if ux * vy - uy * vx < 0.0 {
            a = -a;
        }
        a
    };

    let start_angle = angle(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut sweep_angle = angle(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );

    if !sweep && sweep_angle > 0.0 {
        sweep_angle -= 2.0 * std::f32::consts::PI;
    } else if sweep && sweep_angle < 0.0 {
        sweep_angle += 2.0 * std::f32::consts::PI;
    }

    Some((cx, cy, rx, ry, start_angle.to_degrees(), sweep_angle.to_degrees()))
}

/// Recursively subdivides a quadratic Bezier until the control point is
/// within `tolerance` of the chord, emitting line segments (§4.B/§4.E).
fn flatten_quad(p0: Point, c: Point, p1: Point, tolerance: f32, pb: &mut PathBuilder) {
    if quad_flatness(p0, c, p1) <= tolerance {
        pb.line_to(p1.x, p1.y);
        return;
    }

    let p01 = p0.lerp(c, 0.5);
    let p12 = c.lerp(p1, 0.5);
    let mid = p01.lerp(p12, 0.5);

    flatten_quad(p0, p01, mid, tolerance, pb);
    flatten_quad(mid, p12, p1, tolerance, pb);
}

fn quad_flatness(p0: Point, c: Point, p1: Point) -> f32 {
    point_line_distance(c, p0, p1)
}

/// Recursively subdivides a cubic Bezier until both control points are
/// within `tolerance` of the chord.
fn flatten_cubic(p0: Point, c1: Point, c2: Point, p1: Point, tolerance: f32, pb: &mut PathBuilder) {
    if cubic_flatness(p0, c1, c2, p1) <= tolerance {
        pb.line_to(p1.x, p1.y);
        return;
    }

    let p01 = p0.lerp(c1, 0.5);
    let p12 = c1.lerp(c2, 0.5);
    let p23 = c2.lerp(p1, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);

    flatten_cubic(p0, p01, p012, mid, tolerance, pb);
    flatten_cubic(mid, p123, p23, p1, tolerance, pb);
}

fn cubic_flatness(p0: Point, c1: Point, c2: Point, p1: Point) -> f32 {
    point_line_distance(c1, p0, p1).max(point_line_distance(c2, p0, p1))
}

fn point_line_distance(p: Point, a: Point, b: Point) -> f32 {
    let len = (b - a).length();
    if len < f32::EPSILON {
        return (p - a).length();
    }
    ((b.x - a.x) * (a.y - p.y) - (a.x - p.x) * (b.y - a.y)).abs() / len
}
