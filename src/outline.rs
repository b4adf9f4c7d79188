// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The outline builder (`spec.md` section 4.C): flattens a [`Path`]'s
//! curves, applies the current transform, and emits 26.6 fixed-point
//! points ready for the scanline rasterizer.

use crate::geom::{to_26_6, Point, Transform};
use crate::path::{FillRule, Path, PathElement};

/// Chordal-deviation tolerance used when flattening curves into the
/// polylines the rasterizer consumes, in device pixels.
pub const FLATTEN_TOLERANCE: f32 = 0.1;

/// Tuning knobs threaded through both the outline builder and the
/// rasterizer, so tests and callers can trade flattening precision or
/// force the non-antialiased scan path.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RasterOptions {
    /// Chordal-deviation tolerance for curve flattening, in device
    /// pixels (`spec.md` section 4.E's 1/4-pixel subdivision threshold).
    pub tolerance: f32,
    /// When `false`, the rasterizer thresholds coverage to fully on or
    /// off at the pixel center instead of producing graded edges.
    pub antialias: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions { tolerance: 0.25, antialias: true }
    }
}

/// A flattened, 26.6 fixed-point outline: the rasterizer's only input.
///
/// Every point is on-curve; curves are subdivided into line segments
/// before reaching this stage (`spec.md` section 4.C).
#[derive(Clone, Debug, Default)]
pub struct Outline {
    /// 26.6 fixed-point `(x, y)` pairs.
    pub points: Vec<(i32, i32)>,
    /// Exclusive end index (into `points`) of each contour.
    pub contour_ends: Vec<u32>,
    /// The fill rule to rasterize with.
    pub fill_rule: FillRule,
}

impl Outline {
    /// Builds a flattened outline from `path` under `transform`.
    ///
    /// Curves are flattened in path space (a pre-transform tolerance of
    /// [`FLATTEN_TOLERANCE`]) before `transform` is applied; this keeps
    /// flattening cheap and transform-independent at the cost of being
    /// slightly conservative under large upscaling transforms.
    pub fn build(path: &Path, transform: &Transform, fill_rule: FillRule) -> Outline {
        Outline::build_with_options(path, transform, fill_rule, RasterOptions { tolerance: FLATTEN_TOLERANCE, ..RasterOptions::default() })
    }

    /// Like [`Outline::build`], but with an explicit flattening
    /// tolerance ([`RasterOptions::tolerance`]; `antialias` is the
    /// rasterizer's concern and has no effect here).
    pub fn build_with_options(path: &Path, transform: &Transform, fill_rule: FillRule, options: RasterOptions) -> Outline {
        Outline::build_reusing(path, transform, fill_rule, options, Outline::default())
    }

    /// Like [`Outline::build_with_options`], but reuses `reuse`'s
    /// `points`/`contour_ends` allocations instead of allocating fresh
    /// ones, typically a buffer pair handed back from a
    /// [`crate::arena::Arena`] (`spec.md` section 5 "Memory discipline").
    pub fn build_reusing(path: &Path, transform: &Transform, fill_rule: FillRule, options: RasterOptions, reuse: Outline) -> Outline {
        let flat = path.clone_flattened(options.tolerance);

        let mut points = reuse.points;
        let mut contour_ends = reuse.contour_ends;
        points.clear();
        contour_ends.clear();
        points.reserve(flat.points_count() as usize);
        contour_ends.reserve(flat.contours_count() as usize);

        let mut outline = Outline { points, contour_ends, fill_rule };

        let mut contour_start = Point::default();
        let mut has_open_contour = false;

        let push_point = |outline: &mut Outline, p: Point| {
            let mp = transform.map_point(p);
            outline.points.push((to_26_6(mp.x), to_26_6(mp.y)));
        };

        for el in flat.elements() {
            match *el {
                PathElement::MoveTo(p) => {
                    if has_open_contour {
                        outline.close_current_contour();
                        outline.contour_ends.push(outline.points.len() as u32);
                    }
                    contour_start = p;
                    push_point(&mut outline, p);
                    has_open_contour = true;
                }
                PathElement::LineTo(p) => {
                    push_point(&mut outline, p);
                }
                // `clone_flattened` never emits curve elements.
                PathElement::QuadTo(_, p) | PathElement::CubicTo(_, _, p) => {
                    push_point(&mut outline, p);
                }
                PathElement::Close => {
                    outline.close_current_contour();
                    outline.contour_ends.push(outline.points.len() as u32);
                    has_open_contour = false;
                }
            }
        }

        if has_open_contour {
            // Every contour rasterizes as a closed region regardless of
            // whether the source path explicitly closed it (section 3).
            outline.close_current_contour();
            outline.contour_ends.push(outline.points.len() as u32);
        }

        let _ = contour_start;
        outline
    }

    fn close_current_contour(&mut self) {
        let first_idx = self.contour_ends.last().copied().unwrap_or(0) as usize;
        if let (Some(&last), Some(&first)) = (self.points.last(), self.points.get(first_idx)) {
            if last != first {
                self.points.push(first);
            }
        }
    }

    /// Total number of contours.
    pub fn contours_count(&self) -> usize {
        self.contour_ends.len()
    }

    /// Returns the point range `[start, end)` for contour `i`.
    pub fn contour_range(&self, i: usize) -> std::ops::Range<usize> {
        let start = if i == 0 { 0 } else { self.contour_ends[i - 1] as usize };
        start..self.contour_ends[i] as usize
    }

    /// Integer bounding box over all points, in device pixels.
    pub fn bounds(&self) -> Option<crate::geom::IntRect> {
        if self.points.is_empty() {
            return None;
        }
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for &(x, y) in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(crate::geom::IntRect::new(
            crate::geom::from_26_6(min_x).floor() as i32,
            crate::geom::from_26_6(min_y).floor() as i32,
            crate::geom::from_26_6(max_x).ceil() as i32,
            crate::geom::from_26_6(max_y).ceil() as i32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    #[test]
    fn rect_outline_is_closed() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);

        assert_eq!(outline.contours_count(), 1);
        let range = outline.contour_range(0);
        let first = outline.points[range.start];
        let last = outline.points[range.end - 1];
        assert_eq!(first, last);
    }

    #[test]
    fn transform_is_applied_to_points() {
        let mut pb = Path::builder();
        pb.move_to(1.0, 1.0);
        pb.line_to(2.0, 2.0);
        pb.close();
        let path = pb.finish();

        let outline = Outline::build(&path, &Transform::from_scale(2.0, 2.0), FillRule::NonZero);
        assert_eq!(outline.points[0], (to_26_6(2.0), to_26_6(2.0)));
    }

    #[test]
    fn build_reusing_preserves_buffer_capacity() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let path = pb.finish();

        let mut scratch = Outline::default();
        scratch.points.reserve(64);
        scratch.contour_ends.reserve(8);
        let points_cap = scratch.points.capacity();
        let contour_ends_cap = scratch.contour_ends.capacity();

        let outline = Outline::build_reusing(&path, &Transform::identity(), FillRule::NonZero, RasterOptions::default(), scratch);
        assert!(outline.points.capacity() >= points_cap);
        assert!(outline.contour_ends.capacity() >= contour_ends_cap);
        assert_eq!(outline.contours_count(), 1);
    }

    #[test]
    fn bounds_matches_rect() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(1.0, 2.0, 10.0, 5.0));
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let b = outline.bounds().unwrap();
        assert_eq!((b.left, b.top, b.right, b.bottom), (1, 2, 11, 7));
    }
}
