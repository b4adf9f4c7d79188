// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The analytic-AA scanline rasterizer (`spec.md` section 4.E): converts
//! a 26.6 fixed-point [`Outline`] into a sorted [`SpanBuffer`] of 8-bit
//! coverage, following the FreeType-`smooth`-class signed-area
//! accumulation algorithm.

use crate::outline::{Outline, RasterOptions};
use crate::path::FillRule;
use crate::span::{Span, SpanBuffer};

/// One 26.6 sub-pixel unit, `1/64`.
const ONE: i32 = 64;

/// Rasterizes `outline` into a span buffer clipped to `[0, width) x [0, height)`,
/// with antialiasing enabled.
///
/// Each row keeps one accumulator cell per pixel column (plus a
/// sentinel past the last column). Every edge crossing that row adds a
/// signed height split between the column it crosses and the column
/// immediately to its right; a running prefix sum then turns those
/// deltas into per-pixel winding, which the fill rule folds into
/// `0..=255` coverage.
pub fn rasterize(outline: &Outline, width: i32, height: i32, fill_rule: FillRule) -> SpanBuffer {
    rasterize_with_options(outline, width, height, fill_rule, RasterOptions::default())
}

/// Like [`rasterize`], but lets [`RasterOptions::antialias`] force the
/// scan path to threshold coverage to fully on or off instead of
/// producing graded edges.
pub fn rasterize_with_options(outline: &Outline, width: i32, height: i32, fill_rule: FillRule, options: RasterOptions) -> SpanBuffer {
    rasterize_into(outline, width, height, fill_rule, options, Vec::new())
}

/// Like [`rasterize_with_options`], but writes into `reuse` (a
/// caller-recycled span buffer, typically from a [`crate::arena::Arena`])
/// instead of allocating a fresh one.
pub fn rasterize_into(outline: &Outline, width: i32, height: i32, fill_rule: FillRule, options: RasterOptions, reuse: Vec<Span>) -> SpanBuffer {
    let Some(bounds) = outline.bounds() else {
        return SpanBuffer::reuse(reuse);
    };

    let y0 = bounds.top.max(0);
    let y1 = bounds.bottom.min(height);
    let x0 = bounds.left.max(0);
    let x1 = bounds.right.min(width);
    if y1 <= y0 || x1 <= x0 {
        return SpanBuffer::reuse(reuse);
    }

    let rows = (y1 - y0) as usize;
    let cols = (x1 - x0) as usize;
    let mut deltas = vec![0f32; rows * (cols + 1)];

    for c in 0..outline.contours_count() {
        let range = outline.contour_range(c);
        let pts = &outline.points[range];
        for w in pts.windows(2) {
            accumulate_edge(w[0], w[1], x0, y0, cols, rows, &mut deltas);
        }
    }

    let mut buffer = SpanBuffer::reuse(reuse);
    for row in 0..rows {
        let row_deltas = &deltas[row * (cols + 1)..row * (cols + 1) + cols + 1];
        let mut acc = 0f32;
        let mut run_start: Option<(i32, u8)> = None;

        for col in 0..cols {
            acc += row_deltas[col];
            let mut coverage = fill_rule_coverage(acc, fill_rule);
            if !options.antialias {
                coverage = if coverage >= 128 { 255 } else { 0 };
            }

            match run_start {
                Some((_, c)) if c == coverage => {}
                _ => {
                    if let Some((start_x, c)) = run_start.take() {
                        if c > 0 {
                            buffer.push(Span::new(start_x, x0 + col as i32 - start_x, y0 + row as i32, c));
                        }
                    }
                    run_start = Some((x0 + col as i32, coverage));
                }
            }
        }

        if let Some((start_x, c)) = run_start {
            if c > 0 {
                buffer.push(Span::new(start_x, x1 - start_x, y0 + row as i32, c));
            }
        }
    }

    buffer
}

/// Converts an accumulated signed winding value into an `0..=255`
/// coverage byte per `fill_rule`.
fn fill_rule_coverage(winding: f32, fill_rule: FillRule) -> u8 {
    let w = match fill_rule {
        FillRule::NonZero => winding.abs().min(1.0),
        FillRule::EvenOdd => {
            let w = winding.abs().rem_euclid(2.0);
            if w > 1.0 {
                2.0 - w
            } else {
                w
            }
        }
    };
    (w * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Splits the edge `(p0, p1)` (26.6 fixed point, in raster-global
/// coordinates) into per-scanline trapezoids and accumulates each into
/// `deltas`, a `rows x (cols + 1)` row-major buffer.
fn accumulate_edge(
    p0: (i32, i32),
    p1: (i32, i32),
    ox: i32,
    oy: i32,
    cols: usize,
    rows: usize,
    deltas: &mut [f32],
) {
    if p0.1 == p1.1 {
        // Horizontal edges contribute no winding.
        return;
    }

    let (x0, y0, x1, y1, dir) = if p0.1 < p1.1 {
        (p0.0, p0.1, p1.0, p1.1, 1.0f32)
    } else {
        (p1.0, p1.1, p0.0, p0.1, -1.0f32)
    };

    let dxdy = (x1 - x0) as f64 / (y1 - y0) as f64;

    let first_row = y0.div_euclid(ONE);
    let last_row = (y1 - 1).div_euclid(ONE);

    for row in first_row..=last_row {
        let r = row - oy;
        if r < 0 || r as usize >= rows {
            continue;
        }

        let row_top = row * ONE;
        let row_bottom = row_top + ONE;
        let seg_y0 = y0.max(row_top);
        let seg_y1 = y1.min(row_bottom);
        if seg_y1 <= seg_y0 {
            continue;
        }

        let seg_x0 = x0 as f64 + (seg_y0 - y0) as f64 * dxdy;
        let seg_x1 = x0 as f64 + (seg_y1 - y0) as f64 * dxdy;
        let height = (seg_y1 - seg_y0) as f32 / ONE as f32 * dir;

        let row_deltas = &mut deltas[r as usize * (cols + 1)..r as usize * (cols + 1) + cols + 1];
        accumulate_row_trapezoid(row_deltas, seg_x0, seg_x1, height, ox, cols);
    }
}

/// Distributes one row's worth of a trapezoid (edge spanning `x_a..x_b`
/// in 26.6 units, global coordinates, contributing `height` of signed
/// winding) across the row's per-column delta accumulator.
fn accumulate_row_trapezoid(row: &mut [f32], x_a: f64, x_b: f64, height: f32, ox: i32, cols: usize) {
    let one = ONE as f64;
    let (lo, hi) = if x_a <= x_b { (x_a, x_b) } else { (x_b, x_a) };

    // Columns are addressed relative to `ox`; clamp the crossing into
    // `[-1, cols]` so edges outside the raster window still contribute
    // their full height to the visible columns (or none at all).
    let to_col = |x: f64| -> i32 { (x / one).floor() as i32 - ox };
    let lo_col_raw = to_col(lo);
    let hi_col_raw = to_col(hi);

    let mut add = |col: i32, amount: f32| {
        let col = col.clamp(0, cols as i32);
        row[col as usize] += amount;
    };

    if lo_col_raw == hi_col_raw {
        let col = lo_col_raw;
        let col_left = (col + ox) as f64 * one;
        let mid_frac = (((lo + hi) / 2.0 - col_left) / one).clamp(0.0, 1.0) as f32;
        add(col, height * (1.0 - mid_frac));
        add(col + 1, height * mid_frac);
        return;
    }

    let total = hi - lo;
    let mut remaining = height;

    // Entry (leftmost, partial) column.
    let first_bound = ((lo_col_raw + ox) as f64 + 1.0) * one;
    let first_width = (first_bound - lo).max(0.0);
    let first_h = (height as f64 * (first_width / total)) as f32;
    let mid = (lo + first_bound) / 2.0;
    let col_left = (lo_col_raw + ox) as f64 * one;
    let frac = ((mid - col_left) / one).clamp(0.0, 1.0) as f32;
    add(lo_col_raw, first_h * (1.0 - frac));
    add(lo_col_raw + 1, first_h * frac);
    remaining -= first_h;

    // Interior columns, fully traversed: the edge exits exactly at
    // their right boundary, so each splits its height evenly.
    for col in (lo_col_raw + 1)..hi_col_raw {
        let col_width = one;
        let seg_h = (height as f64 * (col_width / total)) as f32;
        add(col, seg_h * 0.5);
        add(col + 1, seg_h * 0.5);
        remaining -= seg_h;
    }

    // Exit (rightmost, partial) column: whatever height is left.
    let last_bound = (hi_col_raw + ox) as f64 * one;
    let mid = (last_bound + hi) / 2.0;
    let frac = ((mid - last_bound) / one).clamp(0.0, 1.0) as f32;
    add(hi_col_raw, remaining * (1.0 - frac));
    add(hi_col_raw + 1, remaining * frac);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Rect, Transform};
    use crate::path::Path;

    #[test]
    fn solid_rect_has_full_coverage_interior() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(2.0, 2.0, 6.0, 6.0));
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let spans = rasterize(&outline, 10, 10, FillRule::NonZero);

        let hit = spans.iter().find(|s| s.y == 5).expect("row 5 should have a span");
        assert_eq!(hit.coverage, 255);
        assert_eq!(hit.x, 2);
        assert_eq!(hit.len, 6);
    }

    #[test]
    fn empty_outline_yields_no_spans() {
        let path = Path::default();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let spans = rasterize(&outline, 10, 10, FillRule::NonZero);
        assert!(spans.is_empty());
    }

    #[test]
    fn spans_are_sorted_and_nonoverlapping() {
        let mut pb = Path::builder();
        pb.add_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        pb.add_rect(Rect::new(7.0, 0.0, 5.0, 5.0));
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let spans = rasterize(&outline, 20, 20, FillRule::NonZero);

        let mut last: Option<(i32, i32)> = None;
        for s in spans.iter() {
            if let Some((ly, lx_end)) = last {
                assert!(s.y > ly || (s.y == ly && s.x >= lx_end));
            }
            last = Some((s.y, s.x + s.len));
        }
    }

    #[test]
    fn non_antialiased_option_thresholds_partial_coverage() {
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(8.0, 0.0);
        pb.line_to(0.0, 8.0);
        pb.close();
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let options = RasterOptions { antialias: false, ..RasterOptions::default() };
        let spans = rasterize_with_options(&outline, 8, 8, FillRule::NonZero, options);

        assert!(spans.iter().all(|s| s.coverage == 255));
    }

    #[test]
    fn triangle_has_tapering_edge_coverage() {
        // Right triangle with a slanted hypotenuse produces partial
        // coverage along the diagonal, not just 0/255.
        let mut pb = Path::builder();
        pb.move_to(0.0, 0.0);
        pb.line_to(8.0, 0.0);
        pb.line_to(0.0, 8.0);
        pb.close();
        let path = pb.finish();
        let outline = Outline::build(&path, &Transform::identity(), FillRule::NonZero);
        let spans = rasterize(&outline, 8, 8, FillRule::NonZero);

        let has_partial = spans.iter().any(|s| s.coverage > 0 && s.coverage < 255);
        assert!(has_partial);
    }
}
