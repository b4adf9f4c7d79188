// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Span algebra (`spec.md` section 4.F): the sorted run-length coverage
//! representation shared by the rasterizer, clip regions and masks, plus
//! intersection, rect-clipping, extents and point-hit tests.

use crate::geom::IntRect;

/// A single horizontal run of pixels with uniform antialiasing coverage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    /// Leftmost pixel column.
    pub x: i32,
    /// Run length in pixels; always positive.
    pub len: i32,
    /// Scanline row.
    pub y: i32,
    /// Coverage in `1..=255` (a zero-coverage span is never stored).
    pub coverage: u8,
}

impl Span {
    #[inline]
    pub fn new(x: i32, len: i32, y: i32, coverage: u8) -> Self {
        Span { x, len, y, coverage }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.len
    }
}

/// A sorted, non-overlapping sequence of [`Span`]s with a cached bounds
/// rectangle, invalidated lazily on mutation.
///
/// Invariants (`spec.md` section 3): spans are sorted by `(y, x)`;
/// within a scanline they never overlap; `len > 0`; `coverage > 0`.
#[derive(Clone, Debug, Default)]
pub struct SpanBuffer {
    spans: Vec<Span>,
    bounds: Option<IntRect>,
}

impl SpanBuffer {
    /// Appends a span. Caller must uphold sort order; used by the
    /// rasterizer, which already emits in `(y, x)` order.
    pub(crate) fn push(&mut self, span: Span) {
        debug_assert!(span.len > 0 && span.coverage > 0);
        self.bounds = None;
        self.spans.push(span);
    }

    /// Wraps a caller-recycled `Vec<Span>` (cleared, capacity kept) as a
    /// fresh buffer, letting the rasterizer reuse scratch allocations
    /// across draw calls (`spec.md` section 5 "Memory discipline").
    pub(crate) fn reuse(mut buf: Vec<Span>) -> SpanBuffer {
        buf.clear();
        SpanBuffer { spans: buf, bounds: None }
    }

    /// Reclaims the backing `Vec<Span>`, discarding the cached bounds.
    pub(crate) fn into_spans(self) -> Vec<Span> {
        self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    /// Builds a fully-opaque span buffer covering `w x h` pixels at
    /// `(x, y)` (`spec.md` section 4.F "init-from-rect").
    pub fn from_rect(x: i32, y: i32, w: i32, h: i32) -> SpanBuffer {
        let mut buf = SpanBuffer::default();
        if w <= 0 || h <= 0 {
            return buf;
        }
        for row in 0..h {
            buf.push(Span::new(x, w, y + row, 255));
        }
        buf
    }

    /// Builds a canonical span buffer from a set of possibly-overlapping
    /// rectangles, merging per scanline (section 4.F "init-from-region").
    pub fn from_region(rects: &[IntRect]) -> SpanBuffer {
        let mut buf = SpanBuffer::default();
        let valid: Vec<&IntRect> = rects.iter().filter(|r| !r.is_empty()).collect();
        if valid.is_empty() {
            return buf;
        }

        let min_y = valid.iter().map(|r| r.top).min().unwrap();
        let max_y = valid.iter().map(|r| r.bottom).max().unwrap();

        for y in min_y..max_y {
            let mut intervals: Vec<(i32, i32)> =
                valid.iter().filter(|r| y >= r.top && y < r.bottom).map(|r| (r.left, r.right)).collect();
            if intervals.is_empty() {
                continue;
            }
            intervals.sort_by_key(|i| i.0);

            let mut merged: Vec<(i32, i32)> = Vec::new();
            for (lo, hi) in intervals {
                if let Some(last) = merged.last_mut() {
                    if lo <= last.1 {
                        last.1 = last.1.max(hi);
                        continue;
                    }
                }
                merged.push((lo, hi));
            }

            for (lo, hi) in merged {
                buf.push(Span::new(lo, hi - lo, y, 255));
            }
        }

        buf
    }

    /// Intersects two span buffers, multiplying overlapping coverage
    /// (`byte_mul`-style: `(a*b + 127) / 255`), used to combine clip
    /// masks.
    pub fn intersect(&self, other: &SpanBuffer) -> SpanBuffer {
        let mut result = SpanBuffer::default();

        let mut j = 0;
        let by_row: Vec<&Span> = other.spans.iter().collect();

        for a in &self.spans {
            while j < by_row.len() && (by_row[j].y < a.y || (by_row[j].y == a.y && by_row[j].right() <= a.x)) {
                j += 1;
            }
            let mut k = j;
            while k < by_row.len() && by_row[k].y == a.y && by_row[k].x < a.right() {
                let b = by_row[k];
                let lo = a.x.max(b.x);
                let hi = a.right().min(b.right());
                if hi > lo {
                    let cov = crate::pixel::byte_mul(a.coverage, b.coverage);
                    if cov > 0 {
                        result.push(Span::new(lo, hi - lo, a.y, cov));
                    }
                }
                k += 1;
            }
        }

        result
    }

    /// Clips to an [`IntRect`], dropping or trimming spans outside it;
    /// coverage values are unchanged (section 4.F "Clip to IntRect").
    pub fn clip_to_rect(&self, rect: &IntRect) -> SpanBuffer {
        let mut result = SpanBuffer::default();
        if rect.is_empty() {
            return result;
        }
        for s in &self.spans {
            if s.y < rect.top || s.y >= rect.bottom {
                continue;
            }
            let lo = s.x.max(rect.left);
            let hi = s.right().min(rect.right);
            if hi > lo {
                result.push(Span::new(lo, hi - lo, s.y, s.coverage));
            }
        }
        result
    }

    /// The bounding box of all spans, computed (and cached) on demand.
    pub fn extents(&mut self) -> Option<IntRect> {
        if self.bounds.is_none() && !self.spans.is_empty() {
            let mut r = IntRect::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN);
            for s in &self.spans {
                r.left = r.left.min(s.x);
                r.right = r.right.max(s.right());
                r.top = r.top.min(s.y);
                r.bottom = r.bottom.max(s.y + 1);
            }
            self.bounds = Some(r);
        }
        self.bounds
    }

    /// Whether some span covers `floor(x), floor(y)` with nonzero
    /// coverage (section 4.F "Point-hit").
    pub fn point_hit(&self, x: f32, y: f32) -> bool {
        let (px, py) = (x.floor() as i32, y.floor() as i32);
        self.spans.iter().any(|s| s.y == py && px >= s.x && px < s.right())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rect_is_fully_opaque() {
        let buf = SpanBuffer::from_rect(0, 0, 4, 2);
        assert_eq!(buf.len(), 2);
        assert!(buf.iter().all(|s| s.coverage == 255));
    }

    #[test]
    fn from_region_merges_overlaps() {
        let rects = [IntRect::from_xywh(0, 0, 10, 5), IntRect::from_xywh(5, 0, 10, 5)];
        let buf = SpanBuffer::from_region(&rects);
        for y in 0..5 {
            let row: Vec<_> = buf.iter().filter(|s| s.y == y).collect();
            assert_eq!(row.len(), 1);
            assert_eq!(row[0].x, 0);
            assert_eq!(row[0].len, 15);
        }
    }

    #[test]
    fn intersect_multiplies_coverage() {
        let mut a = SpanBuffer::default();
        a.push(Span::new(0, 10, 0, 255));
        let mut b = SpanBuffer::default();
        b.push(Span::new(5, 10, 0, 128));

        let result = a.intersect(&b);
        let spans: Vec<_> = result.iter().collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].x, 5);
        assert_eq!(spans[0].len, 5);
    }

    #[test]
    fn clip_to_rect_trims_span() {
        let mut a = SpanBuffer::default();
        a.push(Span::new(0, 10, 0, 255));
        let clipped = a.clip_to_rect(&IntRect::new(3, 0, 7, 1));
        let spans: Vec<_> = clipped.iter().collect();
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].x, spans[0].len), (3, 4));
    }

    #[test]
    fn point_hit_respects_coverage_zero_outside() {
        let mut a = SpanBuffer::default();
        a.push(Span::new(0, 5, 2, 255));
        assert!(a.point_hit(2.5, 2.5));
        assert!(!a.point_hit(10.0, 2.0));
    }
}
