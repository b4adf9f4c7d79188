// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scratch buffers reused across consecutive draw calls (`spec.md`
//! section 5 "Memory discipline": grow-only until the owning context is
//! released).

use crate::color::PremultipliedColorU8;
use crate::span::Span;

/// Owns the reusable buffers a single drawing context needs between draw
/// calls: outline points, accumulated span output, and a pixel scratch
/// row for gradient/texture fetch chunks.
///
/// Never shared across contexts (`spec.md` section 5 "Scratch arenas");
/// each [`crate::canvas::Canvas`] owns exactly one.
#[derive(Default)]
pub struct Arena {
    outline_points: Vec<(i32, i32)>,
    outline_contour_ends: Vec<u32>,
    spans: Vec<Span>,
    pixel_scratch: Vec<PremultipliedColorU8>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    /// Clears and returns the outline point buffer for reuse, preserving
    /// its allocated capacity.
    pub fn take_outline_points(&mut self) -> Vec<(i32, i32)> {
        self.outline_points.clear();
        std::mem::take(&mut self.outline_points)
    }

    /// Returns a buffer to the arena after use, so its capacity survives
    /// for the next draw call.
    pub fn give_outline_points(&mut self, buf: Vec<(i32, i32)>) {
        self.outline_points = buf;
    }

    pub fn take_contour_ends(&mut self) -> Vec<u32> {
        self.outline_contour_ends.clear();
        std::mem::take(&mut self.outline_contour_ends)
    }

    pub fn give_contour_ends(&mut self, buf: Vec<u32>) {
        self.outline_contour_ends = buf;
    }

    pub fn take_spans(&mut self) -> Vec<Span> {
        self.spans.clear();
        std::mem::take(&mut self.spans)
    }

    pub fn give_spans(&mut self, buf: Vec<Span>) {
        self.spans = buf;
    }

    /// Ensures the pixel scratch row holds at least `len` entries,
    /// growing (never shrinking) its backing allocation.
    pub fn pixel_scratch(&mut self, len: usize) -> &mut [PremultipliedColorU8] {
        if self.pixel_scratch.len() < len {
            self.pixel_scratch.resize(len, PremultipliedColorU8::transparent());
        }
        &mut self.pixel_scratch[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_points_round_trip_preserves_capacity() {
        let mut arena = Arena::new();
        let mut buf = arena.take_outline_points();
        buf.reserve(64);
        let cap = buf.capacity();
        arena.give_outline_points(buf);
        let buf2 = arena.take_outline_points();
        assert!(buf2.capacity() >= cap);
    }

    #[test]
    fn pixel_scratch_grows_and_keeps_capacity() {
        let mut arena = Arena::new();
        assert_eq!(arena.pixel_scratch(4).len(), 4);
        assert_eq!(arena.pixel_scratch(16).len(), 16);
        // Shrinking requests still return a slice of the requested length,
        // not the grown backing buffer.
        assert_eq!(arena.pixel_scratch(2).len(), 2);
        assert!(arena.pixel_scratch.capacity() >= 16);
    }
}
