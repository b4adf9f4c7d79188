// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! External collaborator traits (`spec.md` section 6): image codecs and
//! font rasterization are out of scope for this crate's core and are
//! consumed only through these hooks.

use crate::geom::Rect;
use crate::path::PathBuilder;

/// Decoded image pixels, always straight (non-premultiplied) RGBA8.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub pixels: Vec<u8>,
}

/// An image encode/decode collaborator.
///
/// The core never parses image container formats itself; callers supply
/// an implementation backed by whatever codec library fits their
/// platform.
pub trait ImageCodec {
    /// Decodes an encoded image buffer (PNG, JPEG, ...).
    fn decode(&self, data: &[u8]) -> Option<DecodedImage>;

    /// Encodes straight RGBA8 pixels, invoking `write` with each
    /// produced chunk. `quality` is a codec-specific hint (e.g. JPEG
    /// quality 0..100); ignored by lossless codecs.
    fn encode(&self, pixels: &[u8], width: u32, height: u32, stride: u32, quality: Option<u8>, write: &mut dyn FnMut(&[u8]));
}

/// A no-op codec that decodes nothing and discards encode output;
/// useful as a default when a caller has no image support wired up.
pub struct NullImageCodec;

impl ImageCodec for NullImageCodec {
    fn decode(&self, _data: &[u8]) -> Option<DecodedImage> {
        None
    }

    fn encode(&self, _pixels: &[u8], _width: u32, _height: u32, _stride: u32, _quality: Option<u8>, _write: &mut dyn FnMut(&[u8])) {}
}

/// Opaque handle to a loaded font face; meaning is entirely up to the
/// [`FontFace`] implementation.
pub type FontFaceId = u64;

/// Font metrics at a given size, in the same units as path coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub bbox: Rect,
}

/// Metrics for a single glyph.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphMetrics {
    pub advance: f32,
    pub left_side_bearing: f32,
    pub bbox: Rect,
}

/// A font rasterization collaborator (`spec.md` section 6 "Font hook").
///
/// The core has no font parser or glyph rasterizer of its own; it only
/// asks this trait to append glyph outlines to a [`PathBuilder`].
pub trait FontFace {
    /// Appends the outline of `codepoint` at `(x, y)` and size `size` to
    /// `path`, returning the glyph's advance width.
    fn glyph_path(&self, face: FontFaceId, size: f32, codepoint: u32, x: f32, y: f32, path: &mut PathBuilder) -> f32;

    /// Face-wide metrics at the given size.
    fn font_metrics(&self, face: FontFaceId, size: f32) -> FontMetrics;

    /// Metrics for a single glyph at the given size.
    fn glyph_metrics(&self, face: FontFaceId, size: f32, codepoint: u32) -> GlyphMetrics;
}

/// A no-op font face: every glyph has zero advance and an empty
/// outline. Useful as a default when a caller has no text support
/// wired up.
pub struct NullFontFace;

impl FontFace for NullFontFace {
    fn glyph_path(&self, _face: FontFaceId, _size: f32, _codepoint: u32, _x: f32, _y: f32, _path: &mut PathBuilder) -> f32 {
        0.0
    }

    fn font_metrics(&self, _face: FontFaceId, _size: f32) -> FontMetrics {
        FontMetrics::default()
    }

    fn glyph_metrics(&self, _face: FontFaceId, _size: f32, _codepoint: u32) -> GlyphMetrics {
        GlyphMetrics::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_codec_decodes_nothing() {
        assert!(NullImageCodec.decode(&[1, 2, 3]).is_none());
    }

    #[test]
    fn null_font_face_has_zero_advance() {
        let mut pb = crate::path::Path::builder();
        let advance = NullFontFace.glyph_path(0, 12.0, 'A' as u32, 0.0, 0.0, &mut pb);
        assert_eq!(advance, 0.0);
    }
}
