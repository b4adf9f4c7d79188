// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The pixel surface (`spec.md` section 3): a copy-on-write ARGB32
//! premultiplied pixel buffer, with a distinct externally-wrapped
//! variant that panics on detach.

use std::rc::Rc;

use crate::color::{Color, PremultipliedColorU8};
use crate::error::Error;
use crate::geom::IntRect;
use crate::hooks::ImageCodec;

/// External pixel layouts a [`Surface`] can be read from or written to.
/// Internal storage is always ARGB32 premultiplied; conversion happens
/// only at these boundaries (section 4.I "Pixel format").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PixelFormat {
    Argb32Premultiplied,
    Bgra32Premultiplied,
    Rgba32,
    Bgra32,
    A8,
}

impl PixelFormat {
    fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::A8 => 1,
            _ => 4,
        }
    }
}

/// A premultiplied-ARGB32 pixel buffer.
///
/// Cheap to clone when owned (reference-counted, copy-on-write);
/// wrapping an external buffer via [`Surface::wrap`] opts out of that
/// and panics if a mutating call would otherwise need to detach it.
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    /// A caller-owned buffer borrowed for the surface's lifetime never
    /// detaches: there is nothing this type can safely copy-on-write
    /// into without discarding the caller's aliasing expectations.
    wrapped: bool,
    data: Rc<Vec<u32>>,
}

impl Surface {
    /// Creates a new, fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Surface, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSurface { width, height });
        }
        let data = Rc::new(vec![0u32; (width * height) as usize]);
        Ok(Surface { width, height, wrapped: false, data })
    }

    /// Wraps a `width * height` caller-provided ARGB32-premultiplied
    /// buffer without copying. Any call that would mutate the buffer
    /// panics.
    pub fn wrap(data: Vec<u32>, width: u32, height: u32) -> Result<Surface, Error> {
        if width == 0 || height == 0 || data.len() != (width * height) as usize {
            return Err(Error::InvalidSurface { width, height });
        }
        Ok(Surface { width, height, wrapped: true, data: Rc::new(data) })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    /// Mutable access to the raw pixel buffer, detaching from any shared
    /// owner first (copy-on-write).
    ///
    /// # Panics
    /// Panics if this surface wraps an externally-owned buffer
    /// ([`Surface::wrap`]); such buffers are not copy-on-write and the
    /// crate never mutates them in place behind the caller's back.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        if self.wrapped {
            panic!("attempted to detach a wrapped external surface");
        }
        if Rc::strong_count(&self.data) > 1 {
            self.data = Rc::new(self.data.as_ref().clone());
        }
        Rc::get_mut(&mut self.data).expect("just detached to a unique Rc")
    }

    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(PremultipliedColorU8::from_raw(self.data[(y * self.width + x) as usize]))
    }

    pub fn fill(&mut self, color: PremultipliedColorU8) {
        crate::pixel::memfill32(self.pixels_mut(), color.raw());
    }

    /// Converts the whole surface's pixels into an external `format`,
    /// writing into `out` (sized `width * height * bytes_per_pixel(format)`,
    /// tightly packed).
    pub fn write_pixels(&self, format: PixelFormat, out: &mut [u8]) -> Result<(), Error> {
        let stride = self.width as usize * format.bytes_per_pixel();
        self.write_pixels_rect(format, IntRect::from_xywh(0, 0, self.width, self.height), stride, out)
    }

    /// Converts `rect` (in surface pixel coordinates) into an external
    /// `format`, writing rows of `out` at `stride` bytes apart (section
    /// 6 "read(buffer, stride, rect)").
    ///
    /// `stride` must be at least `rect.width() * bytes_per_pixel(format)`;
    /// `out` must hold at least `stride * rect.height()` bytes. `rect`
    /// must lie entirely within the surface.
    pub fn write_pixels_rect(&self, format: PixelFormat, rect: IntRect, stride: usize, out: &mut [u8]) -> Result<(), Error> {
        let bpp = format.bytes_per_pixel();
        let row_bytes = rect.width() as usize * bpp;

        if rect.is_empty() || rect.left < 0 || rect.top < 0 || rect.right as u32 > self.width || rect.bottom as u32 > self.height {
            return Err(Error::PixelFormatMismatch);
        }
        if stride < row_bytes || out.len() < stride * rect.height() as usize {
            return Err(Error::PixelFormatMismatch);
        }

        for row in 0..rect.height() {
            let sy = rect.top as u32 + row;
            for col in 0..rect.width() {
                let sx = rect.left as u32 + col;
                let raw = self.data[(sy * self.width + sx) as usize];
                let p = PremultipliedColorU8::from_raw(raw);
                let dst_off = row as usize * stride + col as usize * bpp;
                let chunk = &mut out[dst_off..dst_off + bpp];
                match format {
                    PixelFormat::Argb32Premultiplied => chunk.copy_from_slice(&raw.to_be_bytes()),
                    PixelFormat::Bgra32Premultiplied => {
                        chunk.copy_from_slice(&[p.blue(), p.green(), p.red(), p.alpha()]);
                    }
                    PixelFormat::Rgba32 => {
                        let c = p.unpremultiply();
                        chunk.copy_from_slice(&[
                            (c.r * 255.0 + 0.5) as u8,
                            (c.g * 255.0 + 0.5) as u8,
                            (c.b * 255.0 + 0.5) as u8,
                            (c.a * 255.0 + 0.5) as u8,
                        ]);
                    }
                    PixelFormat::Bgra32 => {
                        let c = p.unpremultiply();
                        chunk.copy_from_slice(&[
                            (c.b * 255.0 + 0.5) as u8,
                            (c.g * 255.0 + 0.5) as u8,
                            (c.r * 255.0 + 0.5) as u8,
                            (c.a * 255.0 + 0.5) as u8,
                        ]);
                    }
                    PixelFormat::A8 => chunk[0] = p.alpha(),
                }
            }
        }

        Ok(())
    }

    /// Decodes `data` through `codec` into a fresh, fully-owned surface
    /// (section 6 "Codec hook"). `None` on a codec decode failure,
    /// matching the "degenerate input -> no output" recovery policy.
    pub fn decode_with(codec: &dyn ImageCodec, data: &[u8]) -> Option<Surface> {
        let image = codec.decode(data)?;
        let mut surface = Surface::new(image.width, image.height).ok()?;
        let pixels = surface.pixels_mut();
        let width = image.width as usize;
        for y in 0..image.height as usize {
            let row = y * image.stride as usize;
            for x in 0..width {
                let o = row + x * 4;
                if o + 4 > image.pixels.len() {
                    continue;
                }
                let c = Color::from_rgba8(image.pixels[o], image.pixels[o + 1], image.pixels[o + 2], image.pixels[o + 3]);
                pixels[y * width + x] = c.premultiply(1.0).raw();
            }
        }
        Some(surface)
    }

    /// Encodes the whole surface through `codec` as straight RGBA8
    /// (section 6 "Codec hook"). `None` only if the surface's own pixel
    /// conversion fails; an unimplemented codec simply yields no bytes.
    pub fn encode_with(&self, codec: &dyn ImageCodec, quality: Option<u8>) -> Option<Vec<u8>> {
        let stride = self.width as usize * 4;
        let mut rgba = vec![0u8; stride * self.height as usize];
        self.write_pixels(PixelFormat::Rgba32, &mut rgba).ok()?;

        let mut out = Vec::new();
        codec.encode(&rgba, self.width, self.height, stride as u32, quality, &mut |chunk: &[u8]| out.extend_from_slice(chunk));
        Some(out)
    }
}
