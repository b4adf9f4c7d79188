// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`vraster` is a software 2D vector graphics rasterizer: scanline
antialiased path filling, path stroking, span-buffer algebra and a
blend pipeline over a premultiplied ARGB32 pixel buffer.

It has no file format parser and no font shaper; paths are built
directly through [`path::PathBuilder`] and text is the caller's
responsibility via the [`hooks::FontFace`] hook. A [`canvas::Canvas`]
ties a [`pixmap::Surface`] to a save/restore state stack and is the
usual entry point.
*/

#![forbid(unsafe_code)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::many_single_char_names)]

mod arena;
mod blend_mode;
mod canvas;
mod color;
mod dispatch;
mod error;
mod geom;
mod hooks;
mod mask;
mod outline;
mod paint;
mod path;
mod pixel;
mod pixmap;
mod raster;
mod shadow;
mod span;
mod stroke;

pub use arena::Arena;
pub use blend_mode::BlendMode;
pub use canvas::{Canvas, CanvasState, Clip, FillSource};
pub use color::{Color, PremultipliedColorU8};
pub use dispatch::{draw, DrawParams, Op};
pub use error::Error;
pub use geom::{Fixed16_16, IntRect, Point, Rect, Transform};
pub use hooks::{DecodedImage, FontFace, FontFaceId, FontMetrics, GlyphMetrics, ImageCodec, NullFontFace, NullImageCodec};
pub use mask::{Mask, MaskMode};
pub use outline::{Outline, RasterOptions};
pub use paint::{ColorSpace, FilterQuality, Gradient, GradientKind, GradientStop, Paint, SpreadMode, Texture, TileMode};
pub use path::{FillRule, Path, PathBuilder, PathElement};
pub use pixmap::{PixelFormat, Surface};
pub use raster::{rasterize, rasterize_into, rasterize_with_options};
pub use shadow::{render_shadow, shadow_bounds, ShadowStyle};
pub use span::{Span, SpanBuffer};
pub use stroke::{LineCap, LineJoin, Stroke, StrokeMiterlimit};
