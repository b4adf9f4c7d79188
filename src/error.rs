// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The crate's error taxonomy: only the conditions that genuinely cannot
//! be recovered from reach here. Degenerate input (zero-length dash
//! patterns, singular transforms, empty paths) is handled by producing
//! empty output and logging a warning, never by returning `Err` (section
//! 7).

/// Errors surfaced by `vraster`'s public API.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A surface was requested with a zero dimension, or a wrapped
    /// buffer's length did not match `width * height`.
    InvalidSurface { width: u32, height: u32 },

    /// A pixel format conversion was given an output buffer of the
    /// wrong length for the requested format.
    PixelFormatMismatch,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::InvalidSurface { width, height } => {
                write!(f, "invalid surface dimensions: {width}x{height}")
            }
            Error::PixelFormatMismatch => {
                write!(f, "output buffer length does not match the requested pixel format")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_dimensions() {
        let e = Error::InvalidSurface { width: 0, height: 4 };
        assert!(e.to_string().contains('0'));
    }
}
