//! Font-engine primitives used by the `TextRenderer`.
//!
//! This module defines the `FontDriver` trait, a thin seam over a glyph
//! rasterizer (FreeType on Linux, a synthetic driver for headless use), plus
//! the glyph and error types that cross it.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that make a renderer unusable. Raised only while constructing one.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Initializing font engine failed with error {0}")]
    Engine(i32),

    #[error("Failed to find a font")]
    FontNotFound,

    #[error("Font {} has unsupported format", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Loading font from {} failed with error {code}", path.display())]
    Load { path: PathBuf, code: i32 },

    #[error("Font path {} cannot be passed to the font engine", .0.display())]
    InvalidPath(PathBuf),
}

/// Per-call font-engine failures. These are logged by the renderer and never
/// escape a `render` call.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("Setting char size to {height_px}px failed with error {code}")]
    PixelSize { height_px: u32, code: i32 },

    #[error("Failed to load glyph {index} for {ch:?} (error {code})")]
    Load { ch: char, index: u32, code: i32 },

    #[error("Failed to render glyph {index} for {ch:?} (error {code})")]
    Render { ch: char, index: u32, code: i32 },
}

/// An 8-bit coverage bitmap borrowed from the driver's glyph slot.
#[derive(Debug, Clone, Copy)]
pub struct GlyphBitmap<'a> {
    pub width: u32,
    pub rows: u32,
    /// Bytes between the starts of consecutive rows in memory. Negative when
    /// rows are stored bottom-up, as FreeType allows.
    pub pitch: i32,
    pub buffer: &'a [u8],
}

impl<'a> GlyphBitmap<'a> {
    /// Coverage bytes of visual row `y` (0 is the top row), `width` long.
    ///
    /// Returns `None` if `y` is out of range or the backing buffer is too
    /// short for the declared geometry.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.rows {
            return None;
        }
        let stride = self.pitch.unsigned_abs() as usize;
        let memory_row = if self.pitch < 0 { self.rows - 1 - y } else { y };
        let start = memory_row as usize * stride;
        self.buffer.get(start..start + self.width as usize)
    }
}

/// A rasterized glyph and its placement metrics.
#[derive(Debug, Clone, Copy)]
pub struct RasterizedGlyph<'a> {
    pub bitmap: GlyphBitmap<'a>,
    /// Horizontal distance from the pen position to the bitmap's left edge.
    pub bitmap_left: i32,
    /// Vertical distance from the baseline up to the bitmap's top row.
    pub bitmap_top: i32,
    /// Pen advance in 26.6 fixed point (1/64 pixel).
    pub advance_x: i64,
    pub advance_y: i64,
}

/// Platform-specific font driver trait.
///
/// A driver owns one loaded face and a single glyph slot: each call to
/// `rasterize` overwrites the bitmap returned by the previous one, and
/// `set_pixel_height` changes state shared by every later call. Callers that
/// share a driver between threads must serialize access to it.
pub trait FontDriver: Send {
    /// Select the nominal pixel height used by subsequent `rasterize` calls.
    fn set_pixel_height(&mut self, height_px: u32) -> Result<(), GlyphError>;

    /// Look up `ch` in the face and rasterize it to a coverage bitmap.
    ///
    /// Characters missing from the face rasterize as the face's notdef glyph.
    fn rasterize(&mut self, ch: char) -> Result<RasterizedGlyph<'_>, GlyphError>;
}
