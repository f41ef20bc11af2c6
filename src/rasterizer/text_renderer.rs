//! Single-line text rendering into pixel buffers.

use crate::colour::Colour;
use crate::geometry::{Displacement, Point};
use crate::pixel_buffer::PixelBuffer;
use crate::rasterizer::compositor::composite_glyph;
use crate::rasterizer::font_driver::{FontDriver, InitError};
use crate::rasterizer::font_locator::locate_default_font;
use crate::rasterizer::freetype_driver::FreeTypeDriver;
use crate::rasterizer::utf8::decode_text;
use log::{debug, trace, warn};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Renders lines of text with one font driver.
///
/// The driver's pixel size and glyph slot are shared state, so every `render`
/// call holds the driver lock for its whole body. Concurrent calls are safe
/// and run one after another.
#[derive(Debug)]
pub struct TextRenderer<D: FontDriver = FreeTypeDriver> {
    driver: Mutex<D>,
}

impl TextRenderer<FreeTypeDriver> {
    /// Loads the default system font with FreeType.
    ///
    /// Fails if FreeType cannot start, no default font is installed, or the
    /// font cannot be loaded. No rendering can happen without one.
    pub fn new() -> Result<Self, InitError> {
        Self::from_font_path(locate_default_font())
    }

    /// Loads the font at `path` with FreeType. `None` means no font was found.
    pub fn from_font_path(path: Option<PathBuf>) -> Result<Self, InitError> {
        let path = path.ok_or(InitError::FontNotFound)?;
        debug!("TextRenderer: loading font {}", path.display());
        Ok(Self::with_driver(FreeTypeDriver::new(&path)?))
    }
}

impl<D: FontDriver> TextRenderer<D> {
    pub fn with_driver(driver: D) -> Self {
        Self {
            driver: Mutex::new(driver),
        }
    }

    /// Draws `text` as a single line into `buffer`.
    ///
    /// `top_left` is the pen's starting point; each glyph is placed at
    /// `pen + (bitmap_left, height_px - bitmap_top)` and the pen then moves by
    /// the glyph advance, truncated to whole pixels glyph by glyph. Invalid
    /// UTF-8 is decoded byte by byte. Font-engine failures are logged: a
    /// failed pixel-size change skips the whole line, a failed glyph is
    /// skipped without moving the pen.
    pub fn render(
        &self,
        buffer: &mut PixelBuffer<'_>,
        text: impl AsRef<[u8]>,
        top_left: Point,
        height_px: i32,
        colour: Colour,
    ) {
        if buffer.size().area() == 0 || height_px <= 0 {
            return;
        }

        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);

        let scalars = decode_text(text.as_ref());

        if let Err(error) = driver.set_pixel_height(height_px as u32) {
            warn!("{}", error);
            return;
        }

        let mut pen = top_left;
        for ch in scalars {
            let glyph = match driver.rasterize(ch) {
                Ok(glyph) => glyph,
                Err(error) => {
                    warn!("{}", error);
                    continue;
                }
            };

            let glyph_top_left = pen + Displacement::new(glyph.bitmap_left, height_px - glyph.bitmap_top);
            trace!(
                "TextRenderer: {:?} {}x{} at {:?}",
                ch,
                glyph.bitmap.width,
                glyph.bitmap.rows,
                glyph_top_left
            );
            composite_glyph(buffer, &glyph.bitmap, glyph_top_left, colour);

            pen += Displacement::new(
                truncate_26_6(glyph.advance_x),
                truncate_26_6(glyph.advance_y),
            );
        }
    }
}

/// Whole pixels of a 26.6 fixed-point distance, rounding toward zero.
///
/// The remainder is discarded per glyph, so long lines drift slightly left of
/// where an accumulated advance would put them.
fn truncate_26_6(value: i64) -> i32 {
    (value / 64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
