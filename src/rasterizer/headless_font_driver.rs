//! Headless font driver producing synthetic box glyphs.
//!
//! Used where no font engine is available and by tests that need glyph
//! placement to be exact and reproducible.

use crate::rasterizer::font_driver::{FontDriver, GlyphBitmap, GlyphError, RasterizedGlyph};
use log::trace;

/// Renders every visible character as a solid box sitting on the baseline.
///
/// For a pixel height `h` a box is `h / 2` wide and `3h / 4` tall, with a
/// left bearing of `h / 16`. Whitespace produces an empty bitmap. Every glyph
/// advances by `h * 40` 26.6 units, i.e. `0.625 h` pixels, so the fractional
/// part is dropped by the renderer just as it is for real fonts.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFontDriver {
    height_px: u32,
    slot: Vec<u8>,
    failing_chars: Vec<char>,
    fail_pixel_size: bool,
}

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `rasterize` fail for the given characters.
    pub fn with_failing_chars(mut self, chars: &[char]) -> Self {
        self.failing_chars.extend_from_slice(chars);
        self
    }

    /// Makes `set_pixel_height` fail.
    pub fn with_failing_pixel_size(mut self) -> Self {
        self.fail_pixel_size = true;
        self
    }

    pub fn box_width(height_px: u32) -> u32 {
        height_px / 2
    }

    pub fn box_height(height_px: u32) -> u32 {
        height_px * 3 / 4
    }

    pub fn bearing(height_px: u32) -> i32 {
        (height_px / 16) as i32
    }

    pub fn advance_26_6(height_px: u32) -> i64 {
        height_px as i64 * 40
    }
}

impl FontDriver for HeadlessFontDriver {
    fn set_pixel_height(&mut self, height_px: u32) -> Result<(), GlyphError> {
        if self.fail_pixel_size {
            return Err(GlyphError::PixelSize { height_px, code: -1 });
        }
        self.height_px = height_px;
        Ok(())
    }

    fn rasterize(&mut self, ch: char) -> Result<RasterizedGlyph<'_>, GlyphError> {
        if self.failing_chars.contains(&ch) {
            return Err(GlyphError::Render {
                ch,
                index: ch as u32,
                code: -1,
            });
        }

        let h = self.height_px;
        let (width, rows) = if ch.is_whitespace() {
            (0, 0)
        } else {
            (Self::box_width(h), Self::box_height(h))
        };

        self.slot.clear();
        self.slot.resize(width as usize * rows as usize, 0xff);
        trace!("HeadlessFontDriver: {:?} -> {}x{} box", ch, width, rows);

        Ok(RasterizedGlyph {
            bitmap: GlyphBitmap {
                width,
                rows,
                pitch: width as i32,
                buffer: &self.slot,
            },
            bitmap_left: Self::bearing(h),
            bitmap_top: rows as i32,
            advance_x: Self::advance_26_6(h),
            advance_y: 0,
        })
    }
}
