//! Alpha blending of coverage bitmaps into 32-bit pixel buffers.

use crate::colour::Colour;
use crate::geometry::Point;
use crate::pixel_buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::rasterizer::font_driver::GlyphBitmap;

/// Blends `glyph`, tinted with `colour`, into `buffer` with its top-left
/// corner at `top_left`.
///
/// Only the part of the glyph rectangle that intersects the buffer is
/// touched. Each covered pixel gets `a = coverage * colour.alpha / 255` and
/// every colour channel becomes `(dst * (255 - a) + src * a) / 255`. The
/// destination's alpha byte is never written.
pub fn composite_glyph(buffer: &mut PixelBuffer<'_>, glyph: &GlyphBitmap<'_>, top_left: Point, colour: Colour) {
    let size = buffer.size();

    let left = top_left.x.max(0);
    let right = top_left.x.saturating_add(clamp_to_i32(glyph.width)).min(size.width);
    let top = top_left.y.max(0);
    let bottom = top_left.y.saturating_add(clamp_to_i32(glyph.rows)).min(size.height);

    if left >= right || top >= bottom {
        return;
    }

    let colour_bytes = colour.to_bytes();
    let colour_alpha = colour.alpha() as u32;

    for buffer_y in top..bottom {
        let glyph_y = (buffer_y - top_left.y) as u32;
        let Some(coverage_row) = glyph.row(glyph_y) else {
            continue;
        };
        let Some(buffer_row) = buffer.row_mut(buffer_y) else {
            continue;
        };

        for buffer_x in left..right {
            let glyph_x = (buffer_x - top_left.x) as usize;
            let coverage = coverage_row[glyph_x] as u32;
            let glyph_alpha = coverage * colour_alpha / 255;
            if glyph_alpha == 0 {
                continue;
            }

            let offset = buffer_x as usize * BYTES_PER_PIXEL;
            let pixel = &mut buffer_row[offset..offset + BYTES_PER_PIXEL];
            for channel in 0..3 {
                let existing = pixel[channel] as u32;
                let source = colour_bytes[channel] as u32;
                pixel[channel] = ((existing * (255 - glyph_alpha) + source * glyph_alpha) / 255) as u8;
            }
        }
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn bitmap(width: u32, rows: u32, coverage: &[u8]) -> GlyphBitmap<'_> {
        GlyphBitmap {
            width,
            rows,
            pitch: width as i32,
            buffer: coverage,
        }
    }

    fn patterned(size: Size) -> Vec<u8> {
        (0..size.area() * 4).map(|i| (i * 37 % 251) as u8).collect()
    }

    #[test]
    fn zero_coverage_leaves_buffer_unchanged() {
        let size = Size::new(8, 6);
        let mut data = patterned(size);
        let before = data.clone();
        let coverage = vec![0u8; 5 * 4];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();

        composite_glyph(&mut buffer, &bitmap(5, 4, &coverage), Point::new(2, 1), Colour::rgb(10, 200, 30));

        assert_eq!(data, before);
    }

    #[test]
    fn full_coverage_with_opaque_colour_replaces_rgb_only() {
        let size = Size::new(4, 4);
        let mut data = patterned(size);
        let before = data.clone();
        let coverage = vec![255u8; 2 * 2];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();

        composite_glyph(&mut buffer, &bitmap(2, 2, &coverage), Point::new(1, 1), Colour::rgb(10, 200, 30));

        for y in 0..4 {
            for x in 0..4 {
                let i = (y * 4 + x) * 4;
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                if inside {
                    assert_eq!(&data[i..i + 3], &[10, 200, 30]);
                    assert_eq!(data[i + 3], before[i + 3], "alpha must be preserved");
                } else {
                    assert_eq!(&data[i..i + 4], &before[i..i + 4]);
                }
            }
        }
    }

    #[test]
    fn partial_coverage_blends_with_existing_pixels() {
        let size = Size::new(1, 1);
        let mut data = vec![100, 0, 255, 7];
        let coverage = [128u8];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();

        composite_glyph(&mut buffer, &bitmap(1, 1, &coverage), Point::new(0, 0), Colour::rgba(200, 255, 0, 255));

        // a = 128; (100 * 127 + 200 * 128) / 255 = 150, (0 + 255 * 128) / 255 = 128,
        // (255 * 127 + 0) / 255 = 127.
        assert_eq!(data, vec![150, 128, 127, 7]);
    }

    #[test]
    fn colour_alpha_scales_coverage() {
        let size = Size::new(1, 1);
        let mut data = vec![0, 0, 0, 0];
        let coverage = [255u8];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();

        composite_glyph(&mut buffer, &bitmap(1, 1, &coverage), Point::new(0, 0), Colour::rgba(255, 255, 255, 51));

        assert_eq!(data, vec![51, 51, 51, 0]);

        let mut transparent = vec![9, 9, 9, 9];
        let mut buffer = PixelBuffer::new(&mut transparent, size).unwrap();
        composite_glyph(&mut buffer, &bitmap(1, 1, &coverage), Point::new(0, 0), Colour::rgba(255, 0, 0, 0));
        assert_eq!(transparent, vec![9, 9, 9, 9]);
    }

    #[test]
    fn glyphs_straddling_every_edge_are_clipped() {
        let size = Size::new(5, 4);
        let coverage = vec![255u8; 3 * 3];
        let glyph = bitmap(3, 3, &coverage);
        let positions = [
            Point::new(-2, -2),
            Point::new(4, -1),
            Point::new(-1, 3),
            Point::new(3, 2),
            Point::new(-10, 0),
            Point::new(0, 50),
            Point::new(i32::MAX - 1, i32::MAX - 1),
            Point::new(i32::MIN, i32::MIN),
        ];

        for position in positions {
            let mut data = vec![0u8; size.area() * 4];
            let mut buffer = PixelBuffer::new(&mut data, size).unwrap();
            composite_glyph(&mut buffer, &glyph, position, Colour::WHITE);

            for y in 0..size.height {
                for x in 0..size.width {
                    let covered = x >= position.x
                        && (x as i64) < position.x as i64 + 3
                        && y >= position.y
                        && (y as i64) < position.y as i64 + 3;
                    let i = ((y * size.width + x) * 4) as usize;
                    let expected = if covered { 255 } else { 0 };
                    assert_eq!(data[i], expected, "pixel ({}, {}) for glyph at {:?}", x, y, position);
                }
            }
        }
    }

    #[test]
    fn pitch_wider_than_width_and_bottom_up_rows_are_honoured() {
        let size = Size::new(2, 2);
        // Two rows of width 2 with one byte of padding each.
        let coverage = [255u8, 0, 99, 0, 255, 99];

        let mut data = vec![0u8; 16];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();
        composite_glyph(&mut buffer, &bitmap_with_pitch(&coverage, 3), Point::new(0, 0), Colour::WHITE);
        assert_eq!([data[0], data[4], data[8], data[12]], [255, 0, 0, 255]);

        let mut data = vec![0u8; 16];
        let mut buffer = PixelBuffer::new(&mut data, size).unwrap();
        composite_glyph(&mut buffer, &bitmap_with_pitch(&coverage, -3), Point::new(0, 0), Colour::WHITE);
        assert_eq!([data[0], data[4], data[8], data[12]], [0, 255, 255, 0]);
    }

    fn bitmap_with_pitch(coverage: &[u8], pitch: i32) -> GlyphBitmap<'_> {
        GlyphBitmap {
            width: 2,
            rows: 2,
            pitch,
            buffer: coverage,
        }
    }
}
