//! Solid background fill.

use crate::colour::Colour;
use crate::pixel_buffer::{PixelBuffer, BYTES_PER_PIXEL};

/// Writes `colour`'s bytes verbatim to every pixel of `buffer`, one row of
/// `4 * width` bytes at a time.
pub fn fill(buffer: &mut PixelBuffer<'_>, colour: Colour) {
    let bytes = colour.to_bytes();
    for y in 0..buffer.size().height {
        if let Some(row) = buffer.row_mut(y) {
            for pixel in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&bytes);
            }
        }
    }
}
