// src/pixel_buffer.rs

//! A bounded view over a 32-bit-per-pixel buffer owned by someone else.

use crate::geometry::Size;

/// Bytes per pixel of every buffer this crate draws into.
pub const BYTES_PER_PIXEL: usize = 4;

/// Mutable view of `size.height` rows of `4 * size.width` bytes.
///
/// The memory belongs to the display surface; the view never grows, shrinks
/// or frees it. Every accessor stays inside `[0, width) x [0, height)`.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    data: &'a mut [u8],
    size: Size,
}

impl<'a> PixelBuffer<'a> {
    /// Wraps `data` as a buffer of `size`.
    ///
    /// Returns `None` if `size` is degenerate or `data` holds fewer than
    /// `stride * height` bytes. Trailing bytes beyond that are ignored.
    pub fn new(data: &'a mut [u8], size: Size) -> Option<Self> {
        let required = size.area().checked_mul(BYTES_PER_PIXEL)?;
        if required == 0 || data.len() < required {
            return None;
        }
        Some(Self {
            data: &mut data[..required],
            size,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.size.stride()
    }

    /// Row `y` as raw bytes, or `None` outside the buffer.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        if y < 0 || y >= self.size.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Row `y` as mutable raw bytes, or `None` outside the buffer.
    pub fn row_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        if y < 0 || y >= self.size.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get_mut(start..start + stride)
    }

    /// The four bytes of the pixel at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || x >= self.size.width {
            return None;
        }
        let offset = x as usize * BYTES_PER_PIXEL;
        let row = self.row(y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&row[offset..offset + BYTES_PER_PIXEL]);
        Some(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_or_degenerate_backing_memory() {
        let mut short = vec![0u8; 4 * 4 * 3 - 1];
        assert!(PixelBuffer::new(&mut short, Size::new(4, 3)).is_none());

        let mut empty: Vec<u8> = Vec::new();
        assert!(PixelBuffer::new(&mut empty, Size::new(0, 3)).is_none());
        assert!(PixelBuffer::new(&mut empty, Size::new(-2, 3)).is_none());
    }

    #[test]
    fn rows_and_pixels_are_bounded() {
        let mut data = vec![0u8; 4 * 2 * 2 + 8];
        let mut buffer = PixelBuffer::new(&mut data, Size::new(2, 2)).unwrap();
        assert_eq!(buffer.as_bytes().len(), 16);
        assert!(buffer.row(2).is_none());
        assert!(buffer.row(-1).is_none());
        assert!(buffer.pixel(2, 0).is_none());

        buffer.row_mut(1).unwrap()[4..8].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buffer.pixel(1, 1), Some([1, 2, 3, 4]));
    }
}
