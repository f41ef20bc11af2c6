// src/colour.rs

//! Defines `Colour`, a straight (non-premultiplied) RGBA8 value, and the
//! hexadecimal parsing used by the configuration surface.

use log::warn;

/// Byte order of the four channels of a pixel in a surface's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// `[R, G, B, A]` in memory.
    #[default]
    Rgba,
    /// `[B, G, R, A]` in memory, i.e. a little-endian `ARGB8888` word.
    Bgra,
}

/// Four colour bytes, always fully specified.
///
/// The bytes are written to pixel buffers verbatim, so a colour destined for
/// a surface with a non-RGBA layout must first go through [`Colour::in_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour([u8; 4]);

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const WHITE: Colour = Colour::rgb(0xff, 0xff, 0xff);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// An opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xff)
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Parses an `RRGGBB` hexadecimal string into an opaque colour.
    ///
    /// An optional `#` or `0x` prefix and surrounding whitespace are accepted.
    /// Up to eight hex digits are read as one 32-bit value; only its low 24
    /// bits contribute and alpha is always forced to `0xff`. Returns `None`
    /// for anything else.
    pub fn from_hex(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::rgb(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    /// Replaces `self` with the parsed value of `text`, leaving it untouched
    /// when `text` is malformed. Returns whether `text` parsed.
    pub fn set_from_hex(&mut self, text: &str) -> bool {
        match Self::from_hex(text) {
            Some(parsed) => {
                *self = parsed;
                true
            }
            None => {
                warn!("Ignoring malformed colour {:?}; keeping {:?}", text, self);
                false
            }
        }
    }

    /// Returns the bytes rearranged for a surface with the given channel order.
    pub const fn in_order(self, order: ChannelOrder) -> Self {
        let [r, g, b, a] = self.0;
        match order {
            ChannelOrder::Rgba => self,
            ChannelOrder::Bgra => Self([b, g, r, a]),
        }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Colour::BLACK
    }
}
