// src/display/output.rs
//! Output descriptions reported by the display server.

use crate::geometry::Size;
use bitflags::bitflags;

bitflags! {
    /// Output rotation and reflection, bit-compatible with `wl_output.transform`
    /// (`normal` = 0, `90` = 1, `180` = 2, `270` = 3, `flipped` = 4, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Transform: u32 {
        const ROTATE_90 = 1;
        const ROTATE_180 = 2;
        const FLIPPED = 4;
    }
}

impl Transform {
    /// Whether the output is turned a quarter turn, so that its logical
    /// width and height are the mode's height and width.
    pub fn swaps_axes(self) -> bool {
        self.contains(Transform::ROTATE_90)
    }
}

/// One output as described by the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputInfo {
    /// Mode width in pixels, before rotation.
    pub width: i32,
    /// Mode height in pixels, before rotation.
    pub height: i32,
    pub transform: Transform,
    pub scale_factor: i32,
}

impl OutputInfo {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            transform: Transform::empty(),
            scale_factor: 1,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: i32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// The size of a buffer covering the output, after rotation.
    pub fn effective_size(&self) -> Size {
        let size = Size::new(self.width, self.height);
        if self.transform.swaps_axes() {
            size.transposed()
        } else {
            size
        }
    }
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
