// src/geometry.rs

//! Integer screen geometry: positions, sizes and signed displacements.
//!
//! All arithmetic is integer. A `Size` with a zero or negative dimension is
//! degenerate and has an `area` of zero.

use std::ops::{Add, AddAssign, Sub};

/// A position in buffer coordinates. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered, or zero if either dimension is non-positive.
    pub fn area(self) -> usize {
        if self.width > 0 && self.height > 0 {
            self.width as usize * self.height as usize
        } else {
            0
        }
    }

    /// Bytes per row of a 32-bit-per-pixel buffer of this size.
    pub fn stride(self) -> usize {
        self.width.max(0) as usize * 4
    }

    /// Swaps width and height, as needed for outputs rotated by 90 or 270 degrees.
    pub const fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// A signed offset between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Displacement {
    pub dx: i32,
    pub dy: i32,
}

impl Displacement {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl Add<Displacement> for Point {
    type Output = Point;

    fn add(self, rhs: Displacement) -> Point {
        Point::new(self.x.saturating_add(rhs.dx), self.y.saturating_add(rhs.dy))
    }
}

impl AddAssign<Displacement> for Point {
    fn add_assign(&mut self, rhs: Displacement) {
        *self = *self + rhs;
    }
}

impl Sub<Displacement> for Point {
    type Output = Point;

    fn sub(self, rhs: Displacement) -> Point {
        Point::new(self.x.saturating_sub(rhs.dx), self.y.saturating_sub(rhs.dy))
    }
}

impl Sub<Point> for Point {
    type Output = Displacement;

    fn sub(self, rhs: Point) -> Displacement {
        Displacement::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}
