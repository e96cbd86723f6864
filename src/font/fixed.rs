use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

const SHIFT: u32 = 6;
const ONE: i32 = 1 << SHIFT;
const FRAC_MASK: i32 = ONE - 1;

/// Signed 26.6 fixed-point value: 26 integer bits, 6 fractional bits.
///
/// `Fixed(64)` is exactly one pixel. This is the unit every glyph advance,
/// bounding box and kerning value is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE);

    /// Creates a value from a whole number of pixels.
    pub const fn from_int(px: i32) -> Self {
        Self(px << SHIFT)
    }

    /// Creates a value from fractional pixels, rounding to the nearest 1/64.
    pub fn from_f32(px: f32) -> Self {
        Self((px * ONE as f32).round() as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE as f32
    }

    /// Largest integer not greater than the value.
    pub const fn floor(self) -> i32 {
        self.0 >> SHIFT
    }

    /// Smallest integer not less than the value.
    pub const fn ceil(self) -> i32 {
        self.0.saturating_add(FRAC_MASK) >> SHIFT
    }

    /// Nearest integer, halves rounding up.
    pub const fn round(self) -> i32 {
        self.0.saturating_add(ONE / 2) >> SHIFT
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            let abs = -(self.0 as i64);
            write!(f, "-{}:{:02}", abs >> SHIFT, abs & FRAC_MASK as i64)
        } else {
            write!(f, "{}:{:02}", self.0 >> SHIFT, self.0 & FRAC_MASK)
        }
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self(self.0 * rhs)
    }
}

/// A point in 26.6 fixed-point space. Y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point {
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Creates a point at whole-pixel coordinates.
    pub const fn from_int(x: i32, y: i32) -> Self {
        Self {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
        }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Fixed-point rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> Fixed {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Fixed {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }
}

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer pixel rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub min: PixelPoint,
    pub max: PixelPoint,
}

impl PixelRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: PixelPoint::new(x0, y0),
            max: PixelPoint::new(x1, y1),
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.min.x + dx,
            self.min.y + dy,
            self.max.x + dx,
            self.max.y + dy,
        )
    }
}
