//! # Game Mathematics
//!
//! Small value types shared by components, systems and the renderer.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// A 2D vector in world units.
///
/// # Examples
///
/// ```
/// use emberfall::Vector2;
///
/// let a = Vector2::new(3.0, 4.0);
/// assert_eq!(a.length(), 5.0);
/// assert_eq!(a.normalized(), Vector2::new(0.6, 0.8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    /// Creates a new vector.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Distance to another point.
    pub fn distance(self, other: Vector2) -> f32 {
        (other - self).length()
    }

    /// Returns the unit vector pointing the same way, or zero for a zero vector.
    pub fn normalized(self) -> Vector2 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vector2::ZERO
        } else {
            Vector2::new(self.x / len, self.y / len)
        }
    }

    /// Unit direction from `self` towards `target`.
    pub fn direction_to(self, target: Vector2) -> Vector2 {
        (target - self).normalized()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// An axis-aligned bounding box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vector2,
    pub max: Vector2,
}

impl Aabb {
    /// Creates a box from its top-left corner and size.
    pub fn from_origin_size(origin: Vector2, width: f32, height: f32) -> Self {
        Self {
            min: origin,
            max: Vector2::new(origin.x + width, origin.y + height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Overlap on each axis, or `None` unless both axis intervals overlap
    /// strictly. Boxes that only touch along an edge do not overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Aabb, Vector2};
    ///
    /// let a = Aabb::from_origin_size(Vector2::new(0.0, 0.0), 10.0, 10.0);
    /// let b = Aabb::from_origin_size(Vector2::new(5.0, 5.0), 10.0, 10.0);
    /// assert_eq!(a.overlap(&b), Some((5.0, 5.0)));
    ///
    /// let touching = Aabb::from_origin_size(Vector2::new(10.0, 0.0), 10.0, 10.0);
    /// assert_eq!(a.overlap(&touching), None);
    /// ```
    pub fn overlap(&self, other: &Aabb) -> Option<(f32, f32)> {
        let intersects = self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y;
        if !intersects {
            return None;
        }

        let overlap_x = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let overlap_y = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        Some((overlap_x, overlap_y))
    }
}

/// An 8-bit RGBA color used for sprite tints and UI drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const GRAY: Rgba = Rgba::rgb(128, 128, 128);
    pub const RED: Rgba = Rgba::rgb(220, 50, 47);
    pub const GREEN: Rgba = Rgba::rgb(80, 200, 120);
    pub const BLUE: Rgba = Rgba::rgb(60, 120, 220);
    pub const GOLD: Rgba = Rgba::rgb(240, 200, 60);
    pub const PURPLE: Rgba = Rgba::rgb(150, 90, 200);

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns the same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Darkens the color by `factor` (0.0 = black, 1.0 = unchanged).
    pub fn scaled(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
            a: self.a,
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}
