//! 2D vector arithmetic and line projection helpers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or displacement in the arena plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Heading used whenever a direction cannot be derived
pub const DEFAULT_HEADING: Vec2 = Vec2 { x: 1.0, y: 0.0 };

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction; a zero vector maps to `DEFAULT_HEADING`
    pub fn normalize(self) -> Vec2 {
        let n = self.norm();
        if n == 0.0 {
            return DEFAULT_HEADING;
        }
        Vec2::new(self.x / n, self.y / n)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).norm()
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: f64) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Vec2::new(x, y)
    }
}

/// Offset from `r1` to the orthogonal projection of `p` onto the segment `r1..r2`.
///
/// Returns `None` when the projection falls outside the segment.
pub fn project_to_line(r1: Vec2, r2: Vec2, p: Vec2) -> Option<Vec2> {
    let n = (r2 - r1).normalize();
    let pa_dot_n = (r1 - p).dot(n);
    let pb_dot_n = (r2 - p).dot(n);

    if pa_dot_n * pb_dot_n > 0.0 {
        return None;
    }

    Some(n * -pa_dot_n)
}

/// Perpendicular distance from `p` to the segment `r1..r2`, if it projects onto it
pub fn distance_to_line(r1: Vec2, r2: Vec2, p: Vec2) -> Option<f64> {
    let proj = project_to_line(r1, r2, p)?;
    Some((proj - (p - r1)).norm())
}

pub fn lerp(first: f64, second: f64, t: f64) -> f64 {
    first * (1.0 - t) + second * t
}
