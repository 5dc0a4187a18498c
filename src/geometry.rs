//! Plane geometry of the arena.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// Smallest extent allowed along either axis of the arena.
const MIN_EXTENT: f64 = 1.0;

/// Largest coordinate magnitude; `MIN_EXTENT` steps stay representable below it.
pub const MAX_COORD: f64 = 1e15;

/// Point or displacement in the plane.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
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

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle.
///
/// Containment is half-open: `min` is inside, `max` is not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.min.x <= p.x && p.x < self.max.x && self.min.y <= p.y && p.y < self.max.y
    }

    /// Return a well-formed copy: corners within [`MAX_COORD`], `min` below
    /// `max` and at least [`MIN_EXTENT`] wide and tall.
    pub fn normalized(&self) -> Rect {
        let finite = |v: f64| {
            if v.is_finite() {
                v.clamp(-MAX_COORD, MAX_COORD)
            } else {
                0.0
            }
        };
        let (x0, x1) = (finite(self.min.x), finite(self.max.x));
        let (y0, y1) = (finite(self.min.y), finite(self.max.y));
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        Rect::new(
            Vec2::new(x0, y0),
            Vec2::new(x1.max(x0 + MIN_EXTENT), y1.max(y0 + MIN_EXTENT)),
        )
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::new(Vec2::new(0.0, 0.0), Vec2::new(1200.0, 800.0))
    }
}
