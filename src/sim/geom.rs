//! Rectangle geometry and collision predicates
//!
//! Everything in the world is an axis-aligned box; the whole collision
//! story is overlap tests and per-axis clamping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Center point of the rectangle
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict AABB overlap (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.bottom()
            || other.bottom() <= self.y)
    }

    /// Whether a point lies strictly inside the rectangle
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.x && p.x < self.right() && p.y > self.y && p.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersects_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_rect_intersects_apart() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_rect_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contains_point() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains_point(Vec2::new(15.0, 15.0)));
        assert!(!r.contains_point(Vec2::new(5.0, 15.0)));
        assert!(!r.contains_point(Vec2::new(10.0, 10.0))); // Edge is outside
    }

    #[test]
    fn test_center() {
        let r = Rect::new(0.0, 0.0, 30.0, 60.0);
        assert_eq!(r.center(), Vec2::new(15.0, 30.0));
    }
}
