//! Geometry in UI space.
//!
//! The origin is the bottom-left corner and y grows upward. Every `Bounds`
//! claims the half-open box `[x, x + width) × [y, y + height)`, so two
//! components sharing an edge never both claim the pixel on it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Builds bounds, clamping a negative width or height to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        if width < 0.0 || height < 0.0 {
            log::warn!(
                "negative bounds size {}x{} at ({}, {}); clamping to zero",
                width,
                height,
                x,
                y
            );
        }
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Left/bottom inclusive, right/top exclusive.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.top()
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.contains_point(p.x, p.y)
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// Overlapping region. Disjoint inputs give a zero-area box anchored
    /// inside `self` rather than a negative size.
    pub fn intersect(&self, other: &Bounds) -> Bounds {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());
        Bounds {
            x: x0,
            y: y0,
            width: (x1 - x0).max(0.0),
            height: (y1 - y0).max(0.0),
        }
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.top().max(other.top());
        Bounds {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Bounds {
        Bounds {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Shrinks by `insets` on each side; never goes below zero size.
    pub fn inset(&self, insets: Insets) -> Bounds {
        Bounds::new(
            self.x + insets.left,
            self.y + insets.bottom,
            (self.width - insets.horizontal()).max(0.0),
            (self.height - insets.vertical()).max(0.0),
        )
    }
}

/// Per-side spacing used for padding and margins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    pub fn uniform(v: f32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let cases = [
            Bounds::new(0.0, 0.0, 10.0, 10.0),
            Bounds::new(-5.0, 3.5, 0.5, 100.0),
            Bounds::new(120.0, 40.0, 33.0, 1.0),
        ];
        for b in cases {
            assert!(b.contains_point(b.x, b.y));
            assert!(!b.contains_point(b.x + b.width, b.y + b.height));
            assert!(!b.contains_point(b.right(), b.y));
            assert!(!b.contains_point(b.x, b.top()));
        }
    }

    #[test]
    fn test_adjacent_bounds_never_share_a_point() {
        let left = Bounds::new(0.0, 0.0, 50.0, 20.0);
        let right = Bounds::new(50.0, 0.0, 50.0, 20.0);
        let p = Vec2::new(50.0, 10.0);
        assert!(!left.contains(p));
        assert!(right.contains(p));
    }

    #[test]
    fn test_negative_size_is_clamped() {
        let b = Bounds::new(1.0, 2.0, -3.0, -4.0);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);
        assert!(b.is_empty());
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(20.0, 20.0, 5.0, 5.0);
        let i = a.intersect(&b);
        assert_eq!(i.area(), 0.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_union_and_inset() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, -5.0, 15.0, 15.0));

        let inner = a.inset(Insets::uniform(2.0));
        assert_eq!(inner, Bounds::new(2.0, 2.0, 6.0, 6.0));
        assert!(a.inset(Insets::uniform(20.0)).is_empty());
    }
}
