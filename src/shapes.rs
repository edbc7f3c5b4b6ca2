//! Shape primitives.
//!
//! Anything that can describe itself as a [`Path`] is a [`Shape`]. Circles
//! are approximated with eight quadratic arcs.

use crate::basics::{Point, Pt};
use crate::path::Path;

/// A drawable outline.
pub trait Shape {
    fn path(&self) -> Path;
}

impl Shape for Path {
    fn path(&self) -> Path {
        self.clone()
    }
}

impl<S: Shape + ?Sized> Shape for &S {
    fn path(&self) -> Path {
        (**self).path()
    }
}

// ============================================================================
// Circle
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: Pt,
}

impl Circle {
    pub fn new(center: Point, radius: Pt) -> Self {
        Self { center, radius }
    }

    /// Returns `true` if `p` lies strictly inside the circle.
    pub fn contains(&self, p: Point) -> bool {
        let x = p.x - self.center.x;
        let y = p.y - self.center.y;
        x * x + y * y < self.radius * self.radius
    }
}

impl Shape for Circle {
    /// Eight 45 degree arcs, starting at north and running clockwise on
    /// screen.
    ///
    /// Intercardinal anchors sit at `r * cos(pi/4)` on each axis. Each
    /// control point is where the tangents at its two anchors meet, which
    /// is `r * tan(pi/8)` along the tangent from the cardinal anchor.
    fn path(&self) -> Path {
        let r = self.radius;
        let x1 = (std::f64::consts::FRAC_PI_4.cos() as Pt) * r;
        let x2 = ((std::f64::consts::PI / 8.0).tan() as Pt) * r;
        let Point { x: cx, y: cy } = self.center;
        let pt = Point::new;

        let n = pt(cx, cy - r);
        let mut p = Path::with_capacity(3 + 8 * 5);
        p.add_start(n);
        p.add_quadratic(pt(cx + x2, cy - r), pt(cx + x1, cy - x1));
        p.add_quadratic(pt(cx + r, cy - x2), pt(cx + r, cy));
        p.add_quadratic(pt(cx + r, cy + x2), pt(cx + x1, cy + x1));
        p.add_quadratic(pt(cx + x2, cy + r), pt(cx, cy + r));
        p.add_quadratic(pt(cx - x2, cy + r), pt(cx - x1, cy + x1));
        p.add_quadratic(pt(cx - r, cy + x2), pt(cx - r, cy));
        p.add_quadratic(pt(cx - r, cy - x2), pt(cx - x1, cy - x1));
        p.add_quadratic(pt(cx - x2, cy - r), n);
        p
    }
}

// ============================================================================
// Rectangle
// ============================================================================

/// Axis-aligned rectangle from `min` (top-left) to `max` (bottom-right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub min: Point,
    pub max: Point,
}

impl Rectangle {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }
}

impl Shape for Rectangle {
    fn path(&self) -> Path {
        let mut p = Path::with_capacity(15);
        p.add_start(self.min);
        p.add_line(Point::new(self.max.x, self.min.y));
        p.add_line(self.max);
        p.add_line(Point::new(self.min.x, self.max.y));
        p.add_line(self.min);
        p
    }
}
