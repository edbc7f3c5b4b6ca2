//! Affine transformation matrix.
//!
//! Node transforms, the curve placement matrices and the software
//! backend's quad mapping all use this one type.

use crate::basics::{Point, Pt};

/// Epsilon for matrix comparisons.
pub const AFFINE_EPSILON: Pt = 1e-6;

/// 2D affine transformation matrix.
///
/// Stores six components `[sx, shy, shx, sy, tx, ty]` representing
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
#[derive(Debug, Clone, Copy)]
pub struct Affine {
    pub sx: Pt,
    pub shy: Pt,
    pub shx: Pt,
    pub sy: Pt,
    pub tx: Pt,
    pub ty: Pt,
}

impl Affine {
    // ====================================================================
    // Construction
    // ====================================================================

    pub const IDENTITY: Affine = Affine::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(sx: Pt, shy: Pt, shx: Pt, sy: Pt, tx: Pt, ty: Pt) -> Self {
        Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
        }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn new_scaling(x: Pt, y: Pt) -> Self {
        Self::new(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    pub fn new_translation(x: Pt, y: Pt) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Rotation by `a` radians.
    pub fn new_rotation(a: Pt) -> Self {
        let (sa, ca) = a.sin_cos();
        Self::new(ca, sa, -sa, ca, 0.0, 0.0)
    }

    /// Map the unit square onto the rectangle at `(x, y)` of size `w` x `h`.
    pub fn new_unit_to_rect(x: Pt, y: Pt, w: Pt, h: Pt) -> Self {
        Self::new(w, 0.0, 0.0, h, x, y)
    }

    // ====================================================================
    // Operations (mutate self)
    // ====================================================================

    pub fn translate(&mut self, x: Pt, y: Pt) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    pub fn scale(&mut self, x: Pt, y: Pt) -> &mut Self {
        self.sx *= x;
        self.shx *= x;
        self.tx *= x;
        self.shy *= y;
        self.sy *= y;
        self.ty *= y;
        self
    }

    /// Apply `m` after `self`.
    pub fn multiply(&mut self, m: &Affine) -> &mut Self {
        let t0 = self.sx * m.sx + self.shy * m.shx;
        let t2 = self.shx * m.sx + self.sy * m.shx;
        let t4 = self.tx * m.sx + self.ty * m.shx + m.tx;
        self.shy = self.sx * m.shy + self.shy * m.sy;
        self.sy = self.shx * m.shy + self.sy * m.sy;
        self.ty = self.tx * m.shy + self.ty * m.sy + m.ty;
        self.sx = t0;
        self.shx = t2;
        self.tx = t4;
        self
    }

    /// Apply `m` before `self`. This is how a child's transform composes
    /// with its parent's.
    pub fn premultiply(&mut self, m: &Affine) -> &mut Self {
        let mut t = *m;
        t.multiply(self);
        *self = t;
        self
    }

    /// Invert in place. A singular matrix produces non-finite components;
    /// use [`inverted`](Affine::inverted) to detect that case.
    pub fn invert(&mut self) -> &mut Self {
        let d = self.determinant_reciprocal();
        let t0 = self.sy * d;
        self.sy = self.sx * d;
        self.shy = -self.shy * d;
        self.shx = -self.shx * d;
        let t4 = -self.tx * t0 - self.ty * self.shx;
        self.ty = -self.tx * self.shy - self.ty * self.sy;
        self.sx = t0;
        self.tx = t4;
        self
    }

    /// The inverse, or `None` for a degenerate matrix.
    pub fn inverted(&self) -> Option<Affine> {
        if self.determinant().abs() <= Pt::EPSILON * Pt::EPSILON {
            return None;
        }
        let mut m = *self;
        m.invert();
        Some(m)
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    #[inline]
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            p.x * self.sx + p.y * self.shx + self.tx,
            p.x * self.shy + p.y * self.sy + self.ty,
        )
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    #[inline]
    pub fn determinant(&self) -> Pt {
        self.sx * self.sy - self.shy * self.shx
    }

    #[inline]
    pub fn determinant_reciprocal(&self) -> Pt {
        1.0 / (self.sx * self.sy - self.shy * self.shx)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartialEq for Affine {
    fn eq(&self, other: &Self) -> bool {
        let e = AFFINE_EPSILON;
        (self.sx - other.sx).abs() <= e
            && (self.shy - other.shy).abs() <= e
            && (self.shx - other.shx).abs() <= e
            && (self.sy - other.sy).abs() <= e
            && (self.tx - other.tx).abs() <= e
            && (self.ty - other.ty).abs() <= e
    }
}

/// `a * b` applies `a` first, then `b`.
impl std::ops::Mul for Affine {
    type Output = Affine;
    fn mul(self, rhs: Affine) -> Affine {
        let mut result = self;
        result.multiply(&rhs);
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
