//! Bezier flattening by adaptive recursive subdivision.
//!
//! The rasterizer and the stroker only understand straight edges, so every
//! quadratic and cubic segment goes through a [`Flattener`] first. Subdivision
//! stops once the control polygon is within half a device pixel of its chord,
//! scaled by `approximation_scale`.

use crate::basics::PointD;
use crate::math::calc_sq_distance;

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;
const CURVE_RECURSION_LIMIT: u32 = 32;

fn mid(a: PointD, b: PointD) -> PointD {
    PointD::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn sq_dist(a: PointD, b: PointD) -> f64 {
    calc_sq_distance(a.x, a.y, b.x, b.y)
}

// ============================================================================
// Flattener
// ============================================================================

/// Converts curve segments into polylines.
///
/// Output points exclude the segment's start point (the caller already has
/// it) and always end exactly at the segment's end point.
#[derive(Debug, Clone)]
pub struct Flattener {
    approximation_scale: f64,
    distance_tolerance_square: f64,
}

impl Flattener {
    pub fn new(approximation_scale: f64) -> Self {
        let mut f = Self {
            approximation_scale: 1.0,
            distance_tolerance_square: 0.25,
        };
        f.set_approximation_scale(approximation_scale);
        f
    }

    /// Ratio of device pixels to the units the curve is given in.
    pub fn set_approximation_scale(&mut self, s: f64) {
        let s = if s > 0.0 { s } else { 1.0 };
        self.approximation_scale = s;
        let d = 0.5 / s;
        self.distance_tolerance_square = d * d;
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    /// Flatten the quadratic `p1, p2, p3` into `out`.
    pub fn quadratic(&self, p1: PointD, p2: PointD, p3: PointD, out: &mut Vec<PointD>) {
        self.recursive_quadratic(p1, p2, p3, 0, out);
        out.push(p3);
    }

    /// Flatten the cubic `p1, p2, p3, p4` into `out`.
    pub fn cubic(&self, p1: PointD, p2: PointD, p3: PointD, p4: PointD, out: &mut Vec<PointD>) {
        self.recursive_cubic(p1, p2, p3, p4, 0, out);
        out.push(p4);
    }

    fn recursive_quadratic(
        &self,
        p1: PointD,
        p2: PointD,
        p3: PointD,
        level: u32,
        out: &mut Vec<PointD>,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let p12 = mid(p1, p2);
        let p23 = mid(p2, p3);
        let p123 = mid(p12, p23);

        let dx = p3.x - p1.x;
        let dy = p3.y - p1.y;
        let d = ((p2.x - p3.x) * dy - (p2.y - p3.y) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                out.push(p123);
                return;
            }
        } else {
            // Collinear: only a control point outside the chord matters.
            let da = dx * dx + dy * dy;
            let d = if da == 0.0 {
                sq_dist(p1, p2)
            } else {
                let k = ((p2.x - p1.x) * dx + (p2.y - p1.y) * dy) / da;
                if k > 0.0 && k < 1.0 {
                    return;
                }
                if k <= 0.0 {
                    sq_dist(p2, p1)
                } else {
                    sq_dist(p2, p3)
                }
            };
            if d < self.distance_tolerance_square {
                out.push(p2);
                return;
            }
        }

        self.recursive_quadratic(p1, p12, p123, level + 1, out);
        self.recursive_quadratic(p123, p23, p3, level + 1, out);
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_cubic(
        &self,
        p1: PointD,
        p2: PointD,
        p3: PointD,
        p4: PointD,
        level: u32,
        out: &mut Vec<PointD>,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let p12 = mid(p1, p2);
        let p23 = mid(p2, p3);
        let p34 = mid(p3, p4);
        let p123 = mid(p12, p23);
        let p234 = mid(p23, p34);
        let p1234 = mid(p123, p234);

        let dx = p4.x - p1.x;
        let dy = p4.y - p1.y;
        let chord = dx * dx + dy * dy;

        let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
        let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();

        match (
            d2 > CURVE_COLLINEARITY_EPSILON,
            d3 > CURVE_COLLINEARITY_EPSILON,
        ) {
            (false, false) => {
                // All collinear, or p1 == p4.
                let (d2, d3) = if chord == 0.0 {
                    (sq_dist(p1, p2), sq_dist(p4, p3))
                } else {
                    let k2 = ((p2.x - p1.x) * dx + (p2.y - p1.y) * dy) / chord;
                    let k3 = ((p3.x - p1.x) * dx + (p3.y - p1.y) * dy) / chord;
                    if k2 > 0.0 && k2 < 1.0 && k3 > 0.0 && k3 < 1.0 {
                        return;
                    }
                    let off = |p: PointD, k: f64| {
                        if k <= 0.0 {
                            sq_dist(p, p1)
                        } else if k >= 1.0 {
                            sq_dist(p, p4)
                        } else {
                            sq_dist(p, PointD::new(p1.x + k * dx, p1.y + k * dy))
                        }
                    };
                    (off(p2, k2), off(p3, k3))
                };
                if d2 > d3 {
                    if d2 < self.distance_tolerance_square {
                        out.push(p2);
                        return;
                    }
                } else if d3 < self.distance_tolerance_square {
                    out.push(p3);
                    return;
                }
            }
            (false, true) => {
                if d3 * d3 <= self.distance_tolerance_square * chord {
                    out.push(p23);
                    return;
                }
            }
            (true, false) => {
                if d2 * d2 <= self.distance_tolerance_square * chord {
                    out.push(p23);
                    return;
                }
            }
            (true, true) => {
                if (d2 + d3) * (d2 + d3) <= self.distance_tolerance_square * chord {
                    out.push(p23);
                    return;
                }
            }
        }

        self.recursive_cubic(p1, p12, p123, p1234, level + 1, out);
        self.recursive_cubic(p1234, p234, p34, p4, level + 1, out);
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
