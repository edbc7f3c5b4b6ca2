//! Bounding rectangle calculation.
//!
//! Computes the axis-aligned bounding box of a [`Path`], including the true
//! extrema of quadratic segments rather than their control points.

use crate::basics::{Point, Pt, RectF};
use crate::path::{Path, Segment};

impl Path {
    /// Axis-aligned bounds of every point on the path.
    ///
    /// An empty path yields the sentinel rectangle with `x1 = y1 = Pt::MAX`
    /// and `x2 = y2 = 0`, which fails [`RectF::is_valid`].
    ///
    /// # Panics
    ///
    /// If the path holds a cubic segment: bounds for cubics are not
    /// implemented.
    pub fn bounds(&self) -> RectF {
        let mut r = RectF::new(Pt::MAX, Pt::MAX, 0.0, 0.0);
        let mut first = true;
        let mut include = |p: Point| {
            if first {
                r = RectF::new(p.x, p.y, p.x, p.y);
                first = false;
                return;
            }
            if p.x < r.x1 {
                r.x1 = p.x;
            }
            if p.y < r.y1 {
                r.y1 = p.y;
            }
            if p.x > r.x2 {
                r.x2 = p.x;
            }
            if p.y > r.y2 {
                r.y2 = p.y;
            }
        };

        let mut start = Point::default();
        for seg in self.segments() {
            match seg {
                Segment::Move(_) | Segment::Line(_) => {}
                Segment::Quadratic(n1, end) => {
                    for p in extremities_quad(start, n1, end) {
                        include(p);
                    }
                }
                Segment::Cubic(..) => panic!("bounds for cubics are not implemented"),
            }
            start = seg.end();
            include(start);
        }
        r
    }
}

/// Point on the quadratic Bezier `n0, n1, n2` at parameter `t`.
pub fn quad_point(n0: Point, n1: Point, n2: Point, t: Pt) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * (u * n0.x + t * n1.x) + t * (u * n1.x + t * n2.x),
        u * (u * n0.y + t * n1.y) + t * (u * n1.y + t * n2.y),
    )
}

/// Stationary parameter of one axis, clamped to the curve's range.
///
/// From `B'(t) = 2(1-t)(n1-n0) + 2t(n2-n1) = 0` follows
/// `t = (n0-n1) / (n0+n2-2n1)`. A zero denominator means the axis is
/// linear in `t` and its extremes are the endpoints.
fn stationary_t(a0: Pt, a1: Pt, a2: Pt) -> Option<Pt> {
    let den = a0 + a2 - 2.0 * a1;
    if den == 0.0 {
        return None;
    }
    Some(((a0 - a1) / den).clamp(0.0, 1.0))
}

/// The curve points where x or y is extremal, one per axis.
pub fn extremities_quad(n0: Point, n1: Point, n2: Point) -> impl Iterator<Item = Point> {
    let tx = stationary_t(n0.x, n1.x, n2.x);
    let ty = stationary_t(n0.y, n1.y, n2.y);
    [tx, ty]
        .into_iter()
        .flatten()
        .map(move |t| quad_point(n0, n1, n2, t))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: Pt = 0.01;

    fn quad(c: [(Pt, Pt); 3]) -> Path {
        let mut p = Path::new();
        p.add_start(Point::new(c[0].0, c[0].1));
        p.add_quadratic(Point::new(c[1].0, c[1].1), Point::new(c[2].0, c[2].1));
        p
    }

    fn assert_rect(got: RectF, want: (Pt, Pt, Pt, Pt)) {
        let ok = (got.x1 - want.0).abs() < EPSILON
            && (got.y1 - want.1).abs() < EPSILON
            && (got.x2 - want.2).abs() < EPSILON
            && (got.y2 - want.3).abs() < EPSILON;
        assert!(ok, "got bounds {:?}, want {:?}", got, want);
    }

    #[test]
    fn test_quadratic_known_bounds() {
        let cases = [
            (
                [(10.0, 20.0), (150.0, 40.0), (200.0, 100.0)],
                (10.0, 20.0, 200.0, 100.0),
            ),
            (
                [(18.0, 102.0), (166.0, 183.0), (55.0, 115.0)],
                (18.0, 102.0, 102.57, 146.03),
            ),
            (
                [(200.0, 73.0), (52.0, 186.0), (220.0, 85.0)],
                (130.68, 73.0, 220.0, 132.67),
            ),
            (
                [(130.0, 36.0), (200.0, 156.0), (223.0, 69.0)],
                (130.0, 36.0, 223.0, 105.57),
            ),
        ];
        for (curve, want) in cases {
            assert_rect(quad(curve).bounds(), want);
        }
    }

    #[test]
    fn test_endpoint_dominated_bounds_are_exact() {
        let b = quad([(10.0, 20.0), (150.0, 40.0), (200.0, 100.0)]).bounds();
        assert_eq!(b, RectF::new(10.0, 20.0, 200.0, 100.0));
    }

    #[test]
    fn test_sampled_points_inside_bounds() {
        let curves = [
            [(0.0, 0.0), (50.0, 100.0), (100.0, 0.0)],
            [(-30.0, 5.0), (80.0, -60.0), (10.0, 40.0)],
            [(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)],
            [(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)],
        ];
        for c in curves {
            let b = quad(c).bounds();
            let n0 = Point::new(c[0].0, c[0].1);
            let n1 = Point::new(c[1].0, c[1].1);
            let n2 = Point::new(c[2].0, c[2].1);
            for i in 0..=1000 {
                let p = quad_point(n0, n1, n2, i as Pt / 1000.0);
                assert!(p.x >= b.x1 - 1e-3 && p.x <= b.x2 + 1e-3, "{:?} outside {:?}", p, b);
                assert!(p.y >= b.y1 - 1e-3 && p.y <= b.y2 + 1e-3, "{:?} outside {:?}", p, b);
            }
        }
    }

    #[test]
    fn test_lines_and_subpaths() {
        let mut p = Path::new();
        p.add_start(Point::new(5.0, 5.0));
        p.add_line(Point::new(15.0, 2.0));
        p.add_start(Point::new(-4.0, 30.0));
        p.add_line(Point::new(0.0, 31.0));
        assert_eq!(p.bounds(), RectF::new(-4.0, 2.0, 15.0, 31.0));
    }

    #[test]
    fn test_negative_coordinates_are_kept() {
        let mut p = Path::new();
        p.add_start(Point::new(-10.0, -20.0));
        p.add_line(Point::new(-5.0, -2.0));
        assert_eq!(p.bounds(), RectF::new(-10.0, -20.0, -5.0, -2.0));
    }

    #[test]
    fn test_empty_path_sentinel() {
        let b = Path::new().bounds();
        assert_eq!(b, RectF::new(Pt::MAX, Pt::MAX, 0.0, 0.0));
        assert!(!b.is_valid());
    }

    #[test]
    #[should_panic(expected = "bounds for cubics are not implemented")]
    fn test_cubic_bounds_panic() {
        let mut p = Path::new();
        p.add_start(Point::new(0.0, 0.0));
        p.add_cubic(
            Point::new(1.0, 1.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 0.0),
        );
        let _ = p.bounds();
    }
}
