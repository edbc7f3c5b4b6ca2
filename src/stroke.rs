//! Stroking: turning a centerline path into a fillable outline.
//!
//! Each subpath is flattened, cleaned of coincident points and offset by half
//! the width on both sides. Open subpaths become a single contour
//! (cap, left side, cap, right side). Subpaths that end where they started
//! become two rings of opposite orientation, so non-zero filling covers only
//! the band between them.

use crate::basics::{Point, PointD, Pt, PI};
use crate::curves::Flattener;
use crate::math::{calc_distance, calc_intersection, cross_product, VERTEX_DIST_EPSILON};
use crate::path::{Path, Segment};
use crate::shapes::Shape;

/// Flattening precision used when the device scale is unknown.
pub const DEFAULT_APPROXIMATION_SCALE: f64 = 4.0;

const INNER_MITER_LIMIT: f64 = 1.01;

// ============================================================================
// Styles
// ============================================================================

/// Line cap style for the ends of open subpaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    Square,
    #[default]
    Round,
}

/// Line join style at outer corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Bevel,
    #[default]
    Round,
}

/// Width, cap and join of a stroke, in logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: Pt,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl StrokeStyle {
    pub fn new(width: Pt) -> Self {
        Self {
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// Stroke shape
// ============================================================================

/// A shape drawn as an outline of the given width.
#[derive(Debug, Clone)]
pub struct Stroke<S: Shape> {
    pub shape: S,
    pub width: Pt,
    pub cap: LineCap,
    pub join: LineJoin,
    pub approximation_scale: f64,
}

impl<S: Shape> Stroke<S> {
    pub fn new(shape: S, width: Pt) -> Self {
        Self {
            shape,
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
            approximation_scale: DEFAULT_APPROXIMATION_SCALE,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.width,
            cap: self.cap,
            join: self.join,
        }
    }
}

impl<S: Shape> Shape for Stroke<S> {
    fn path(&self) -> Path {
        let mut s = Stroker::new(self.style());
        s.set_approximation_scale(self.approximation_scale);
        s.stroke(&self.shape.path())
    }
}

/// Outline of `path` stroked with the given width, cap and join.
pub fn stroke_path(path: &Path, width: Pt, cap: LineCap, join: LineJoin) -> Path {
    Stroker::new(StrokeStyle { width, cap, join }).stroke(path)
}

// ============================================================================
// Stroker
// ============================================================================

/// Outline generator.
///
/// The approximation scale controls how finely curves, round caps and round
/// joins are subdivided; set it to the device pixels per unit of the input.
#[derive(Debug, Clone)]
pub struct Stroker {
    w: f64,
    width_eps: f64,
    approx_scale: f64,
    cap: LineCap,
    join: LineJoin,
    flattener: Flattener,
}

impl Stroker {
    pub fn new(style: StrokeStyle) -> Self {
        let w = (style.width as f64).abs() * 0.5;
        Self {
            w,
            width_eps: w / 1024.0,
            approx_scale: DEFAULT_APPROXIMATION_SCALE,
            cap: style.cap,
            join: style.join,
            flattener: Flattener::new(DEFAULT_APPROXIMATION_SCALE),
        }
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.flattener.set_approximation_scale(s);
        self.approx_scale = self.flattener.approximation_scale();
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approx_scale
    }

    /// Stroke every subpath of `path`.
    pub fn stroke(&self, path: &Path) -> Path {
        let mut out = Path::new();
        if self.w <= 0.0 {
            return out;
        }
        for poly in self.polylines(path) {
            self.stroke_polyline(poly, &mut out);
        }
        out
    }

    /// Flatten `path` into one polyline per subpath.
    fn polylines(&self, path: &Path) -> Vec<Vec<PointD>> {
        let mut polys: Vec<Vec<PointD>> = Vec::new();
        let mut last = PointD::default();
        for seg in path.segments() {
            match seg {
                Segment::Move(p) => {
                    last = p.into();
                    polys.push(vec![last]);
                    continue;
                }
                _ if polys.is_empty() => polys.push(vec![last]),
                _ => {}
            }
            let Some(poly) = polys.last_mut() else {
                continue;
            };
            match seg {
                Segment::Line(p) => poly.push(p.into()),
                Segment::Quadratic(c, p) => self.flattener.quadratic(last, c.into(), p.into(), poly),
                Segment::Cubic(c1, c2, p) => {
                    self.flattener
                        .cubic(last, c1.into(), c2.into(), p.into(), poly)
                }
                Segment::Move(_) => {}
            }
            last = seg.end().into();
        }
        polys
    }

    fn stroke_polyline(&self, mut v: Vec<PointD>, out: &mut Path) {
        v.dedup_by(|b, a| calc_distance(a.x, a.y, b.x, b.y) <= VERTEX_DIST_EPSILON);
        let closed = v.len() > 3 && {
            let (a, b) = (v[0], v[v.len() - 1]);
            calc_distance(a.x, a.y, b.x, b.y) <= VERTEX_DIST_EPSILON
        };
        if closed {
            v.pop();
        }
        let n = v.len();
        if n < 2 {
            return;
        }

        // dist[i] is the length of the edge leaving v[i].
        let dist: Vec<f64> = (0..n)
            .map(|i| {
                let j = (i + 1) % n;
                calc_distance(v[i].x, v[i].y, v[j].x, v[j].y)
            })
            .collect();

        let mut contour = Vec::new();
        if closed {
            for i in 0..n {
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                self.calc_join(&mut contour, v[prev], v[i], v[next], dist[prev], dist[i]);
            }
            emit(&contour, out);
            contour.clear();
            for i in (0..n).rev() {
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                self.calc_join(&mut contour, v[next], v[i], v[prev], dist[i], dist[prev]);
            }
            emit(&contour, out);
        } else {
            self.calc_cap(&mut contour, v[0], v[1], dist[0]);
            for i in 1..n - 1 {
                self.calc_join(&mut contour, v[i - 1], v[i], v[i + 1], dist[i - 1], dist[i]);
            }
            self.calc_cap(&mut contour, v[n - 1], v[n - 2], dist[n - 2]);
            for i in (1..n - 1).rev() {
                self.calc_join(&mut contour, v[i + 1], v[i], v[i - 1], dist[i], dist[i - 1]);
            }
            emit(&contour, out);
        }
    }

    /// Angle step for round caps and joins.
    fn arc_step(&self) -> f64 {
        (self.w / (self.w + 0.125 / self.approx_scale)).acos() * 2.0
    }

    /// Cap at endpoint `v0`, whose neighbour is `v1`.
    fn calc_cap(&self, out: &mut Vec<PointD>, v0: PointD, v1: PointD, len: f64) {
        let dx1 = (v1.y - v0.y) / len * self.w;
        let dy1 = (v1.x - v0.x) / len * self.w;

        match self.cap {
            LineCap::Butt | LineCap::Square => {
                let (dx2, dy2) = if self.cap == LineCap::Square {
                    (dy1, dx1)
                } else {
                    (0.0, 0.0)
                };
                out.push(PointD::new(v0.x - dx1 - dx2, v0.y + dy1 - dy2));
                out.push(PointD::new(v0.x + dx1 - dx2, v0.y - dy1 - dy2));
            }
            LineCap::Round => {
                let n = (PI / self.arc_step()) as i32;
                let da = PI / (n + 1) as f64;
                out.push(PointD::new(v0.x - dx1, v0.y + dy1));
                let mut a = dy1.atan2(-dx1) + da;
                for _ in 0..n {
                    out.push(PointD::new(v0.x + a.cos() * self.w, v0.y + a.sin() * self.w));
                    a += da;
                }
                out.push(PointD::new(v0.x + dx1, v0.y - dy1));
            }
        }
    }

    /// Corner at `v1` between edges `v0 -> v1` and `v1 -> v2`.
    #[allow(clippy::too_many_arguments)]
    fn calc_join(
        &self,
        out: &mut Vec<PointD>,
        v0: PointD,
        v1: PointD,
        v2: PointD,
        len1: f64,
        len2: f64,
    ) {
        let dx1 = self.w * (v1.y - v0.y) / len1;
        let dy1 = self.w * (v1.x - v0.x) / len1;
        let dx2 = self.w * (v2.y - v1.y) / len2;
        let dy2 = self.w * (v2.x - v1.x) / len2;

        let cp = cross_product(v0.x, v0.y, v1.x, v1.y, v2.x, v2.y);
        if cp > 0.0 {
            // Inner corner: miter, limited by the shorter edge.
            let limit = (len1.min(len2) / self.w).max(INNER_MITER_LIMIT);
            self.calc_miter_revert(out, v0, v1, v2, (dx1, dy1), (dx2, dy2), limit);
            return;
        }

        let dx = (dx1 + dx2) / 2.0;
        let dy = (dy1 + dy2) / 2.0;
        let dbevel = (dx * dx + dy * dy).sqrt();
        if self.approx_scale * (self.w - dbevel) < self.width_eps {
            // Nearly straight: one point where the offset edges meet.
            let p = calc_intersection(
                v0.x + dx1,
                v0.y - dy1,
                v1.x + dx1,
                v1.y - dy1,
                v1.x + dx2,
                v1.y - dy2,
                v2.x + dx2,
                v2.y - dy2,
            )
            .map_or(PointD::new(v1.x + dx1, v1.y - dy1), |(x, y)| PointD::new(x, y));
            out.push(p);
            return;
        }

        match self.join {
            LineJoin::Round => self.calc_arc(out, v1, (dx1, -dy1), (dx2, -dy2)),
            LineJoin::Bevel => {
                out.push(PointD::new(v1.x + dx1, v1.y - dy1));
                out.push(PointD::new(v1.x + dx2, v1.y - dy2));
            }
        }
    }

    /// Arc around `c` from offset `d1` to offset `d2`.
    fn calc_arc(&self, out: &mut Vec<PointD>, c: PointD, d1: (f64, f64), d2: (f64, f64)) {
        let mut a1 = d1.1.atan2(d1.0);
        let mut a2 = d2.1.atan2(d2.0);
        if a1 > a2 {
            a2 += 2.0 * PI;
        }
        let n = ((a2 - a1) / self.arc_step()) as i32;
        let da = (a2 - a1) / (n + 1) as f64;

        out.push(PointD::new(c.x + d1.0, c.y + d1.1));
        a1 += da;
        for _ in 0..n {
            out.push(PointD::new(c.x + a1.cos() * self.w, c.y + a1.sin() * self.w));
            a1 += da;
        }
        out.push(PointD::new(c.x + d2.0, c.y + d2.1));
    }

    /// Miter at `v1`, falling back to a bevel past `limit` widths.
    #[allow(clippy::too_many_arguments)]
    fn calc_miter_revert(
        &self,
        out: &mut Vec<PointD>,
        v0: PointD,
        v1: PointD,
        v2: PointD,
        (dx1, dy1): (f64, f64),
        (dx2, dy2): (f64, f64),
        limit: f64,
    ) {
        let lim = self.w * limit;
        match calc_intersection(
            v0.x + dx1,
            v0.y - dy1,
            v1.x + dx1,
            v1.y - dy1,
            v1.x + dx2,
            v1.y - dy2,
            v2.x + dx2,
            v2.y - dy2,
        ) {
            Some((xi, yi)) => {
                if calc_distance(v1.x, v1.y, xi, yi) <= lim {
                    out.push(PointD::new(xi, yi));
                    return;
                }
            }
            None => {
                // Parallel offsets: fine when the path continues straight on.
                let x2 = v1.x + dx1;
                let y2 = v1.y - dy1;
                if (cross_product(v0.x, v0.y, v1.x, v1.y, x2, y2) < 0.0)
                    == (cross_product(v1.x, v1.y, v2.x, v2.y, x2, y2) < 0.0)
                {
                    out.push(PointD::new(x2, y2));
                    return;
                }
            }
        }
        out.push(PointD::new(v1.x + dx1, v1.y - dy1));
        out.push(PointD::new(v1.x + dx2, v1.y - dy2));
    }
}

/// Append `contour` to `out` as an explicitly closed polygon.
fn emit(contour: &[PointD], out: &mut Path) {
    let Some(first) = contour.first() else {
        return;
    };
    let to_pt = |p: &PointD| Point::new(p.x as Pt, p.y as Pt);
    out.add_start(to_pt(first));
    for p in &contour[1..] {
        out.add_line(to_pt(p));
    }
    out.add_line(to_pt(first));
}

// ============================================================================
// Tests
// ============================================================================
