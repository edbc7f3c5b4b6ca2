//! Anti-aliased polygon scanline rasterizer.
//!
//! Contours go in through `move_to`/`line_to` (24.8 fixed point) or
//! [`Rasterizer::add_path`]; coverage comes out one row at a time through
//! [`Rasterizer::sweep_scanline`]. Every contour is implicitly closed.
//!
//! Device coordinates are scaled by 256 (`POLY_SUBPIXEL_SCALE`), not 255,
//! so the low 8 bits are exactly the subpixel fraction and cell indices
//! come from a plain shift.

use crate::basics::{poly_coord, FillingRule, PointD, POLY_SUBPIXEL_SHIFT};
use crate::curves::Flattener;
use crate::path::{Path, Segment};
use crate::rasterizer_cells::Cells;
use crate::scanline::Scanline;

const AA_SHIFT: u32 = 8;
const AA_SCALE: i32 = 1 << AA_SHIFT;
const AA_MASK: i32 = AA_SCALE - 1;
const AA_SCALE2: i32 = AA_SCALE * 2;
const AA_MASK2: i32 = AA_SCALE2 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
    Closed,
}

/// Polygon rasterizer with 8-bit coverage output.
///
/// 1. Optionally set the [`FillingRule`] (non-zero by default).
/// 2. Add contours.
/// 3. Call [`rewind_scanlines`](Rasterizer::rewind_scanlines), then
///    [`sweep_scanline`](Rasterizer::sweep_scanline) until it returns
///    `false`.
///
/// Adding a contour after a sweep starts a new pass.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    cells: Cells,
    filling_rule: FillingRule,
    start_x: i32,
    start_y: i32,
    last_x: i32,
    last_y: i32,
    status: Status,
    scan_y: i32,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cells: Cells::new(),
            filling_rule: FillingRule::NonZero,
            start_x: 0,
            start_y: 0,
            last_x: 0,
            last_y: 0,
            status: Status::Initial,
            scan_y: 0,
        }
    }

    /// Discard all polygon data.
    pub fn reset(&mut self) {
        self.cells.reset();
        self.status = Status::Initial;
    }

    pub fn set_filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    pub fn filling_rule(&self) -> FillingRule {
        self.filling_rule
    }

    // ========================================================================
    // Path building
    // ========================================================================

    /// Close the current contour back to its start point.
    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.cells
                .line(self.last_x, self.last_y, self.start_x, self.start_y);
            self.status = Status::Closed;
        }
    }

    /// Start a new contour at `(x, y)` in 24.8 fixed point.
    pub fn move_to(&mut self, x: i32, y: i32) {
        if self.cells.is_sorted() {
            self.reset();
        }
        self.close_polygon();
        self.start_x = x;
        self.start_y = y;
        self.last_x = x;
        self.last_y = y;
        self.status = Status::MoveTo;
    }

    /// Edge from the current point to `(x, y)` in 24.8 fixed point.
    pub fn line_to(&mut self, x: i32, y: i32) {
        self.cells.line(self.last_x, self.last_y, x, y);
        self.last_x = x;
        self.last_y = y;
        self.status = Status::LineTo;
    }

    pub fn move_to_d(&mut self, x: f64, y: f64) {
        self.move_to(poly_coord(x), poly_coord(y));
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        self.line_to(poly_coord(x), poly_coord(y));
    }

    /// Add every subpath of `path`, mapping each point `p` to the device
    /// pixel `p * scale + (dx, dy)`. Curves are flattened in device space.
    pub fn add_path(&mut self, path: &Path, scale: f64, dx: f64, dy: f64) {
        if self.cells.is_sorted() {
            self.reset();
        }
        let flattener = Flattener::new(1.0);
        let map = |p: crate::basics::Point| {
            PointD::new(p.x as f64 * scale + dx, p.y as f64 * scale + dy)
        };
        let mut last = PointD::new(dx, dy);
        let mut flat = Vec::new();
        for seg in path.segments() {
            match seg {
                Segment::Move(p) => {
                    last = map(p);
                    self.move_to_d(last.x, last.y);
                    continue;
                }
                Segment::Line(p) => {
                    last = map(p);
                    self.line_to_d(last.x, last.y);
                    continue;
                }
                Segment::Quadratic(c, p) => {
                    flat.clear();
                    flattener.quadratic(last, map(c), map(p), &mut flat);
                }
                Segment::Cubic(c1, c2, p) => {
                    flat.clear();
                    flattener.cubic(last, map(c1), map(c2), map(p), &mut flat);
                }
            }
            for q in &flat {
                self.line_to_d(q.x, q.y);
            }
            last = map(seg.end());
        }
    }

    // ========================================================================
    // Bounding box
    // ========================================================================

    pub fn min_x(&self) -> i32 {
        self.cells.min_x()
    }
    pub fn min_y(&self) -> i32 {
        self.cells.min_y()
    }
    pub fn max_x(&self) -> i32 {
        self.cells.max_x()
    }
    pub fn max_y(&self) -> i32 {
        self.cells.max_y()
    }

    // ========================================================================
    // Scanline sweeping
    // ========================================================================

    /// Close the open contour, sort cells and start at the top row.
    /// Returns `false` when there is nothing to draw.
    pub fn rewind_scanlines(&mut self) -> bool {
        self.close_polygon();
        self.cells.sort();
        if self.cells.is_empty() {
            return false;
        }
        self.scan_y = self.cells.min_y();
        true
    }

    /// Coverage from a doubled-area accumulator.
    #[inline]
    pub fn calculate_alpha(&self, area: i32) -> u32 {
        let mut cover = (area >> (POLY_SUBPIXEL_SHIFT * 2 + 1 - AA_SHIFT)).abs();
        if self.filling_rule == FillingRule::EvenOdd {
            cover &= AA_MASK2;
            if cover > AA_SCALE {
                cover = AA_SCALE2 - cover;
            }
        }
        cover.min(AA_MASK) as u32
    }

    /// Emit the next non-empty row into `sl`. Returns `false` once every
    /// row has been produced.
    pub fn sweep_scanline<SL: Scanline>(&mut self, sl: &mut SL) -> bool {
        loop {
            if self.scan_y > self.cells.max_y() {
                return false;
            }
            sl.reset_spans();

            let mut cover = 0;
            let mut row = self.cells.row(self.scan_y).peekable();
            while let Some(first) = row.next() {
                let x = first.x;
                let mut area = first.area;
                cover += first.cover;
                while let Some(c) = row.next_if(|c| c.x == x) {
                    area += c.area;
                    cover += c.cover;
                }

                let mut span_x = x;
                if area != 0 {
                    let alpha = self.calculate_alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - area);
                    if alpha != 0 {
                        sl.add_cell(x, alpha);
                    }
                    span_x += 1;
                }

                // Pixels strictly between this cell and the next share the
                // running winding number.
                if let Some(next) = row.peek() {
                    if next.x > span_x {
                        let alpha = self.calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                        if alpha != 0 {
                            sl.add_span(span_x, (next.x - span_x) as u32, alpha);
                        }
                    }
                }
            }

            if sl.num_spans() > 0 {
                break;
            }
            self.scan_y += 1;
        }
        sl.finalize(self.scan_y);
        self.scan_y += 1;
        true
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
