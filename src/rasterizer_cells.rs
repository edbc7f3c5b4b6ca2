//! Edge-to-cell accumulation.
//!
//! Edges arrive in 24.8 fixed point. Every pixel an edge touches gets a
//! [`Cell`] recording how much the edge moves the winding count (`cover`)
//! and twice the signed area it leaves to its right inside the pixel
//! (`area`). Summing covers left to right along a row gives the winding
//! number of each pixel; the area term anti-aliases the boundary pixels.

use crate::basics::{POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};

const ONE: i32 = POLY_SUBPIXEL_SCALE as i32;
const FRAC: i32 = POLY_SUBPIXEL_MASK as i32;

/// Edges longer than this in x are split in two to keep the i64 products in
/// range.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

/// Accumulated coverage of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
}

impl Cell {
    const UNSET: Cell = Cell {
        x: i32::MAX,
        y: i32::MAX,
        cover: 0,
        area: 0,
    };

    #[inline]
    fn at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.cover == 0 && self.area == 0
    }
}

/// Per-row slice of the sorted index.
#[derive(Debug, Clone, Copy, Default)]
struct Row {
    start: usize,
    len: usize,
}

// ============================================================================
// Cells
// ============================================================================

/// Cell store for one rasterization pass.
///
/// Cells are appended unordered while edges are added; [`sort`](Cells::sort)
/// buckets them by row and orders each row by x. Adding an edge after
/// sorting requires a [`reset`](Cells::reset).
#[derive(Debug, Clone)]
pub struct Cells {
    cells: Vec<Cell>,
    current: Cell,
    order: Vec<u32>,
    rows: Vec<Row>,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
}

impl Cells {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            current: Cell::UNSET,
            order: Vec::new(),
            rows: Vec::new(),
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
        }
    }

    /// Discard all cells, keeping allocations.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.order.clear();
        self.rows.clear();
        self.current = Cell::UNSET;
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
    }

    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    pub fn min_y(&self) -> i32 {
        self.min_y
    }
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Cells of row `y` ordered by x. Only meaningful after sorting; rows
    /// outside the covered range are empty.
    pub fn row(&self, y: i32) -> impl Iterator<Item = &Cell> + '_ {
        let r = if self.sorted && y >= self.min_y && y <= self.max_y {
            self.rows[(y - self.min_y) as usize]
        } else {
            Row::default()
        };
        self.order[r.start..r.start + r.len]
            .iter()
            .map(move |&i| &self.cells[i as usize])
    }

    #[inline]
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.cells.push(self.current);
        }
    }

    #[inline]
    fn move_to_cell(&mut self, x: i32, y: i32) {
        if !self.current.at(x, y) {
            self.flush();
            self.current = Cell {
                x,
                y,
                cover: 0,
                area: 0,
            };
        }
    }

    #[inline]
    fn accumulate(&mut self, cover: i32, area: i32) {
        self.current.cover += cover;
        self.current.area += area;
    }

    fn include(&mut self, ex: i32, ey: i32) {
        self.min_x = self.min_x.min(ex);
        self.max_x = self.max_x.max(ex);
        self.min_y = self.min_y.min(ey);
        self.max_y = self.max_y.max(ey);
    }

    /// Walk an edge fragment that stays inside pixel row `ey`.
    ///
    /// `x1`, `x2` are full fixed-point x; `fy1`, `fy2` are the fractional y
    /// within the row.
    fn row_span(&mut self, ey: i32, x1: i32, fy1: i32, x2: i32, fy2: i32) {
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let fx1 = x1 & FRAC;
        let fx2 = x2 & FRAC;

        if fy1 == fy2 {
            // No vertical extent: contributes nothing, only moves the pen.
            self.move_to_cell(ex2, ey);
            return;
        }

        let dy = fy2 - fy1;
        if ex1 == ex2 {
            self.accumulate(dy, (fx1 + fx2) * dy);
            return;
        }

        // The fragment crosses pixel columns. Distribute dy over them in
        // proportion to the x distance, carrying the remainder exactly.
        let (mut dx, first, step, p) = if x2 >= x1 {
            (x2 as i64 - x1 as i64, ONE, 1, (ONE - fx1) as i64 * dy as i64)
        } else {
            (x1 as i64 - x2 as i64, 0, -1, fx1 as i64 * dy as i64)
        };
        if dx == 0 {
            dx = 1;
        }

        let mut part = (p / dx) as i32;
        let mut rem = p % dx;
        if rem < 0 {
            part -= 1;
            rem += dx;
        }
        self.accumulate(part, (fx1 + first) * part);

        let mut ex = ex1 + step;
        let mut fy = fy1 + part;
        self.move_to_cell(ex, ey);

        if ex != ex2 {
            let p = ONE as i64 * (fy2 - fy + part) as i64;
            let mut lift = (p / dx) as i32;
            let mut lift_rem = p % dx;
            if lift_rem < 0 {
                lift -= 1;
                lift_rem += dx;
            }
            rem -= dx;

            while ex != ex2 {
                part = lift;
                rem += lift_rem;
                if rem >= 0 {
                    rem -= dx;
                    part += 1;
                }
                self.accumulate(part, ONE * part);
                fy += part;
                ex += step;
                self.move_to_cell(ex, ey);
            }
        }

        let part = fy2 - fy;
        self.accumulate(part, (fx2 + ONE - first) * part);
    }

    /// Add the edge `(x1, y1) -> (x2, y2)` in 24.8 fixed point.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;
        if dx.abs() >= DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let ey1 = y1 >> POLY_SUBPIXEL_SHIFT;
        let ey2 = y2 >> POLY_SUBPIXEL_SHIFT;
        let fy1 = y1 & FRAC;
        let fy2 = y2 & FRAC;

        self.include(x1 >> POLY_SUBPIXEL_SHIFT, ey1);
        self.include(x2 >> POLY_SUBPIXEL_SHIFT, ey2);

        self.move_to_cell(x1 >> POLY_SUBPIXEL_SHIFT, ey1);

        if ey1 == ey2 {
            self.row_span(ey1, x1, fy1, x2, fy2);
            return;
        }

        // Split the edge at every row boundary it crosses, stepping x by
        // dx/dy per row with an exact remainder.
        let dy = y2 as i64 - y1 as i64;
        let (ady, first, step, p) = if dy > 0 {
            (dy, ONE, 1, (ONE - fy1) as i64 * dx)
        } else {
            (-dy, 0, -1, fy1 as i64 * dx)
        };

        let mut part = (p / ady) as i32;
        let mut rem = p % ady;
        if rem < 0 {
            part -= 1;
            rem += ady;
        }

        let mut x_from = x1 + part;
        self.row_span(ey1, x1, fy1, x_from, first);

        let mut ey = ey1 + step;
        self.move_to_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey);

        if ey != ey2 {
            let p = ONE as i64 * dx;
            let mut lift = (p / ady) as i32;
            let mut lift_rem = p % ady;
            if lift_rem < 0 {
                lift -= 1;
                lift_rem += ady;
            }
            rem -= ady;

            while ey != ey2 {
                part = lift;
                rem += lift_rem;
                if rem >= 0 {
                    rem -= ady;
                    part += 1;
                }
                let x_to = x_from + part;
                self.row_span(ey, x_from, ONE - first, x_to, first);
                x_from = x_to;
                ey += step;
                self.move_to_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey);
            }
        }
        self.row_span(ey, x_from, ONE - first, x2, fy2);
    }

    /// Bucket cells by row and order each row by x.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.flush();
        self.current = Cell::UNSET;
        if self.cells.is_empty() {
            return;
        }

        let height = (self.max_y - self.min_y + 1) as usize;
        self.rows.clear();
        self.rows.resize(height, Row::default());

        for c in &self.cells {
            self.rows[(c.y - self.min_y) as usize].len += 1;
        }
        let mut start = 0;
        for r in &mut self.rows {
            r.start = start;
            start += r.len;
            r.len = 0;
        }

        self.order.clear();
        self.order.resize(self.cells.len(), 0);
        for (i, c) in self.cells.iter().enumerate() {
            let r = &mut self.rows[(c.y - self.min_y) as usize];
            self.order[r.start + r.len] = i as u32;
            r.len += 1;
        }

        let cells = &self.cells;
        for r in &self.rows {
            self.order[r.start..r.start + r.len].sort_unstable_by_key(|&i| cells[i as usize].x);
        }
        self.sorted = true;
    }
}

impl Default for Cells {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
