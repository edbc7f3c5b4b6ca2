//! Scanline containers.
//!
//! The rasterizer's sweep hands each row's coverage to a [`Scanline`] as a
//! sequence of single cells and constant-coverage runs in increasing x.
//! [`ScanlineU8`] stores one coverage byte per pixel and merges touching
//! runs into spans for the renderer.

/// Receiver for one row of coverage.
pub trait Scanline {
    /// Forget the previous row's spans.
    fn reset_spans(&mut self);
    /// One pixel at `x` with coverage `cover`.
    fn add_cell(&mut self, x: i32, cover: u32);
    /// `len` pixels from `x`, all with coverage `cover`.
    fn add_span(&mut self, x: i32, len: u32, cover: u32);
    /// Close the row at `y`.
    fn finalize(&mut self, y: i32);
    fn num_spans(&self) -> usize;
    fn y(&self) -> i32;
}

/// A run of pixels with per-pixel coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub x: i32,
    pub len: i32,
    offset: usize,
}

/// Unpacked scanline: per-pixel u8 coverage.
///
/// [`reset`](ScanlineU8::reset) sizes the coverage buffer for the x range
/// the rasterizer can produce; cells outside that range are a caller bug.
#[derive(Debug, Clone, Default)]
pub struct ScanlineU8 {
    min_x: i32,
    next_x: Option<i32>,
    y: i32,
    covers: Vec<u8>,
    spans: Vec<Span>,
}

impl ScanlineU8 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for rows whose cells lie within `min_x..=max_x`.
    pub fn reset(&mut self, min_x: i32, max_x: i32) {
        let len = (max_x - min_x + 2).max(0) as usize;
        if len > self.covers.len() {
            self.covers.resize(len, 0);
        }
        self.min_x = min_x;
        self.reset_spans();
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Coverage of every pixel in `span`.
    pub fn covers(&self, span: &Span) -> &[u8] {
        &self.covers[span.offset..span.offset + span.len as usize]
    }

    fn push(&mut self, x: i32, len: u32) {
        let touching = self.next_x == Some(x);
        self.next_x = Some(x + len as i32);
        if touching {
            if let Some(last) = self.spans.last_mut() {
                last.len += len as i32;
                return;
            }
        }
        self.spans.push(Span {
            x,
            len: len as i32,
            offset: (x - self.min_x) as usize,
        });
    }
}

impl Scanline for ScanlineU8 {
    fn reset_spans(&mut self) {
        self.spans.clear();
        self.next_x = None;
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        self.covers[(x - self.min_x) as usize] = cover as u8;
        self.push(x, 1);
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        let start = (x - self.min_x) as usize;
        self.covers[start..start + len as usize].fill(cover as u8);
        self.push(x, len);
    }

    fn finalize(&mut self, y: i32) {
        self.y = y;
    }

    fn num_spans(&self) -> usize {
        self.spans.len()
    }

    fn y(&self) -> i32 {
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_runs_merge() {
        let mut sl = ScanlineU8::new();
        sl.reset(0, 100);
        sl.add_cell(10, 100);
        sl.add_span(11, 3, 255);
        sl.add_cell(14, 50);
        sl.finalize(7);
        assert_eq!(sl.num_spans(), 1);
        assert_eq!(sl.y(), 7);
        let span = sl.spans()[0];
        assert_eq!((span.x, span.len), (10, 5));
        assert_eq!(sl.covers(&span), &[100, 255, 255, 255, 50]);
    }

    #[test]
    fn test_gap_starts_new_span() {
        let mut sl = ScanlineU8::new();
        sl.reset(-5, 50);
        sl.add_cell(-5, 10);
        sl.add_cell(20, 20);
        assert_eq!(sl.num_spans(), 2);
        assert_eq!(sl.spans()[1].x, 20);
        assert_eq!(sl.covers(&sl.spans()[1]), &[20]);
        assert_eq!(sl.covers(&sl.spans()[0]), &[10]);
    }

    #[test]
    fn test_reset_spans_keeps_range() {
        let mut sl = ScanlineU8::new();
        sl.reset(0, 10);
        sl.add_span(0, 4, 9);
        sl.reset_spans();
        assert_eq!(sl.num_spans(), 0);
        sl.add_cell(4, 1);
        assert_eq!(sl.spans()[0].x, 4);
    }
}
