//! Base renderer with clipping.
//!
//! Wraps a [`PixelFormat`] with an inclusive clip rectangle so that every
//! span reaching the pixels is trimmed to the allowed region first. The
//! curve cache relies on this to keep each rasterization inside its atlas
//! slot.

use crate::basics::{CoverType, RectI};
use crate::color::Rgba8;
use crate::pixfmt::PixelFormat;

/// Clip-and-delegate renderer.
pub struct RendererBase<PF: PixelFormat> {
    ren: PF,
    clip_box: RectI,
}

impl<PF: PixelFormat> RendererBase<PF> {
    /// Wrap `ren`, clipping to its full extent.
    pub fn new(ren: PF) -> Self {
        let mut r = Self {
            ren,
            clip_box: RectI::new(1, 1, 0, 0),
        };
        r.reset_clipping(true);
        r
    }

    pub fn width(&self) -> u32 {
        self.ren.width()
    }

    pub fn height(&self) -> u32 {
        self.ren.height()
    }

    /// Set the inclusive clip rectangle, intersected with the buffer.
    /// Returns `false` and clips everything if the result is empty.
    pub fn clip_box_i(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        let mut cb = RectI::new(x1, y1, x2, y2);
        cb.normalize();
        let full = RectI::new(
            0,
            0,
            self.ren.width() as i32 - 1,
            self.ren.height() as i32 - 1,
        );
        if cb.clip(&full) {
            self.clip_box = cb;
            true
        } else {
            self.clip_box = RectI::new(1, 1, 0, 0);
            false
        }
    }

    /// Clip to a half-open pixel region (`x2`, `y2` exclusive).
    pub fn clip_to_region(&mut self, region: &RectI) -> bool {
        if region.x2 <= region.x1 || region.y2 <= region.y1 {
            self.clip_box = RectI::new(1, 1, 0, 0);
            return false;
        }
        self.clip_box_i(region.x1, region.y1, region.x2 - 1, region.y2 - 1)
    }

    /// Clip to the whole buffer, or to nothing.
    pub fn reset_clipping(&mut self, visibility: bool) {
        self.clip_box = if visibility {
            RectI::new(
                0,
                0,
                self.ren.width() as i32 - 1,
                self.ren.height() as i32 - 1,
            )
        } else {
            RectI::new(1, 1, 0, 0)
        };
    }

    pub fn clip_box(&self) -> &RectI {
        &self.clip_box
    }

    #[inline]
    pub fn inbox(&self, x: i32, y: i32) -> bool {
        self.clip_box.hit_test(x, y)
    }

    /// Trim the run `[x, x + len)` on row `y` to the clip box. Returns the
    /// new start, the new length, and how many leading pixels were cut.
    #[inline]
    fn clip_run(&self, x: i32, y: i32, len: i32) -> Option<(i32, i32, usize)> {
        let cb = &self.clip_box;
        if y < cb.y1 || y > cb.y2 {
            return None;
        }
        let x1 = x.max(cb.x1);
        let x2 = (x + len - 1).min(cb.x2);
        if x2 < x1 {
            return None;
        }
        Some((x1, x2 - x1 + 1, (x1 - x) as usize))
    }

    // ========================================================================
    // Rendering operations (clip then delegate)
    // ========================================================================

    /// Overwrite every pixel inside the clip box with `c`.
    pub fn clear(&mut self, c: &Rgba8) {
        let cb = self.clip_box;
        if !cb.is_valid() {
            return;
        }
        for y in cb.y1..=cb.y2 {
            self.ren.copy_hline(cb.x1, y, (cb.x2 - cb.x1 + 1) as u32, c);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba8, cover: CoverType) {
        if self.inbox(x, y) {
            self.ren.blend_pixel(x, y, c, cover);
        }
    }

    /// Blend `len` pixels from `x` with one color and coverage.
    pub fn blend_hline(&mut self, x: i32, y: i32, len: i32, c: &Rgba8, cover: CoverType) {
        if let Some((x, len, _)) = self.clip_run(x, y, len) {
            self.ren.blend_hline(x, y, len as u32, c, cover);
        }
    }

    /// Blend one color with per-pixel coverage.
    pub fn blend_solid_hspan(&mut self, x: i32, y: i32, len: i32, c: &Rgba8, covers: &[CoverType]) {
        if let Some((x, len, skip)) = self.clip_run(x, y, len) {
            self.ren
                .blend_solid_hspan(x, y, len as u32, c, &covers[skip..]);
        }
    }

    /// Blend per-pixel colors with per-pixel coverage.
    pub fn blend_color_hspan(
        &mut self,
        x: i32,
        y: i32,
        len: i32,
        colors: &[Rgba8],
        covers: &[CoverType],
    ) {
        if let Some((x, len, skip)) = self.clip_run(x, y, len) {
            self.ren
                .blend_color_hspan(x, y, len as u32, &colors[skip..], &covers[skip..]);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
