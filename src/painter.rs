//! Path painting into a region of an RGBA image.
//!
//! [`Painter`] owns the rasterizer, scanline and span buffers so that
//! repeated draws reuse their allocations. Points are scaled by the
//! pixels-per-point factor, shifted by a pixel offset and clipped to the
//! destination region before blending.

use image::RgbaImage;

use crate::basics::{FillingRule, RectI};
use crate::color::Rgba8;
use crate::path::Path;
use crate::pixfmt::PixfmtRgba32;
use crate::rasterizer::Rasterizer;
use crate::renderer::{render_scanlines_aa, render_scanlines_aa_solid, ImagePattern};
use crate::renderer_base::RendererBase;
use crate::scanline::ScanlineU8;
use crate::stroke::{StrokeStyle, Stroker};

/// What a path's coverage is filled with.
#[derive(Debug, Clone, Copy)]
pub enum Paint<'a> {
    Solid(Rgba8),
    /// The image repeated in both directions, anchored at the region's
    /// top-left corner.
    Image(&'a RgbaImage),
}

/// Whether the path is filled or outlined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawStyle {
    #[default]
    Fill,
    Stroke(StrokeStyle),
}

/// Reusable path painter.
#[derive(Debug, Clone)]
pub struct Painter {
    ras: Rasterizer,
    sl: ScanlineU8,
    colors: Vec<Rgba8>,
    pixels_per_pt: f64,
}

impl Painter {
    pub fn new(pixels_per_pt: f64) -> Self {
        let mut p = Self {
            ras: Rasterizer::new(),
            sl: ScanlineU8::new(),
            colors: Vec::new(),
            pixels_per_pt: 1.0,
        };
        p.set_pixels_per_pt(pixels_per_pt);
        p
    }

    /// Non-positive or non-finite values fall back to 1.
    pub fn set_pixels_per_pt(&mut self, ppp: f64) {
        self.pixels_per_pt = if ppp.is_finite() && ppp > 0.0 { ppp } else { 1.0 };
    }

    pub fn pixels_per_pt(&self) -> f64 {
        self.pixels_per_pt
    }

    pub fn set_filling_rule(&mut self, rule: FillingRule) {
        self.ras.set_filling_rule(rule);
    }

    pub fn filling_rule(&self) -> FillingRule {
        self.ras.filling_rule()
    }

    /// Draw `path` into `dst`, touching only pixels inside the half-open
    /// `region`. Each point `p` lands on the pixel `p * ppp + offset`.
    pub fn rasterize(
        &mut self,
        dst: &mut RgbaImage,
        region: &RectI,
        path: &Path,
        offset: (f64, f64),
        style: &DrawStyle,
        paint: &Paint<'_>,
    ) {
        let mut ren = RendererBase::new(PixfmtRgba32::new(dst));
        if !ren.clip_to_region(region) {
            return;
        }

        self.ras.reset();
        match style {
            DrawStyle::Fill => {
                self.ras.add_path(path, self.pixels_per_pt, offset.0, offset.1);
            }
            DrawStyle::Stroke(stroke) => {
                let mut stroker = Stroker::new(*stroke);
                stroker.set_approximation_scale(self.pixels_per_pt);
                let outline = stroker.stroke(path);
                self.ras
                    .add_path(&outline, self.pixels_per_pt, offset.0, offset.1);
            }
        }

        match paint {
            Paint::Solid(color) => {
                render_scanlines_aa_solid(&mut self.ras, &mut self.sl, &mut ren, color);
            }
            Paint::Image(img) => {
                let mut pattern = ImagePattern::new(img, region.x1, region.y1);
                render_scanlines_aa(
                    &mut self.ras,
                    &mut self.sl,
                    &mut ren,
                    &mut self.colors,
                    &mut pattern,
                );
            }
        }
    }
}

impl Default for Painter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
