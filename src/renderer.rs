//! Scanline rendering functions.
//!
//! Drive the rasterizer, scanline and base renderer together: sweep each
//! row of coverage and blend it either in one solid color or through a
//! [`SpanGenerator`] that supplies a color per pixel.

use image::RgbaImage;

use crate::color::Rgba8;
use crate::pixfmt::PixelFormat;
use crate::rasterizer::Rasterizer;
use crate::renderer_base::RendererBase;
use crate::scanline::{Scanline, ScanlineU8};

/// Render every scanline of `ras` in `color`.
pub fn render_scanlines_aa_solid<PF: PixelFormat>(
    ras: &mut Rasterizer,
    sl: &mut ScanlineU8,
    ren: &mut RendererBase<PF>,
    color: &Rgba8,
) {
    if !ras.rewind_scanlines() {
        return;
    }
    sl.reset(ras.min_x(), ras.max_x());
    while ras.sweep_scanline(sl) {
        let y = sl.y();
        for span in sl.spans() {
            ren.blend_solid_hspan(span.x, y, span.len, color, sl.covers(span));
        }
    }
}

// ============================================================================
// Span generators
// ============================================================================

/// Produces per-pixel colors for a run of pixels.
pub trait SpanGenerator {
    /// Called once before rendering begins.
    fn prepare(&mut self) {}

    /// Fill `span` with the colors of the pixels starting at (x, y).
    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32);
}

/// Render every scanline of `ras`, coloring pixels with `span_gen`.
///
/// `colors` is scratch space reused across spans.
pub fn render_scanlines_aa<PF, SG>(
    ras: &mut Rasterizer,
    sl: &mut ScanlineU8,
    ren: &mut RendererBase<PF>,
    colors: &mut Vec<Rgba8>,
    span_gen: &mut SG,
) where
    PF: PixelFormat,
    SG: SpanGenerator + ?Sized,
{
    if !ras.rewind_scanlines() {
        return;
    }
    sl.reset(ras.min_x(), ras.max_x());
    span_gen.prepare();
    while ras.sweep_scanline(sl) {
        let y = sl.y();
        for span in sl.spans() {
            let len = span.len as usize;
            if colors.len() < len {
                colors.resize(len, Rgba8::TRANSPARENT);
            }
            let run = &mut colors[..len];
            span_gen.generate(run, span.x, y);
            ren.blend_color_hspan(span.x, y, span.len, run, sl.covers(span));
        }
    }
}

/// Tiles an image across the plane, with its top-left corner at `origin`.
pub struct ImagePattern<'a> {
    img: &'a RgbaImage,
    origin: (i32, i32),
}

impl<'a> ImagePattern<'a> {
    pub fn new(img: &'a RgbaImage, origin_x: i32, origin_y: i32) -> Self {
        Self {
            img,
            origin: (origin_x, origin_y),
        }
    }
}

impl SpanGenerator for ImagePattern<'_> {
    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32) {
        let (w, h) = (self.img.width() as i32, self.img.height() as i32);
        if w == 0 || h == 0 {
            span.fill(Rgba8::TRANSPARENT);
            return;
        }
        let sy = (y - self.origin.1).rem_euclid(h) as u32;
        for (i, c) in span.iter_mut().enumerate() {
            let sx = (x + i as i32 - self.origin.0).rem_euclid(w) as u32;
            *c = (*self.img.get_pixel(sx, sy)).into();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
