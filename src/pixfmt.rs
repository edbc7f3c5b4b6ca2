//! RGBA pixel format with alpha blending.
//!
//! [`PixelFormat`] is the layer between the renderers and raw pixels.
//! [`PixfmtRgba32`] blends into an `image::RgbaImage` (straight alpha, one
//! byte per channel) using source-over: color channels interpolate toward
//! the source, alpha toward opaque.
//!
//! Callers are responsible for clipping; coordinates outside the image
//! panic on the slice bounds check.

use image::RgbaImage;

use crate::basics::CoverType;
use crate::color::Rgba8;

/// Blends colors into a pixel buffer.
pub trait PixelFormat {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Blend a single pixel at (x, y) with color `c` and coverage `cover`.
    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba8, cover: CoverType);

    /// Blend `len` pixels at (x, y) with one color and one coverage.
    fn blend_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, cover: CoverType);

    /// Blend one color with per-pixel coverage.
    fn blend_solid_hspan(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, covers: &[CoverType]);

    /// Blend per-pixel colors with per-pixel coverage.
    fn blend_color_hspan(
        &mut self,
        x: i32,
        y: i32,
        len: u32,
        colors: &[Rgba8],
        covers: &[CoverType],
    );

    /// Overwrite `len` pixels with `c`.
    fn copy_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8);

    fn pixel(&self, x: i32, y: i32) -> Rgba8;
}

const BPP: usize = 4;

/// Straight-alpha RGBA32 view over an [`RgbaImage`].
pub struct PixfmtRgba32<'a> {
    img: &'a mut RgbaImage,
}

impl<'a> PixfmtRgba32<'a> {
    pub fn new(img: &'a mut RgbaImage) -> Self {
        Self { img }
    }

    /// Fill the entire image with `c`.
    pub fn clear(&mut self, c: &Rgba8) {
        let px: image::Rgba<u8> = (*c).into();
        for p in self.img.pixels_mut() {
            *p = px;
        }
    }

    /// Bytes of `len` pixels starting at (x, y).
    #[inline]
    fn run_mut(&mut self, x: i32, y: i32, len: u32) -> &mut [u8] {
        let stride = self.img.width() as usize * BPP;
        let start = y as usize * stride + x as usize * BPP;
        let buf: &mut [u8] = &mut **self.img;
        &mut buf[start..start + len as usize * BPP]
    }

    #[inline]
    fn blend_pix(p: &mut [u8], c: &Rgba8, alpha: u8) {
        if alpha == 255 {
            p.copy_from_slice(&[c.r, c.g, c.b, 255]);
            return;
        }
        let mut d = Rgba8::new(p[0], p[1], p[2], p[3]);
        d.blend(*c, alpha);
        p.copy_from_slice(&[d.r, d.g, d.b, d.a]);
    }
}

impl PixelFormat for PixfmtRgba32<'_> {
    fn width(&self) -> u32 {
        self.img.width()
    }

    fn height(&self) -> u32 {
        self.img.height()
    }

    fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        (*self.img.get_pixel(x as u32, y as u32)).into()
    }

    fn copy_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8) {
        for p in self.run_mut(x, y, len).chunks_exact_mut(BPP) {
            p.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        if alpha > 0 {
            Self::blend_pix(self.run_mut(x, y, 1), c, alpha);
        }
    }

    fn blend_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        if alpha == 0 {
            return;
        }
        for p in self.run_mut(x, y, len).chunks_exact_mut(BPP) {
            Self::blend_pix(p, c, alpha);
        }
    }

    fn blend_solid_hspan(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, covers: &[CoverType]) {
        let run = self.run_mut(x, y, len);
        for (p, &cover) in run.chunks_exact_mut(BPP).zip(covers) {
            let alpha = Rgba8::mult_cover(c.a, cover);
            if alpha > 0 {
                Self::blend_pix(p, c, alpha);
            }
        }
    }

    fn blend_color_hspan(
        &mut self,
        x: i32,
        y: i32,
        len: u32,
        colors: &[Rgba8],
        covers: &[CoverType],
    ) {
        let run = self.run_mut(x, y, len);
        for ((p, c), &cover) in run.chunks_exact_mut(BPP).zip(colors).zip(covers) {
            let alpha = Rgba8::mult_cover(c.a, cover);
            if alpha > 0 {
                Self::blend_pix(p, c, alpha);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_pixel() {
        let mut img = RgbaImage::new(4, 3);
        let mut pf = PixfmtRgba32::new(&mut img);
        pf.clear(&Rgba8::WHITE);
        assert_eq!(pf.pixel(3, 2), Rgba8::WHITE);
        assert_eq!((pf.width(), pf.height()), (4, 3));
    }

    #[test]
    fn test_opaque_blend_overwrites() {
        let mut img = RgbaImage::new(4, 4);
        let mut pf = PixfmtRgba32::new(&mut img);
        pf.blend_hline(1, 2, 2, &Rgba8::RED, 255);
        assert_eq!(pf.pixel(1, 2), Rgba8::RED);
        assert_eq!(pf.pixel(2, 2), Rgba8::RED);
        assert_eq!(pf.pixel(3, 2), Rgba8::TRANSPARENT);
        assert_eq!(pf.pixel(1, 1), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_partial_cover_on_transparent() {
        let mut img = RgbaImage::new(2, 1);
        let mut pf = PixfmtRgba32::new(&mut img);
        pf.blend_pixel(0, 0, &Rgba8::BLACK, 128);
        let p = pf.pixel(0, 0);
        assert!((127..=129).contains(&p.a), "alpha {}", p.a);
        assert_eq!((p.r, p.g, p.b), (0, 0, 0));
    }

    #[test]
    fn test_solid_hspan_respects_covers() {
        let mut img = RgbaImage::new(4, 1);
        let mut pf = PixfmtRgba32::new(&mut img);
        pf.clear(&Rgba8::WHITE);
        pf.blend_solid_hspan(0, 0, 3, &Rgba8::BLACK, &[255, 0, 128]);
        assert_eq!(pf.pixel(0, 0), Rgba8::BLACK);
        assert_eq!(pf.pixel(1, 0), Rgba8::WHITE);
        let mid = pf.pixel(2, 0);
        assert!(mid.r > 100 && mid.r < 160);
        assert_eq!(pf.pixel(3, 0), Rgba8::WHITE);
    }

    #[test]
    fn test_color_hspan() {
        let mut img = RgbaImage::new(3, 1);
        let mut pf = PixfmtRgba32::new(&mut img);
        let colors = [Rgba8::RED, Rgba8::WHITE, Rgba8::TRANSPARENT];
        pf.blend_color_hspan(0, 0, 3, &colors, &[255, 255, 255]);
        assert_eq!(pf.pixel(0, 0), Rgba8::RED);
        assert_eq!(pf.pixel(1, 0), Rgba8::WHITE);
        assert_eq!(pf.pixel(2, 0), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_copy_hline() {
        let mut img = RgbaImage::new(3, 2);
        let mut pf = PixfmtRgba32::new(&mut img);
        let c = Rgba8::new(1, 2, 3, 4);
        pf.copy_hline(0, 1, 3, &c);
        assert_eq!(pf.pixel(2, 1), c);
        assert_eq!(pf.pixel(2, 0), Rgba8::TRANSPARENT);
    }
}
