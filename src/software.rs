//! CPU backend.
//!
//! Keeps textures as `RgbaImage`s and composites quads into a target image
//! by inverse-mapping each covered pixel center into the source rectangle
//! and taking the nearest texel. Blending is source-over.

use image::RgbaImage;

use crate::affine::Affine;
use crate::basics::{iceil, ifloor, Point, Pt, RectI};
use crate::color::Rgba8;
use crate::engine::{Backend, TextureId};
use crate::error::{Error, Result};
use crate::pixfmt::PixfmtRgba32;
use crate::renderer_base::RendererBase;

/// Reference [`Backend`] rendering into an owned image.
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    target: RgbaImage,
    textures: Vec<RgbaImage>,
}

impl SoftwareBackend {
    /// A transparent `width` x `height` target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
            textures: Vec::new(),
        }
    }

    pub fn target(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_target(self) -> RgbaImage {
        self.target
    }

    /// Fill the whole target with `c`.
    pub fn clear(&mut self, c: Rgba8) {
        PixfmtRgba32::new(&mut self.target).clear(&c);
    }

    pub fn texture(&self, id: TextureId) -> Option<&RgbaImage> {
        self.textures.get(id.0 as usize)
    }
}

impl Backend for SoftwareBackend {
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyTexture);
        }
        self.textures.push(RgbaImage::new(width, height));
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn upload(&mut self, texture: TextureId, region: &RectI, pixels: &RgbaImage) -> Result<()> {
        let dst = self
            .textures
            .get_mut(texture.0 as usize)
            .ok_or(Error::UnknownTexture(texture))?;
        let w = dst.width().min(pixels.width()) as i32;
        let h = dst.height().min(pixels.height()) as i32;
        let mut r = *region;
        if r.x2 <= r.x1 || r.y2 <= r.y1 || !r.clip(&RectI::new(0, 0, w, h)) {
            return Ok(());
        }
        for y in r.y1..r.y2 {
            for x in r.x1..r.x2 {
                dst.put_pixel(x as u32, y as u32, *pixels.get_pixel(x as u32, y as u32));
            }
        }
        Ok(())
    }

    fn draw_quad(&mut self, texture: TextureId, corners: [Point; 3], src: &RectI) -> Result<()> {
        let tex = self
            .textures
            .get(texture.0 as usize)
            .ok_or(Error::UnknownTexture(texture))?;
        let mut src = *src;
        if !src.clip(&RectI::new(0, 0, tex.width() as i32, tex.height() as i32))
            || src.width() <= 0
            || src.height() <= 0
        {
            return Ok(());
        }

        // Source pixel offset within `src` -> device pixel.
        let (w, h) = (src.width() as Pt, src.height() as Pt);
        let [p0, p1, p2] = corners;
        let m = Affine::new(
            (p1.x - p0.x) / w,
            (p1.y - p0.y) / w,
            (p2.x - p0.x) / h,
            (p2.y - p0.y) / h,
            p0.x,
            p0.y,
        );
        let Some(inv) = m.inverted() else {
            return Ok(());
        };

        let p3 = Point::new(p1.x + p2.x - p0.x, p1.y + p2.y - p0.y);
        let xs = [p0.x, p1.x, p2.x, p3.x];
        let ys = [p0.y, p1.y, p2.y, p3.y];
        let fold = |v: &[Pt; 4], f: fn(Pt, Pt) -> Pt| v.iter().copied().fold(v[0], f);
        let x1 = ifloor(fold(&xs, Pt::min) as f64).max(0);
        let y1 = ifloor(fold(&ys, Pt::min) as f64).max(0);
        let x2 = iceil(fold(&xs, Pt::max) as f64).min(self.target.width() as i32);
        let y2 = iceil(fold(&ys, Pt::max) as f64).min(self.target.height() as i32);

        let mut ren = RendererBase::new(PixfmtRgba32::new(&mut self.target));
        for y in y1..y2 {
            for x in x1..x2 {
                let s = inv.transform_point(Point::new(x as Pt + 0.5, y as Pt + 0.5));
                if s.x < 0.0 || s.y < 0.0 || s.x >= w || s.y >= h {
                    continue;
                }
                let sx = (src.x1 + s.x as i32) as u32;
                let sy = (src.y1 + s.y as i32) as u32;
                let c: Rgba8 = (*tex.get_pixel(sx, sy)).into();
                if !c.is_transparent() {
                    ren.blend_pixel(x, y, &c, 255);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
