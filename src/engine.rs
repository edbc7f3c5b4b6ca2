//! Rendering engine boundary.
//!
//! An [`Engine`] owns loaded textures and curves and draws a [`Scene`]
//! each frame. [`RasterEngine`] is the implementation: it keeps curves in a
//! [`Cache`] atlas and hands textured quads to a [`Backend`], which is the
//! only part that touches the output device.
//!
//! Scene coordinates are logical points. The walk starts from
//! `scale(pixels_per_pt)`, so everything a backend receives is in device
//! pixels.

use std::collections::{HashMap, HashSet};

use image::RgbaImage;
use log::{debug, trace};

use crate::affine::Affine;
use crate::basics::{Point, Pt, RectI};
use crate::cache::{Cache, CacheConfig, CurveId};
use crate::clock::Time;
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::scene::{NodeId, Scene};

/// Handle of a texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u32);

/// A rectangle of texture pixels, drawn into a node's unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubTex {
    pub texture: TextureId,
    pub rect: RectI,
}

impl SubTex {
    pub fn new(texture: TextureId, rect: RectI) -> Self {
        Self { texture, rect }
    }
}

/// What callers render scenes with.
pub trait Engine {
    /// Copy `img` into a new texture.
    fn load_texture(&mut self, img: &RgbaImage) -> Result<TextureId>;

    /// Load a curve from its tag-stream encoding: `{0, x, y}` starts a
    /// subpath, `{1, x, y}` adds a line, `{2, cx, cy, x, y}` a quadratic.
    /// Cubic records (`{3, ...}`) decode but are rejected.
    fn load_curve(&mut self, encoded: &[Pt]) -> Result<CurveId>;

    /// Forget a curve. Unknown ids are ignored.
    fn unload_curve(&mut self, id: CurveId);

    /// Draw the tree under `root` as it is at time `t`.
    fn render(&mut self, scene: &mut Scene, root: NodeId, t: Time) -> Result<()>;
}

/// Device-facing half of an engine.
pub trait Backend {
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId>;

    /// Copy `region` of `pixels` into the same region of `texture`.
    fn upload(&mut self, texture: TextureId, region: &RectI, pixels: &RgbaImage) -> Result<()>;

    /// Composite the `src` rectangle of `texture` onto the output. The
    /// corners are where the rectangle's top-left, top-right and
    /// bottom-left corners land, in device pixels.
    fn draw_quad(&mut self, texture: TextureId, corners: [Point; 3], src: &RectI) -> Result<()>;
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Output size in device pixels.
    pub screen_width: u32,
    pub screen_height: u32,
    pub pixels_per_pt: f64,
    /// Curve atlas size; twice the screen in each direction when `None`.
    pub atlas_size: Option<(u32, u32)>,
    pub column_width: u32,
    pub curve_color: Rgba8,
}

impl EngineConfig {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            ..Self::default()
        }
    }

    pub fn atlas_dimensions(&self) -> (u32, u32) {
        self.atlas_size.unwrap_or((
            self.screen_width.saturating_mul(2),
            self.screen_height.saturating_mul(2),
        ))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            screen_width: 640,
            screen_height: 480,
            pixels_per_pt: cache.pixels_per_pt,
            atlas_size: None,
            column_width: cache.column_width,
            curve_color: cache.color,
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedCurve {
    path: Path,
    /// Maps the unit square onto the curve's pixel box, in points.
    bounds: Affine,
}

/// Engine that rasterizes curves on the CPU and composites through `B`.
#[derive(Debug)]
pub struct RasterEngine<B: Backend> {
    backend: B,
    config: EngineConfig,
    cache: Option<Cache>,
    atlas: Option<TextureId>,
    textures: HashSet<TextureId>,
    curves: HashMap<CurveId, LoadedCurve>,
    next_curve: u32,
    last_frame: Time,
    transforms: Vec<Affine>,
}

impl<B: Backend> RasterEngine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            cache: None,
            atlas: None,
            textures: HashSet::new(),
            curves: HashMap::new(),
            next_curve: 1,
            last_frame: Time::ZERO,
            transforms: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// The curve cache, once the first curve has been loaded.
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }

    /// Backend texture holding the curve atlas.
    pub fn atlas_texture(&self) -> Option<TextureId> {
        self.atlas
    }

    /// Unit-square placement of a loaded curve, in points.
    pub fn curve_bounds(&self, id: CurveId) -> Option<Affine> {
        self.curves.get(&id).map(|c| c.bounds)
    }

    fn ensure_atlas(&mut self) -> Result<()> {
        if self.cache.is_some() {
            return Ok(());
        }
        let (w, h) = self.config.atlas_dimensions();
        let tex = self.backend.create_texture(w, h)?;
        debug!("curve atlas {}x{} is texture {:?}", w, h, tex);
        self.cache = Some(Cache::new(
            w,
            h,
            CacheConfig {
                column_width: self.config.column_width,
                pixels_per_pt: self.config.pixels_per_pt,
                color: self.config.curve_color,
            },
        ));
        self.atlas = Some(tex);
        Ok(())
    }

    fn render_node(&mut self, scene: &mut Scene, id: NodeId, t: Time) -> Result<()> {
        scene.arrange(id, t);

        let node = scene.node(id);
        let mut m = self.transforms.last().copied().unwrap_or_default();
        let pushed = match node.transform {
            Some(nt) => {
                m.premultiply(&nt);
                self.transforms.push(m);
                true
            }
            None => false,
        };

        if let Some(st) = node.sub_tex {
            if !self.textures.contains(&st.texture) {
                return Err(Error::UnknownTexture(st.texture));
            }
            if st.rect.width() > 0 && st.rect.height() > 0 {
                trace!("draw texture {:?} {:?}", st.texture, st.rect);
                self.backend.draw_quad(st.texture, unit_corners(&m), &st.rect)?;
            }
        }

        if let Some(cid) = node.curve {
            let curve = self.curves.get(&cid).ok_or(Error::UnknownCurve(cid))?;
            let (Some(cache), Some(atlas)) = (self.cache.as_mut(), self.atlas) else {
                return Err(Error::UnknownCurve(cid));
            };
            let rect = cache.get(cid, &curve.path, t)?;
            if cache.is_dirty() {
                debug!("uploading curve atlas");
                let full = RectI::new(0, 0, cache.image().width() as i32, cache.image().height() as i32);
                self.backend.upload(atlas, &full, cache.image())?;
                cache.clear_dirty();
            }
            let mut cm = m;
            cm.premultiply(&curve.bounds);
            trace!("draw curve {:?} from {:?}", cid, rect);
            self.backend.draw_quad(atlas, unit_corners(&cm), &rect)?;
        }

        let mut child = scene.node(id).first_child();
        while let Some(c) = child {
            self.render_node(scene, c, t)?;
            child = scene.node(c).next_sibling();
        }

        if pushed {
            self.transforms.pop();
        }
        Ok(())
    }
}

/// Images of the unit square's top-left, top-right and bottom-left corners.
fn unit_corners(m: &Affine) -> [Point; 3] {
    [
        m.transform_point(Point::new(0.0, 0.0)),
        m.transform_point(Point::new(1.0, 0.0)),
        m.transform_point(Point::new(0.0, 1.0)),
    ]
}

impl<B: Backend> Engine for RasterEngine<B> {
    fn load_texture(&mut self, img: &RgbaImage) -> Result<TextureId> {
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::EmptyTexture);
        }
        let tex = self.backend.create_texture(img.width(), img.height())?;
        let full = RectI::new(0, 0, img.width() as i32, img.height() as i32);
        self.backend.upload(tex, &full, img)?;
        self.textures.insert(tex);
        debug!("loaded {}x{} texture {:?}", img.width(), img.height(), tex);
        Ok(tex)
    }

    fn load_curve(&mut self, encoded: &[Pt]) -> Result<CurveId> {
        let path = Path::from_encoded(encoded.to_vec())?;
        if path.has_cubic() {
            return Err(Error::UnsupportedOperation("cubic curves"));
        }
        self.ensure_atlas()?;
        let Some(cache) = self.cache.as_mut() else {
            return Err(Error::UnsupportedOperation("curve atlas unavailable"));
        };

        let id = CurveId(self.next_curve);
        // Rasterize now so allocation errors surface here rather than
        // mid-frame.
        cache.get(id, &path, self.last_frame)?;
        self.next_curve += 1;

        let ppp = self.config.pixels_per_pt as Pt;
        let b = cache.pixel_box(&path);
        let bounds = Affine::new_unit_to_rect(
            b.x1 as Pt / ppp,
            b.y1 as Pt / ppp,
            b.width() as Pt / ppp,
            b.height() as Pt / ppp,
        );
        debug!("loaded curve {:?} with pixel box {:?}", id, b);
        self.curves.insert(id, LoadedCurve { path, bounds });
        Ok(id)
    }

    fn unload_curve(&mut self, id: CurveId) {
        self.curves.remove(&id);
        if let Some(cache) = self.cache.as_mut() {
            cache.remove(id);
        }
    }

    fn render(&mut self, scene: &mut Scene, root: NodeId, t: Time) -> Result<()> {
        self.last_frame = t;
        let ppp = self.config.pixels_per_pt as Pt;
        self.transforms.clear();
        self.transforms.push(Affine::new_scaling(ppp, ppp));
        self.render_node(scene, root, t)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TAG_QUADRATIC;
    use crate::scene::Node;

    /// Records every backend call.
    #[derive(Debug, Default)]
    struct Recorder {
        textures: Vec<(u32, u32)>,
        uploads: Vec<(TextureId, RectI)>,
        quads: Vec<(TextureId, [Point; 3], RectI)>,
    }

    impl Backend for Recorder {
        fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId> {
            self.textures.push((width, height));
            Ok(TextureId(self.textures.len() as u32 - 1))
        }

        fn upload(&mut self, texture: TextureId, region: &RectI, _: &RgbaImage) -> Result<()> {
            self.uploads.push((texture, *region));
            Ok(())
        }

        fn draw_quad(&mut self, texture: TextureId, corners: [Point; 3], src: &RectI) -> Result<()> {
            self.quads.push((texture, corners, *src));
            Ok(())
        }
    }

    fn engine() -> RasterEngine<Recorder> {
        RasterEngine::new(Recorder::default(), EngineConfig::new(100, 50))
    }

    #[rustfmt::skip]
    fn square(x: Pt, y: Pt, size: Pt) -> Vec<Pt> {
        vec![
            0.0, x, y,
            1.0, x + size, y,
            1.0, x + size, y + size,
            1.0, x, y + size,
            1.0, x, y,
        ]
    }

    fn close(a: Point, x: Pt, y: Pt) -> bool {
        (a.x - x).abs() < 1e-4 && (a.y - y).abs() < 1e-4
    }

    #[test]
    fn test_atlas_created_lazily_at_twice_screen() {
        let mut e = engine();
        assert!(e.cache().is_none());
        e.load_curve(&square(0.0, 0.0, 4.0)).unwrap();
        assert_eq!(e.backend().textures, vec![(200, 100)]);
        e.load_curve(&square(0.0, 0.0, 4.0)).unwrap();
        assert_eq!(e.backend().textures.len(), 1);
        assert_eq!(e.cache().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_load_curve_rejects_bad_input() {
        let mut e = engine();
        assert_eq!(
            e.load_curve(&[0.0, 1.0, 2.0, 7.0, 1.0, 1.0]),
            Err(Error::MalformedPath { offset: 3, tag: 7.0 })
        );
        let cubic = [0.0, 0.0, 0.0, 3.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        assert_eq!(
            e.load_curve(&cubic),
            Err(Error::UnsupportedOperation("cubic curves"))
        );
        assert!(matches!(
            e.load_curve(&square(0.0, 0.0, 300.0)),
            Err(Error::CurveTooLarge { .. })
        ));
    }

    #[test]
    fn test_curve_bounds_cover_pixel_box() {
        let mut e = engine();
        let q = [0.0, 10.0, 20.0, TAG_QUADRATIC, 30.0, 0.0, 50.0, 20.0];
        let id = e.load_curve(&q).unwrap();
        let m = e.curve_bounds(id).unwrap();
        // Apex of the quadratic is at y = 10.
        assert!(close(m.transform_point(Point::new(0.0, 0.0)), 10.0, 10.0));
        assert!(close(m.transform_point(Point::new(1.0, 1.0)), 50.0, 20.0));
    }

    #[test]
    fn test_render_walks_tree_with_transforms() {
        let mut e = RasterEngine::new(
            Recorder::default(),
            EngineConfig {
                pixels_per_pt: 2.0,
                ..EngineConfig::new(100, 100)
            },
        );
        let img = RgbaImage::new(8, 4);
        let tex = e.load_texture(&img).unwrap();
        let curve = e.load_curve(&square(0.0, 0.0, 5.0)).unwrap();

        let mut scene = Scene::new();
        let root = scene.add_node(Node::new().with_transform(Affine::new_translation(10.0, 0.0)));
        let sprite = scene.add_node(
            Node::new()
                .with_transform(Affine::new_scaling(8.0, 4.0))
                .with_sub_tex(SubTex::new(tex, RectI::new(0, 0, 8, 4))),
        );
        let shape = scene.add_node(Node::new().with_curve(curve));
        scene.append_child(root, sprite);
        scene.append_child(root, shape);

        e.render(&mut scene, root, Time(1)).unwrap();
        let quads = &e.backend().quads;
        assert_eq!(quads.len(), 2);

        let (t, c, src) = quads[0];
        assert_eq!(t, tex);
        assert_eq!(src, RectI::new(0, 0, 8, 4));
        assert!(close(c[0], 20.0, 0.0));
        assert!(close(c[1], 36.0, 0.0));
        assert!(close(c[2], 20.0, 8.0));

        let (t, c, src) = quads[1];
        assert_eq!(Some(t), e.atlas_texture());
        assert_eq!(src.width(), 10);
        assert!(close(c[0], 20.0, 0.0));
        assert!(close(c[1], 30.0, 0.0));
        assert!(close(c[2], 20.0, 10.0));

        // Atlas was dirty from the load, so exactly one upload of it.
        let atlas_uploads = e
            .backend()
            .uploads
            .iter()
            .filter(|(t, _)| Some(*t) == e.atlas_texture())
            .count();
        assert_eq!(atlas_uploads, 1);
        e.render(&mut scene, root, Time(2)).unwrap();
        assert_eq!(e.backend().uploads.len(), 2);
    }

    #[test]
    fn test_render_unknown_ids() {
        let mut e = engine();
        let mut scene = Scene::new();
        let root = scene.add_node(Node::new().with_curve(CurveId(42)));
        assert_eq!(
            e.render(&mut scene, root, Time(0)),
            Err(Error::UnknownCurve(CurveId(42)))
        );

        let id = e.load_curve(&square(0.0, 0.0, 2.0)).unwrap();
        e.unload_curve(id);
        scene.node_mut(root).curve = Some(id);
        assert_eq!(
            e.render(&mut scene, root, Time(0)),
            Err(Error::UnknownCurve(id))
        );

        scene.node_mut(root).curve = None;
        scene.node_mut(root).sub_tex = Some(SubTex::new(TextureId(9), RectI::new(0, 0, 1, 1)));
        assert_eq!(
            e.render(&mut scene, root, Time(0)),
            Err(Error::UnknownTexture(TextureId(9)))
        );
        assert_eq!(e.load_texture(&RgbaImage::new(0, 3)), Err(Error::EmptyTexture));
    }

    #[test]
    fn test_unloaded_curve_frees_atlas_space() {
        // Two 32 px columns, each holding one 30 px square.
        let config = EngineConfig {
            atlas_size: Some((64, 32)),
            column_width: 32,
            ..EngineConfig::new(100, 50)
        };
        let mut e = RasterEngine::new(Recorder::default(), config);
        let a = e.load_curve(&square(0.0, 0.0, 30.0)).unwrap();
        let b = e.load_curve(&square(0.0, 0.0, 30.0)).unwrap();
        assert_eq!(
            e.load_curve(&square(0.0, 0.0, 30.0)),
            Err(Error::CacheExhausted { entries: 2 })
        );

        e.unload_curve(b);
        let c = e.load_curve(&square(0.0, 0.0, 30.0)).unwrap();
        let cache = e.cache().unwrap();
        assert!(cache.contains(a) && cache.contains(c));
        assert_eq!(cache.rect(a), Some(RectI::new(0, 0, 30, 30)));
        assert_eq!(cache.rect(c), Some(RectI::new(32, 0, 62, 30)));
    }

    #[test]
    fn test_arranger_runs_before_draw() {
        let mut e = engine();
        let curve = e.load_curve(&square(0.0, 0.0, 2.0)).unwrap();
        let mut scene = Scene::new();
        let root = scene.add_node(Node::new().with_curve(curve).with_arranger(
            |n: &mut Node, t: Time| {
                n.transform = Some(Affine::new_translation(t.0 as Pt, 0.0));
            },
        ));
        e.render(&mut scene, root, Time(5)).unwrap();
        let (_, c, _) = e.backend().quads[0];
        assert!(close(c[0], 5.0, 0.0));
    }
}
