//! # sprite2d
//!
//! A retained 2D scene graph with a CPU vector rasterizer and a curve atlas.
//!
//! A [`Scene`] holds a tree of nodes. Each node may carry an affine
//! transform, a rectangle of a texture, a vector curve and a per-frame
//! arranger. An [`Engine`] walks the tree depth-first every frame,
//! composing transforms, and hands textured quads to a [`Backend`].
//!
//! Curves are drawn once into a shared atlas by the scanline rasterizer
//! and reused across frames. When the atlas fills up, the least recently
//! used half is evicted and the rest re-packed.
//!
//! ## Architecture
//!
//! Rasterization runs as a pipeline:
//!
//! 1. **Path**: a flat tag-stream of move, line and quadratic records
//! 2. **Stroke**: optional outline generation from a centerline
//! 3. **Rasterizer**: edges to per-cell coverage, swept row by row
//! 4. **Scanline**: per-pixel coverage spans
//! 5. **Renderer**: clipping and source-over blending into an `RgbaImage`
//!
//! ## Example
//!
//! ```
//! use sprite2d::{Engine, EngineConfig, Node, RasterEngine, Scene, SoftwareBackend, Time};
//!
//! let backend = SoftwareBackend::new(64, 64);
//! let mut engine = RasterEngine::new(backend, EngineConfig::new(64, 64));
//! let square = [0.0, 0.0, 0.0, 1.0, 8.0, 0.0, 1.0, 8.0, 8.0, 1.0, 0.0, 8.0, 1.0, 0.0, 0.0];
//! let curve = engine.load_curve(&square).unwrap();
//!
//! let mut scene = Scene::new();
//! let root = scene.add_node(Node::new().with_curve(curve));
//! engine.render(&mut scene, root, Time(0)).unwrap();
//! assert_eq!(engine.backend().target().get_pixel(4, 4).0, [0, 0, 0, 255]);
//! ```

// Foundation types
pub mod basics;
pub mod color;
pub mod error;
pub mod math;

// Geometry
pub mod affine;
pub mod bounds;
pub mod curves;
pub mod path;
pub mod shapes;
pub mod stroke;

// Scanline rasterizer
pub mod rasterizer;
pub mod rasterizer_cells;
pub mod scanline;

// Renderers
pub mod painter;
pub mod pixfmt;
pub mod renderer;
pub mod renderer_base;

// Caching and scene
pub mod cache;
pub mod clock;
pub mod engine;
pub mod scene;
pub mod software;

pub use affine::Affine;
pub use basics::{FillingRule, Point, Pt, RectF, RectI};
pub use cache::{Cache, CacheConfig, CurveId};
pub use clock::Time;
pub use color::Rgba8;
pub use engine::{Backend, Engine, EngineConfig, RasterEngine, SubTex, TextureId};
pub use error::{Error, Result};
pub use painter::{DrawStyle, Paint, Painter};
pub use path::{Path, Segment};
pub use scene::{Arranger, Node, NodeId, Scene};
pub use shapes::{Circle, Rectangle, Shape};
pub use software::SoftwareBackend;
pub use stroke::{stroke_path, LineCap, LineJoin, Stroke, StrokeStyle};
