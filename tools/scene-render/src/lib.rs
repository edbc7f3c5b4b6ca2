//! Demo scenes for the `scene-render` tool.
//!
//! Each scene is built against a [`RasterEngine`] with a
//! [`SoftwareBackend`], rendered once at the requested frame on a white
//! background, and returned as an image.

use image::RgbaImage;
use sprite2d::{
    Affine, Circle, Engine, EngineConfig, Node, NodeId, Path, Point, Pt, RasterEngine, RectI,
    Rgba8, Scene, Shape, SoftwareBackend, Stroke, SubTex, Time,
};

type Soft = RasterEngine<SoftwareBackend>;

struct SceneDef {
    name: &'static str,
    /// Logical size in points; the output is scaled to fit.
    size: (f64, f64),
    build: fn(&mut Soft) -> sprite2d::Result<(Scene, NodeId)>,
}

const SCENES: &[SceneDef] = &[
    SceneDef {
        name: "bezier",
        size: (60.0, 30.0),
        build: bezier,
    },
    SceneDef {
        name: "shapes",
        size: (240.0, 180.0),
        build: shapes,
    },
];

pub fn available_scenes() -> Vec<&'static str> {
    SCENES.iter().map(|s| s.name).collect()
}

/// Render scene `name` at frame `t`. Returns `None` for an unknown name.
pub fn render_scene(
    name: &str,
    width: u32,
    height: u32,
    t: Time,
) -> Option<sprite2d::Result<RgbaImage>> {
    let def = SCENES.iter().find(|s| s.name == name)?;
    let ppp = (width as f64 / def.size.0).min(height as f64 / def.size.1);
    let config = EngineConfig {
        pixels_per_pt: ppp,
        // Two columns across the default atlas, so any curve that fits on
        // screen fits in a column.
        column_width: width.max(128),
        ..EngineConfig::new(width, height)
    };
    let mut engine = RasterEngine::new(SoftwareBackend::new(width, height), config);
    engine.backend_mut().clear(Rgba8::WHITE);

    let result = (def.build)(&mut engine).and_then(|(mut scene, root)| {
        log::info!("rendering '{}' at {:?} with {} nodes", name, t, scene.len());
        engine.render(&mut scene, root, t)
    });
    Some(result.map(|_| engine.into_backend().into_target()))
}

fn load_shape(engine: &mut Soft, shape: &impl Shape) -> sprite2d::Result<Node> {
    let id = engine.load_curve(shape.path().as_slice())?;
    Ok(Node::new().with_curve(id))
}

/// Three control-point handles and the quadratic they define.
fn bezier(engine: &mut Soft) -> sprite2d::Result<(Scene, NodeId)> {
    let centers = [
        Point::new(10.0, 20.0),
        Point::new(30.0, 10.0),
        Point::new(50.0, 20.0),
    ];
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new());

    for c in centers {
        let handle = load_shape(engine, &Stroke::new(Circle::new(c, 3.0), 0.5))?;
        let id = scene.add_node(handle);
        scene.append_child(root, id);
    }

    let mut curve = Path::new();
    curve.add_start(centers[0]);
    curve.add_quadratic(centers[1], centers[2]);
    let id = scene.add_node(load_shape(engine, &Stroke::new(curve, 0.7))?);
    scene.append_child(root, id);

    Ok((scene, root))
}

/// A procedurally generated texture atlas: four 32x32 tiles.
fn tiles() -> RgbaImage {
    RgbaImage::from_fn(64, 64, |x, y| {
        let (tx, ty) = (x / 32, y / 32);
        let check = ((x / 4) + (y / 4)) % 2 == 0;
        let base = match (tx, ty) {
            (0, 0) => [200, 60, 40],
            (1, 0) => [240, 170, 30],
            (0, 1) => [40, 120, 220],
            _ => [60, 180, 90],
        };
        let k = if check { 255 } else { 190 };
        image::Rgba([
            (base[0] * k / 255) as u8,
            (base[1] * k / 255) as u8,
            (base[2] * k / 255) as u8,
            255,
        ])
    })
}

/// Textured sprites, one animated, plus filled and stroked curves.
fn shapes(engine: &mut Soft) -> sprite2d::Result<(Scene, NodeId)> {
    let tex = engine.load_texture(&tiles())?;
    let tile = |x: i32, y: i32| SubTex::new(tex, RectI::new(x, y, x + 32, y + 32));
    let (red, yellow, blue, green) = (tile(0, 0), tile(32, 0), tile(0, 32), tile(32, 32));

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new().with_transform(Affine::identity()));
    let add = |scene: &mut Scene, node: Node| {
        let id = scene.add_node(node);
        scene.append_child(root, id);
    };

    add(
        &mut scene,
        Node::new()
            .with_sub_tex(red)
            .with_transform(Affine::new_scaling(36.0, 36.0)),
    );
    add(
        &mut scene,
        Node::new()
            .with_sub_tex(yellow)
            .with_transform(Affine::new(72.0, 0.0, 0.0, 72.0, 144.0, 96.0)),
    );
    add(
        &mut scene,
        Node::new().with_arranger(move |n: &mut Node, t: Time| {
            let t0 = t.0.rem_euclid(120);
            n.sub_tex = Some(if t0 < 60 { blue } else { green });
            let u = t0 as Pt / 120.0;
            let u = (1.0 - (u * 2.0 * std::f32::consts::PI).cos()) / 2.0;
            let s = 36.0 + u * 36.0;
            n.transform = Some(Affine::new(s, 0.0, 0.0, s, 18.0 + u * 48.0, 36.0 + u * 72.0));
        }),
    );

    let mut line = Path::new();
    line.add_start(Point::new(0.0, 0.0));
    line.add_line(Point::new(60.0, 60.0));
    let node = load_shape(engine, &Stroke::new(line, 6.0))?
        .with_transform(Affine::new_translation(100.0, 20.0));
    add(&mut scene, node);

    add(
        &mut scene,
        load_shape(engine, &Circle::new(Point::new(200.0, 40.0), 20.0))?,
    );

    Ok((scene, root))
}
