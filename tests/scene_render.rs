//! End-to-end rendering through the engine and the software backend.

use image::RgbaImage;
use sprite2d::{
    Affine, Engine, EngineConfig, Error, Node, Path, Point, RasterEngine, RectI, Rectangle, Rgba8,
    Scene, Shape, SoftwareBackend, Stroke, SubTex, Time,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(w: u32, h: u32, config: EngineConfig) -> RasterEngine<SoftwareBackend> {
    let mut e = RasterEngine::new(SoftwareBackend::new(w, h), config);
    e.backend_mut().clear(Rgba8::WHITE);
    e
}

fn square(x: f32, y: f32, size: f32) -> Path {
    Rectangle::new(Point::new(x, y), Point::new(x + size, y + size)).path()
}

fn px(e: &RasterEngine<SoftwareBackend>, x: u32, y: u32) -> [u8; 4] {
    e.backend().target().get_pixel(x, y).0
}

#[test]
fn filled_curve_lands_in_device_pixels() {
    init();
    let mut e = engine(
        32,
        32,
        EngineConfig {
            pixels_per_pt: 2.0,
            ..EngineConfig::new(32, 32)
        },
    );
    let id = e.load_curve(square(2.0, 2.0, 4.0).as_slice()).unwrap();
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new().with_curve(id));
    e.render(&mut scene, root, Time(0)).unwrap();

    assert_eq!(px(&e, 4, 4), [0, 0, 0, 255]);
    assert_eq!(px(&e, 11, 11), [0, 0, 0, 255]);
    assert_eq!(px(&e, 12, 12), [255, 255, 255, 255]);
    assert_eq!(px(&e, 3, 8), [255, 255, 255, 255]);
}

#[test]
fn stroked_line_has_requested_width() {
    init();
    let mut e = engine(32, 32, EngineConfig::new(32, 32));
    let mut line = Path::new();
    line.add_start(Point::new(4.0, 10.0));
    line.add_line(Point::new(24.0, 10.0));
    let outline = Stroke::new(line, 4.0).path();
    let id = e.load_curve(outline.as_slice()).unwrap();

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new().with_curve(id));
    e.render(&mut scene, root, Time(0)).unwrap();

    for y in 8..12 {
        assert_eq!(px(&e, 14, y), [0, 0, 0, 255], "row {}", y);
    }
    assert_eq!(px(&e, 14, 7), [255, 255, 255, 255]);
    assert_eq!(px(&e, 14, 12), [255, 255, 255, 255]);
}

#[test]
fn transforms_compose_down_the_tree() {
    init();
    let mut e = engine(40, 40, EngineConfig::new(40, 40));
    let id = e.load_curve(square(0.0, 0.0, 4.0).as_slice()).unwrap();

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new().with_transform(Affine::new_translation(10.0, 0.0)));
    let child = scene.add_node(
        Node::new()
            .with_transform(Affine::new_scaling(2.0, 2.0))
            .with_curve(id),
    );
    scene.append_child(root, child);
    e.render(&mut scene, root, Time(0)).unwrap();

    // Scaled to 8x8, then moved right by 10.
    assert_eq!(px(&e, 10, 0), [0, 0, 0, 255]);
    assert_eq!(px(&e, 17, 7), [0, 0, 0, 255]);
    assert_eq!(px(&e, 18, 7), [255, 255, 255, 255]);
    assert_eq!(px(&e, 9, 0), [255, 255, 255, 255]);
}

#[test]
fn textures_draw_into_unit_square() {
    init();
    let mut e = engine(16, 16, EngineConfig::new(16, 16));
    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
    let tex = e.load_texture(&img).unwrap();

    let mut scene = Scene::new();
    let root = scene.add_node(
        Node::new()
            .with_transform(Affine::new(8.0, 0.0, 0.0, 4.0, 4.0, 4.0))
            .with_sub_tex(SubTex::new(tex, RectI::new(0, 0, 2, 1))),
    );
    e.render(&mut scene, root, Time(0)).unwrap();

    assert_eq!(px(&e, 4, 4), [255, 0, 0, 255]);
    assert_eq!(px(&e, 11, 7), [0, 0, 255, 255]);
    assert_eq!(px(&e, 12, 4), [255, 255, 255, 255]);
}

#[test]
fn evicted_curves_come_back_on_demand() {
    init();
    // Two 32 px columns, each fitting one 30 px square.
    let config = EngineConfig {
        atlas_size: Some((64, 32)),
        column_width: 32,
        ..EngineConfig::new(64, 64)
    };
    let mut e = engine(64, 64, config);
    let a = e.load_curve(square(0.0, 0.0, 30.0).as_slice()).unwrap();
    let b = e.load_curve(square(0.0, 0.0, 30.0).as_slice()).unwrap();

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new().with_curve(a));
    e.render(&mut scene, root, Time(1)).unwrap();

    // `b` was last used before frame 1, so it makes room.
    let c = e.load_curve(square(0.0, 0.0, 30.0).as_slice()).unwrap();
    let cache = e.cache().unwrap();
    assert!(cache.contains(a) && cache.contains(c));
    assert!(!cache.contains(b));

    scene.node_mut(root).curve = Some(b);
    e.backend_mut().clear(Rgba8::WHITE);
    e.render(&mut scene, root, Time(2)).unwrap();
    let cache = e.cache().unwrap();
    assert!(cache.contains(b));
    assert!(!cache.contains(a));
    assert_eq!(px(&e, 15, 15), [0, 0, 0, 255]);
    assert_eq!(px(&e, 31, 31), [255, 255, 255, 255]);
}

#[test]
fn atlas_exhaustion_is_reported_at_load() {
    init();
    let config = EngineConfig {
        atlas_size: Some((32, 32)),
        column_width: 32,
        ..EngineConfig::new(64, 64)
    };
    let mut e = engine(64, 64, config);
    e.load_curve(square(0.0, 0.0, 30.0).as_slice()).unwrap();
    assert_eq!(
        e.load_curve(square(0.0, 0.0, 30.0).as_slice()),
        Err(Error::CacheExhausted { entries: 1 })
    );
}
