use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::RgbaImage;

use sprite2d::{
    Cache, CacheConfig, Circle, CurveId, DrawStyle, Paint, Painter, Path, Point, RectI, Rgba8,
    Shape, StrokeStyle, Time,
};

fn wave() -> Path {
    let mut p = Path::new();
    p.add_start(Point::new(0.0, 50.0));
    for i in 0..8 {
        let x = i as f32 * 25.0;
        let y = if i % 2 == 0 { 0.0 } else { 100.0 };
        p.add_quadratic(Point::new(x + 12.5, y), Point::new(x + 25.0, 50.0));
    }
    p
}

fn bench_painter(c: &mut Criterion) {
    let mut img = RgbaImage::new(256, 256);
    let region = RectI::new(0, 0, 256, 256);
    let circle = Circle::new(Point::new(128.0, 128.0), 100.0).path();
    let wave = wave();
    let mut painter = Painter::default();

    c.bench_function("fill_circle_r100", |b| {
        b.iter(|| {
            painter.rasterize(
                &mut img,
                &region,
                black_box(&circle),
                (0.0, 0.0),
                &DrawStyle::Fill,
                &Paint::Solid(Rgba8::BLACK),
            )
        })
    });

    c.bench_function("stroke_wave_w3", |b| {
        b.iter(|| {
            painter.rasterize(
                &mut img,
                &region,
                black_box(&wave),
                (20.0, 60.0),
                &DrawStyle::Stroke(StrokeStyle::new(3.0)),
                &Paint::Solid(Rgba8::BLACK),
            )
        })
    });
}

fn bench_cache(c: &mut Criterion) {
    let shapes: Vec<Path> = (0..64)
        .map(|i| Circle::new(Point::new(16.0, 16.0), 4.0 + (i % 12) as f32).path())
        .collect();

    c.bench_function("cache_churn_64_curves", |b| {
        b.iter(|| {
            let mut cache = Cache::new(256, 128, CacheConfig::default());
            for (frame, (i, p)) in shapes.iter().enumerate().cycle().take(256).enumerate() {
                // Atlas exhaustion is part of what is being measured.
                let _ = cache.get(CurveId(i as u32), p, Time(frame as i32));
            }
            black_box(cache.len())
        })
    });
}

criterion_group!(benches, bench_painter, bench_cache);
criterion_main!(benches);
