// Copyright 2025. Scene renderer CLI for sprite2d demo scenes.
//
// Usage:
//   scene-render render <scene> <width> <height> [-o <output.png>] [-t <frame>]
//   scene-render list

use std::process;

use sprite2d::Time;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "render" => cmd_render(&args[2..]),
        "list" => cmd_list(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("scene-render - render sprite2d demo scenes to PNG");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  render <scene> <width> <height> [-o <output.png>] [-t <frame>]");
    eprintln!("      Render one frame of a scene on a white background.");
    eprintln!();
    eprintln!("  list");
    eprintln!("      List available scene names.");
}

fn cmd_list() {
    println!("Available scenes:");
    for name in scene_render::available_scenes() {
        println!("  {}", name);
    }
}

fn cmd_render(args: &[String]) {
    if args.len() < 3 {
        eprintln!("Usage: scene-render render <scene> <width> <height> [-o <output.png>] [-t <frame>]");
        process::exit(1);
    }

    let scene = &args[0];
    let width: u32 = args[1].parse().expect("Invalid width");
    let height: u32 = args[2].parse().expect("Invalid height");

    let mut output_path: Option<String> = None;
    let mut frame = Time::ZERO;
    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "-o" if i + 1 < args.len() => {
                output_path = Some(args[i + 1].clone());
                i += 2;
            }
            "-t" if i + 1 < args.len() => {
                frame = Time(args[i + 1].parse().expect("Invalid frame"));
                i += 2;
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                i += 1;
            }
        }
    }

    let output = output_path.unwrap_or_else(|| format!("{}_{}x{}.png", scene, width, height));

    println!("Rendering '{}' at {}x{}, frame {}...", scene, width, height, frame.0);

    let img = scene_render::render_scene(scene, width, height, frame)
        .unwrap_or_else(|| {
            eprintln!("Unknown scene: '{}'. Use 'list' to see available scenes.", scene);
            process::exit(1);
        })
        .unwrap_or_else(|e| {
            eprintln!("Render failed: {}", e);
            process::exit(1);
        });

    img.save(&output).expect("Failed to save image");
    println!("Saved: {}", output);
}
