//! Renders a built-in Cornell box and writes it as a PNG.
//!
//! Usage: `lux [settings.json] [output.png]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use lux_core::RenderSettings;
use lux_math::{Color, Vec3};
use lux_renderer::{render, AaRect, Axis, Camera, Dielectric, DiffuseEmitter, Lambertian, Primitive, Scene};

/// The classic box: red and green side walls, a ceiling light, a rotated
/// block and a glass ball.
fn cornell_box() -> Scene {
    let mut scene = Scene::new();
    let red = scene.add_material(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let white = scene.add_material(Lambertian::new(Color::splat(0.73)));
    let green = scene.add_material(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 15.0));
    let glass = scene.add_material(Dielectric::new(1.5));

    scene.add(Primitive::rect(AaRect::yz((0.0, 555.0), (0.0, 555.0), 555.0), green));
    scene.add(Primitive::rect(AaRect::yz((0.0, 555.0), (0.0, 555.0), 0.0), red));
    let lamp = scene.push(Primitive::rect(AaRect::xz((213.0, 343.0), (227.0, 332.0), 554.0), light));
    scene.add(Primitive::flip_face(lamp));
    scene.add(Primitive::rect(AaRect::xz((0.0, 555.0), (0.0, 555.0), 0.0), white));
    scene.add(Primitive::rect(AaRect::xz((0.0, 555.0), (0.0, 555.0), 555.0), white));
    scene.add(Primitive::rect(AaRect::xy((0.0, 555.0), (0.0, 555.0), 555.0), white));

    let block = scene.push(Primitive::cuboid(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white));
    let turned = scene.push(Primitive::rotate(block, Axis::Y, 15f32.to_radians()));
    scene.add(Primitive::translate(turned, Vec3::new(265.0, 0.0, 295.0)));

    scene.add(Primitive::sphere(Vec3::new(190.0, 90.0, 190.0), 90.0, glass));
    scene
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => RenderSettings::load(&path).with_context(|| format!("Failed to load settings from {path}"))?,
        None => RenderSettings::default(),
    };
    let output = PathBuf::from(args.next().unwrap_or_else(|| "render.png".to_string()));

    let camera = Camera::new()
        .with_aspect_ratio(settings.width as f32 / settings.height as f32)
        .with_position(Vec3::new(278.0, 278.0, -800.0), Vec3::new(278.0, 278.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 10.0);

    let framebuffer = render(&cornell_box(), &camera, &settings).context("Render failed")?;

    let image = image::RgbImage::from_raw(
        framebuffer.width(),
        framebuffer.height(),
        framebuffer.to_rgb8(settings.gamma),
    )
    .context("Framebuffer size does not match its resolution")?;
    image
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Wrote {}", output.display());
    Ok(())
}
