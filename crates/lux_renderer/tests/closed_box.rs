//! End-to-end renders of a closed diffuse box lit by one of its walls.

use lux_core::{IntegratorKind, RenderSettings};
use lux_math::{Color, Vec3};
use lux_renderer::{render, AaRect, Camera, DiffuseEmitter, Framebuffer, Lambertian, Primitive, Scene};

/// Radiance leaving the emissive ceiling.
const EMITTED: f32 = 1.0;

/// A 2 x 2 x 2 box of albedo 0.5 whose ceiling is the light. Every path
/// eventually ends on the light or is absorbed.
fn closed_box() -> Scene {
    let mut scene = Scene::new();
    let white = scene.add_material(Lambertian::new(Color::splat(0.5)));
    let light = scene.add_material(DiffuseEmitter::new(Color::ONE, EMITTED));
    let span = (-1.0, 1.0);

    scene.add(Primitive::rect(AaRect::xz(span, span, -1.0), white));
    scene.add(Primitive::rect(AaRect::xy(span, span, -1.0), white));
    scene.add(Primitive::rect(AaRect::xy(span, span, 1.0), white));
    scene.add(Primitive::rect(AaRect::yz(span, span, -1.0), white));
    scene.add(Primitive::rect(AaRect::yz(span, span, 1.0), white));
    let ceiling = scene.push(Primitive::rect(AaRect::xz(span, span, 1.0), light));
    scene.add(Primitive::flip_face(ceiling));
    scene
}

fn settings(spp_side: u32, seed: u64, integrator: IntegratorKind) -> RenderSettings {
    RenderSettings {
        width: 16,
        height: 16,
        spp_x: spp_side,
        spp_y: spp_side,
        seed,
        integrator,
        strict_lights: true,
        ..RenderSettings::default()
    }
}

fn render_box(spp_side: u32, seed: u64, integrator: IntegratorKind) -> Framebuffer {
    // The narrow field of view keeps the ceiling out of frame.
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 0.0, 0.9), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
        .with_lens(40.0, 0.0, 1.0);
    render(&closed_box(), &camera, &settings(spp_side, seed, integrator)).expect("box renders")
}

fn mean_squared_difference(a: &Framebuffer, b: &Framebuffer) -> f32 {
    let sum: f32 = a.pixels().zip(b.pixels()).map(|(x, y)| (x - y).length_squared()).sum();
    sum / (a.width() * a.height()) as f32
}

fn assert_plausible(image: &Framebuffer) {
    let mut total = 0.0;
    for c in image.pixels() {
        assert!(c.is_finite(), "{c:?}");
        assert!(c.min_element() >= 0.0, "{c:?}");
        total += c.x;
    }
    let mean = total / (image.width() * image.height()) as f32;
    assert!(mean > 0.0 && mean < EMITTED, "mean radiance {mean}");
}

#[test]
fn test_more_samples_reduce_variance() {
    let _ = env_logger::builder().is_test(true).try_init();

    let coarse = mean_squared_difference(
        &render_box(2, 1, IntegratorKind::Nee),
        &render_box(2, 2, IntegratorKind::Nee),
    );
    let fine_a = render_box(8, 1, IntegratorKind::Nee);
    let fine_b = render_box(8, 2, IntegratorKind::Nee);
    let fine = mean_squared_difference(&fine_a, &fine_b);

    assert_plausible(&fine_a);
    assert_plausible(&fine_b);
    assert!(fine < 0.5 * coarse, "64 spp spread {fine} vs 4 spp spread {coarse}");
}

#[test]
fn test_integrators_agree_on_box() {
    let reference = render_box(8, 3, IntegratorKind::Nee);
    let reference_mean: f32 = reference.pixels().map(|c| c.x).sum::<f32>() / 256.0;

    for integrator in [
        IntegratorKind::Mis,
        IntegratorKind::Reservoir,
        IntegratorKind::Roulette,
        IntegratorKind::Volume,
        IntegratorKind::Dispersion,
    ] {
        let image = render_box(8, 3, integrator);
        assert_plausible(&image);
        let mean: f32 = image.pixels().map(|c| c.x).sum::<f32>() / 256.0;
        assert!(
            (mean - reference_mean).abs() < 0.05 * reference_mean,
            "{integrator:?}: {mean} vs {reference_mean}"
        );
    }
}
