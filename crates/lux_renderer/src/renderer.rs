//! The `render()` entry point and the framebuffer it fills.
//!
//! Everything that can make a render fail is checked up front: settings,
//! scene structure, light discovery and the integrator's light support.
//! Only then are buckets handed to rayon, so a failed render never
//! produces a partial image.

use std::time::Instant;

use lux_core::RenderSettings;
use lux_math::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket};
use crate::bvh::BvhNode;
use crate::camera::RayGenerator;
use crate::error::{RenderError, RenderResult};
use crate::integrator::{integrator_for, RenderContext};
use crate::light::LightList;
use crate::scene::Scene;

/// Linear RGB radiance per pixel, row-major from the top-left corner.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 3]; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        Color::from_array(self.pixels[self.index(x, y)])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color.to_array();
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.pixels.iter().map(|p| Color::from_array(*p))
    }

    /// Raw linear `f32` RGB triples, for encoders that keep full range.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Gamma-encoded 8-bit RGB, clamped to `[0, 1]` after encoding.
    pub fn to_rgb8(&self, gamma: f32) -> Vec<u8> {
        let inv_gamma = 1.0 / gamma;
        self.pixels
            .iter()
            .flatten()
            .map(|&c| (255.0 * encode_gamma(c, inv_gamma)).round() as u8)
            .collect()
    }
}

#[inline]
fn encode_gamma(linear: f32, inv_gamma: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(inv_gamma).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Render `scene` as seen by `camera`.
pub fn render(scene: &Scene, camera: &dyn RayGenerator, settings: &RenderSettings) -> RenderResult<Framebuffer> {
    settings.validate()?;
    if scene.is_empty() {
        return Err(RenderError::EmptyScene);
    }
    scene.validate()?;

    let start = Instant::now();
    let integrator = integrator_for(settings.integrator);
    let lights = LightList::discover(scene, settings.strict_lights)?;
    integrator.check_lights(&lights)?;

    let bvh = if settings.use_bvh {
        BvhNode::build(scene, &mut StdRng::seed_from_u64(settings.seed))
    } else {
        None
    };
    let ctx = RenderContext::new(scene, bvh.as_ref(), &lights, settings);

    log::info!(
        "Rendering {}x{} at {} spp with the {} integrator ({} lights, {} BVH nodes)",
        settings.width,
        settings.height,
        settings.samples_per_pixel(),
        integrator.name(),
        lights.len(),
        bvh.as_ref().map_or(0, BvhNode::node_count)
    );

    let buckets = generate_buckets(settings.width, settings.height, settings.bucket_size);
    let results: Vec<_> = buckets
        .par_iter()
        .map(|bucket| render_bucket(bucket, camera, integrator.as_ref(), &ctx, settings))
        .collect();

    let mut framebuffer = Framebuffer::new(settings.width, settings.height);
    for result in results {
        let bucket = result.bucket;
        for (i, color) in result.pixels.into_iter().enumerate() {
            let (local_x, local_y) = (i as u32 % bucket.width, i as u32 / bucket.width);
            framebuffer.set(bucket.x + local_x, bucket.y + local_y, color);
        }
    }

    let exhausted = ctx.exhausted_rejections();
    if exhausted > 0 {
        log::warn!(
            "{} microfacet rejection loops gave up after {} retries",
            exhausted,
            settings.max_rejection_retries
        );
    }
    log::info!("Render finished in {:.2?}", start.elapsed());

    Ok(framebuffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::material::{DiffuseEmitter, Lambertian};
    use crate::primitives::{AaRect, Primitive};
    use lux_core::{IntegratorKind, SamplerStrategy, SettingsError, Texture};
    use lux_math::Vec3;
    use std::sync::Arc;

    fn small_settings() -> RenderSettings {
        RenderSettings {
            width: 12,
            height: 8,
            spp_x: 2,
            spp_y: 1,
            bucket_size: 5,
            ..RenderSettings::default()
        }
    }

    fn lit_sphere() -> Scene {
        let mut scene = Scene::new();
        let white = scene.add_material(Lambertian::new(Color::splat(0.7)));
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 5.0));
        scene.add(Primitive::sphere(Vec3::new(0.0, 0.0, -3.0), 1.0, white));
        let panel = scene.push(Primitive::rect(AaRect::xz((-1.0, 1.0), (-2.0, 0.0), 3.0), light));
        scene.add(Primitive::flip_face(panel));
        scene
    }

    fn camera(settings: &RenderSettings) -> Camera {
        Camera::new()
            .with_aspect_ratio(settings.width as f32 / settings.height as f32)
            .with_lens(60.0, 0.0, 1.0)
    }

    #[test]
    fn test_gamma_encoding() {
        let mut fb = Framebuffer::new(2, 1);
        fb.set(0, 0, Color::new(0.25, 1.0, 4.0));
        fb.set(1, 0, Color::new(-1.0, 0.0, 0.0));
        assert_eq!(fb.to_rgb8(2.0), vec![128, 255, 255, 0, 0, 0]);
        assert_eq!(fb.as_bytes().len(), 2 * 3 * 4);
        assert_eq!(fb.get(0, 0), Color::new(0.25, 1.0, 4.0));
    }

    #[test]
    fn test_render_fills_every_pixel() {
        let settings = small_settings();
        let fb = render(&lit_sphere(), &camera(&settings), &settings).unwrap();
        assert_eq!((fb.width(), fb.height()), (12, 8));
        assert!(fb.pixels().all(|c| c.is_finite() && c.min_element() >= 0.0));
        // The centre pixel sees the sphere below the panel.
        assert!(fb.get(6, 4).x > 0.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let settings = RenderSettings {
            integrator: IntegratorKind::Mis,
            ..small_settings()
        };
        let scene = lit_sphere();
        let a = render(&scene, &camera(&settings), &settings).unwrap();
        let b = render(&scene, &camera(&settings), &settings).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_bucket_size_does_not_change_image() {
        let scene = lit_sphere();
        let a_settings = small_settings();
        let b_settings = RenderSettings {
            bucket_size: 64,
            ..small_settings()
        };
        let a = render(&scene, &camera(&a_settings), &a_settings).unwrap();
        let b = render(&scene, &camera(&b_settings), &b_settings).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_every_sampler_strategy_renders() {
        let scene = lit_sphere();
        for sampler in [SamplerStrategy::None, SamplerStrategy::PermuteDigits, SamplerStrategy::Owen] {
            let settings = RenderSettings {
                sampler,
                max_depth: 16,
                ..small_settings()
            };
            let fb = render(&scene, &camera(&settings), &settings).unwrap();
            assert!(fb.pixels().all(|c| c.is_finite() && c.min_element() >= 0.0), "{sampler:?}");
            assert!(fb.get(6, 4).x > 0.0, "{sampler:?}");
        }
    }

    #[test]
    fn test_rejects_before_rendering() {
        let settings = small_settings();
        let cam = camera(&settings);
        assert!(matches!(render(&Scene::new(), &cam, &settings), Err(RenderError::EmptyScene)));

        let zero_spp = RenderSettings {
            spp_x: 0,
            ..small_settings()
        };
        assert!(matches!(
            render(&lit_sphere(), &cam, &zero_spp),
            Err(RenderError::InvalidSettings(SettingsError::Invalid { field: "spp_x", .. }))
        ));

        let mut with_env = lit_sphere();
        with_env.set_environment(Arc::new(Texture::solid_color(Color::ONE)), 1.0);
        let reservoir = RenderSettings {
            integrator: IntegratorKind::Reservoir,
            ..small_settings()
        };
        assert!(matches!(
            render(&with_env, &cam, &reservoir),
            Err(RenderError::UnsupportedIntegratorLight { .. })
        ));
    }
}
