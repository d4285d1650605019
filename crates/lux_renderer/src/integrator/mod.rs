//! Radiance estimators.
//!
//! Every estimator implements [`Integrator`] and is chosen at runtime from
//! [`IntegratorKind`]. Paths are walked with an explicit loop; branches
//! created by splitting materials go onto a work stack, so call depth
//! never grows with path length.

mod path;
mod volume;

pub use path::{DirectLighting, EmissionPolicy, PathIntegrator, PathVertex};
pub use volume::VolumeIntegrator;

use crate::bvh::BvhNode;
use crate::error::RenderResult;
use crate::hittable::HitRecord;
use crate::light::{LightList, LightSample};
use crate::material::{BxdfReflTransFlags, RejectionPolicy, RejectionTally, ScatterOptions, TransportMode};
use crate::sampler::Sampler;
use crate::scene::Scene;
use lux_core::{IntegratorKind, RenderSettings};
use lux_math::{Color, Interval, Ray, Vec2, Vec3};

/// Rays start this far from the surface they leave.
pub const RAY_EPSILON: f32 = 1e-3;

/// Read-only state shared by every path of one render.
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    /// `None` falls back to testing every root primitive
    pub bvh: Option<&'a BvhNode>,
    pub lights: &'a LightList,
    pub max_depth: u32,
    pub background: Color,
    pub light_samples_x: u32,
    pub light_samples_y: u32,
    pub options: ScatterOptions,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        scene: &'a Scene,
        bvh: Option<&'a BvhNode>,
        lights: &'a LightList,
        settings: &RenderSettings,
    ) -> Self {
        Self {
            scene,
            bvh,
            lights,
            max_depth: settings.max_depth,
            background: settings.background_color(),
            light_samples_x: settings.light_samples_x.max(1),
            light_samples_y: settings.light_samples_y.max(1),
            options: ScatterOptions {
                mode: TransportMode::Radiance,
                flags: BxdfReflTransFlags::ALL,
                rejection: RejectionPolicy {
                    mode: settings.mf_rejection,
                    max_retries: settings.max_rejection_retries,
                    tally: RejectionTally::new(),
                },
            },
        }
    }

    /// Closest hit along `ray` within `ray_t`.
    pub fn intersect_within(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self.bvh {
            Some(bvh) => bvh.hit(self.scene, ray, ray_t),
            None => self.scene.hit_brute_force(ray, ray_t),
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        self.intersect_within(ray, Interval::new(RAY_EPSILON, f32::INFINITY))
    }

    /// Radiance for a ray that leaves the scene.
    pub fn miss_radiance(&self, direction: Vec3) -> Color {
        self.scene.environment_radiance(direction, self.background)
    }

    /// Whether nothing blocks the segment from `origin` to a light sample.
    pub fn unoccluded(&self, origin: Vec3, sample: &LightSample) -> bool {
        let interval = sample.shadow_interval();
        if interval.max <= interval.min {
            return false;
        }
        self.intersect_within(&Ray::new(origin, sample.wi), interval).is_none()
    }

    /// Microfacet rejection loops of this render that ran out of retries.
    pub fn exhausted_rejections(&self) -> usize {
        self.options.rejection.tally.count()
    }

    /// Number of light samples taken at each shading point.
    pub fn light_sample_count(&self) -> usize {
        (self.light_samples_x * self.light_samples_y) as usize
    }

    /// Draws one light sample per cell of the light-sample grid.
    ///
    /// Lights are picked uniformly with stratified numbers, and each pick
    /// samples its light at a jittered offset within its grid cell. Picks
    /// that produce no direction are dropped; the caller still divides by
    /// [`RenderContext::light_sample_count`].
    pub fn sample_lights(&self, origin: Vec3, sampler: &mut Sampler) -> Vec<(LightSample, f32)> {
        if self.lights.is_empty() {
            return Vec::new();
        }
        let pick = sampler.get_1d();
        let jitter = sampler.get_2d();
        let (nx, ny) = (self.light_samples_x, self.light_samples_y);
        let count = self.light_sample_count();

        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let (ix, iy) = ((i as u32 % nx) as f32, (i as u32 / nx) as f32);
            let u = Vec2::new((ix + jitter.x) / nx as f32, (iy + jitter.y) / ny as f32);
            let Some((light, pmf)) = self.lights.uniform_pick((pick + i as f32 / count as f32).fract()) else {
                continue;
            };
            if let Some(sample) = light.sample_li(self.scene, origin, u) {
                samples.push((sample, pmf));
            }
        }
        samples
    }
}

/// Power heuristic with exponent two.
pub fn power_heuristic(pdf_f: f32, pdf_g: f32) -> f32 {
    let (f, g) = (pdf_f * pdf_f, pdf_g * pdf_g);
    if f + g <= 0.0 || !(f + g).is_finite() {
        return if pdf_f.is_infinite() { 1.0 } else { 0.0 };
    }
    f / (f + g)
}

/// Estimates the radiance arriving along a camera ray.
pub trait Integrator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rejects light setups the estimator cannot handle, before a render starts.
    fn check_lights(&self, _lights: &LightList) -> RenderResult<()> {
        Ok(())
    }

    fn estimate(&self, ray: &Ray, ctx: &RenderContext<'_>, sampler: &mut Sampler) -> Color;
}

/// The estimator configured by `kind`.
pub fn integrator_for(kind: IntegratorKind) -> Box<dyn Integrator> {
    match kind {
        IntegratorKind::Nee => Box::new(PathIntegrator::nee()),
        IntegratorKind::Mis => Box::new(PathIntegrator::mis()),
        IntegratorKind::Reservoir => Box::new(PathIntegrator::reservoir()),
        IntegratorKind::Roulette => Box::new(PathIntegrator::roulette()),
        IntegratorKind::Dispersion => Box::new(PathIntegrator::dispersion()),
        IntegratorKind::Volume => Box::new(VolumeIntegrator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::DiffuseEmitter;
    use crate::primitives::{AaRect, Primitive};
    use crate::test_utils::assert_approx;
    use lux_core::SamplerStrategy;

    #[test]
    fn test_power_heuristic() {
        assert_approx!(power_heuristic(1.0, 1.0), 0.5, 1e-6);
        assert_approx!(power_heuristic(3.0, 1.0), 0.9, 1e-6);
        assert_eq!(power_heuristic(0.0, 0.0), 0.0);
        assert_eq!(power_heuristic(f32::INFINITY, 1.0), 1.0);
    }

    #[test]
    fn test_factory_names() {
        for (kind, name) in [
            (IntegratorKind::Nee, "nee"),
            (IntegratorKind::Mis, "mis"),
            (IntegratorKind::Reservoir, "reservoir"),
            (IntegratorKind::Roulette, "roulette"),
            (IntegratorKind::Volume, "volume"),
            (IntegratorKind::Dispersion, "dispersion"),
        ] {
            assert_eq!(integrator_for(kind).name(), name);
        }
    }

    #[test]
    fn test_sample_lights_fills_grid() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        scene.add(Primitive::rect(AaRect::xz((-1.0, 1.0), (-1.0, 1.0), 2.0), light));
        let lights = LightList::discover(&scene, true).unwrap();
        let settings = RenderSettings {
            light_samples_x: 2,
            light_samples_y: 3,
            ..RenderSettings::default()
        };
        let ctx = RenderContext::new(&scene, None, &lights, &settings);
        let mut sampler = Sampler::new(SamplerStrategy::Owen, 1, 0);
        sampler.start_pixel_sample(0, 0);

        let samples = ctx.sample_lights(Vec3::ZERO, &mut sampler);
        assert_eq!(ctx.light_sample_count(), 6);
        assert_eq!(samples.len(), 6);
        for (sample, pmf) in &samples {
            assert_eq!(*pmf, 1.0);
            assert!(ctx.unoccluded(Vec3::ZERO, sample));
        }
    }

    #[test]
    fn test_contexts_count_rejections_separately() {
        let mut scene = Scene::new();
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, 1.0));
        scene.add(Primitive::rect(AaRect::xz((-1.0, 1.0), (-1.0, 1.0), 2.0), light));
        let lights = LightList::discover(&scene, true).unwrap();
        let settings = RenderSettings::default();
        let first = RenderContext::new(&scene, None, &lights, &settings);
        let second = RenderContext::new(&scene, None, &lights, &settings);

        first.options.rejection.tally.record();
        first.options.clone().rejection.tally.record();
        assert_eq!(first.exhausted_rejections(), 2);
        assert_eq!(second.exhausted_rejections(), 0);
    }
}
