//! Surface path tracing with light sampling.
//!
//! A path is followed one vertex at a time. At a continuous lobe the
//! estimator gathers direct light by one of the [`DirectLighting`]
//! strategies and then continues along a sampled direction; what the next
//! vertex does with emission it finds is decided by the [`EmissionPolicy`]
//! handed to it, so light is never counted by both the light sample and the
//! continuation.

use lux_math::sampling::ONE_MINUS_EPSILON;
use lux_math::{Color, Ray, Vec3};

use super::{power_heuristic, Integrator, RenderContext};
use crate::error::{RenderError, RenderResult};
use crate::hittable::HitRecord;
use crate::light::{LightList, LightSample};
use crate::material::{luminance, Material, ScatterRecord};
use crate::pdf::{MixturePdf, Pdf, ShapePdf, UniformSpherePdf};
use crate::sampler::Sampler;

/// How light sources are sampled at a continuous scattering vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectLighting {
    /// Average of light samples; the continuation ignores sampled emitters.
    Nee,
    /// Light and BSDF samples combined with the power heuristic.
    Mis,
    /// One light candidate chosen from the grid by resampled importance.
    Reservoir,
    /// No separate light sample. The continuation draws from a mixture of
    /// the lights and the BSDF and counts whatever emission it reaches.
    Mixture,
}

/// What a vertex does with emission found at its hit point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmissionPolicy {
    Count,
    /// Emitters that are also lights were already sampled at the previous vertex.
    Skip,
    /// Weight against light sampling from `origin`, where the BSDF chose
    /// this direction with density `bsdf_pdf`.
    Mis { origin: Vec3, bsdf_pdf: f32 },
}

/// One pending path segment.
#[derive(Clone, Copy, Debug)]
pub struct PathVertex {
    pub ray: Ray,
    pub throughput: Color,
    /// Bounces left
    pub depth: u32,
    pub emission: EmissionPolicy,
}

impl PathVertex {
    pub fn camera(ray: Ray, depth: u32) -> Self {
        Self {
            ray,
            throughput: Color::ONE,
            depth,
            emission: EmissionPolicy::Count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PathIntegrator {
    name: &'static str,
    direct: DirectLighting,
    roulette: bool,
}

impl PathIntegrator {
    pub fn new(name: &'static str, direct: DirectLighting) -> Self {
        Self {
            name,
            direct,
            roulette: false,
        }
    }

    pub fn nee() -> Self {
        Self::new("nee", DirectLighting::Nee)
    }

    pub fn mis() -> Self {
        Self::new("mis", DirectLighting::Mis)
    }

    pub fn reservoir() -> Self {
        Self::new("reservoir", DirectLighting::Reservoir)
    }

    pub fn roulette() -> Self {
        Self::new("roulette", DirectLighting::Mixture).with_roulette(true)
    }

    /// Light sampling for scenes whose dispersive materials split rays
    /// per colour channel.
    pub fn dispersion() -> Self {
        Self::new("dispersion", DirectLighting::Nee)
    }

    /// Terminate paths by Russian roulette once they carry little energy.
    pub fn with_roulette(mut self, roulette: bool) -> Self {
        self.roulette = roulette;
        self
    }

    pub fn direct_lighting(&self) -> DirectLighting {
        self.direct
    }

    /// Follows one path until it is absorbed, escapes or runs out of
    /// bounces. Child paths from splitting materials go onto `stack`.
    fn trace(
        &self,
        mut vertex: PathVertex,
        ctx: &RenderContext<'_>,
        sampler: &mut Sampler,
        stack: &mut Vec<PathVertex>,
    ) -> Color {
        let mut radiance = Color::ZERO;

        while vertex.depth > 0 {
            let Some(direction) = vertex.ray.direction().try_normalize() else {
                return radiance;
            };
            let Some(hit) = ctx.intersect(&vertex.ray) else {
                let weight = miss_weight(vertex.emission, ctx, direction);
                return radiance + vertex.throughput * ctx.miss_radiance(direction) * weight;
            };

            let material = ctx.scene.material(hit.material);
            let emitted = material.emit(&vertex.ray, &hit);
            if emitted.max_element() > 0.0 {
                let weight = hit_weight(vertex.emission, ctx, &hit, direction);
                radiance += vertex.throughput * emitted * weight;
            }

            let uc = sampler.get_1d();
            let u = sampler.get_2d();
            let Some(rec) = material.scatter(&vertex.ray, &hit, uc, u, &ctx.options) else {
                return radiance;
            };
            let depth = vertex.depth - 1;

            if let Some(split) = &rec.split {
                for (ray, weight) in split.iter() {
                    stack.push(PathVertex {
                        ray,
                        throughput: vertex.throughput * weight,
                        depth,
                        emission: EmissionPolicy::Count,
                    });
                }
                return radiance;
            }

            let (ray, weight, emission) = if rec.is_specular() {
                (rec.ray, rec.attenuation, EmissionPolicy::Count)
            } else {
                let wo = -direction;
                radiance += vertex.throughput * self.direct_light(ctx, &hit, material, wo, sampler);
                match self.continuation(ctx, &vertex.ray, &hit, material, wo, &rec, sampler) {
                    Some(next) => next,
                    None => return radiance,
                }
            };

            let mut throughput = vertex.throughput * weight;
            if self.roulette {
                let survival = weight.max_element().clamp(0.5, 1.0);
                if sampler.get_1d() >= survival {
                    return radiance;
                }
                throughput /= survival;
            }
            if !throughput.is_finite() || throughput.max_element() <= 0.0 {
                return radiance;
            }

            vertex = PathVertex {
                ray,
                throughput,
                depth,
                emission,
            };
        }

        radiance
    }

    fn direct_light(
        &self,
        ctx: &RenderContext<'_>,
        hit: &HitRecord,
        material: &dyn Material,
        wo: Vec3,
        sampler: &mut Sampler,
    ) -> Color {
        match self.direct {
            DirectLighting::Nee => direct_nee(ctx, hit, material, wo, sampler),
            DirectLighting::Mis => direct_mis(ctx, hit, material, wo, sampler),
            DirectLighting::Reservoir => direct_reservoir(ctx, hit, material, wo, sampler),
            DirectLighting::Mixture => Color::ZERO,
        }
    }

    /// Next ray after a continuous lobe, with its path weight.
    #[allow(clippy::too_many_arguments)]
    fn continuation(
        &self,
        ctx: &RenderContext<'_>,
        ray_in: &Ray,
        hit: &HitRecord,
        material: &dyn Material,
        wo: Vec3,
        rec: &ScatterRecord,
        sampler: &mut Sampler,
    ) -> Option<(Ray, Color, EmissionPolicy)> {
        if self.direct == DirectLighting::Mixture && !ctx.lights.is_empty() {
            return continue_with_mixture(ctx, ray_in, hit, material, wo, rec, sampler);
        }
        if rec.pdf_val <= 0.0 {
            return None;
        }
        let wi = rec.ray.direction().normalize();
        let weight = rec.attenuation * cosine_factor(material, hit, wi) / rec.pdf_val;
        let emission = match self.direct {
            DirectLighting::Nee | DirectLighting::Reservoir => EmissionPolicy::Skip,
            DirectLighting::Mis => EmissionPolicy::Mis {
                origin: hit.p,
                bsdf_pdf: rec.pdf_val,
            },
            DirectLighting::Mixture => EmissionPolicy::Count,
        };
        Some((rec.ray, weight, emission))
    }
}

impl Integrator for PathIntegrator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check_lights(&self, lights: &LightList) -> RenderResult<()> {
        if self.direct == DirectLighting::Reservoir {
            if let Some(env) = lights.environment() {
                return Err(RenderError::UnsupportedIntegratorLight {
                    integrator: self.name,
                    light: env.kind(),
                });
            }
        }
        Ok(())
    }

    fn estimate(&self, ray: &Ray, ctx: &RenderContext<'_>, sampler: &mut Sampler) -> Color {
        let mut stack = vec![PathVertex::camera(*ray, ctx.max_depth)];
        let mut radiance = Color::ZERO;
        while let Some(vertex) = stack.pop() {
            radiance += self.trace(vertex, ctx, sampler, &mut stack);
        }
        radiance
    }
}

/// Phase functions take no cosine; surfaces take `|n . wi|`.
pub(super) fn cosine_factor(material: &dyn Material, hit: &HitRecord, wi: Vec3) -> f32 {
    if material.is_volumetric() {
        1.0
    } else {
        wi.dot(hit.normal).abs()
    }
}

/// `f * Le * cos` for a light sample, before visibility and density.
pub(super) fn unshadowed(
    ctx: &RenderContext<'_>,
    hit: &HitRecord,
    material: &dyn Material,
    wo: Vec3,
    sample: &LightSample,
) -> Color {
    if sample.le.max_element() <= 0.0 {
        return Color::ZERO;
    }
    material.f(wo, sample.wi, hit, ctx.options.mode) * sample.le * cosine_factor(material, hit, sample.wi)
}

fn direct_nee(
    ctx: &RenderContext<'_>,
    hit: &HitRecord,
    material: &dyn Material,
    wo: Vec3,
    sampler: &mut Sampler,
) -> Color {
    let mut sum = Color::ZERO;
    for (sample, pmf) in ctx.sample_lights(hit.p, sampler) {
        let contribution = unshadowed(ctx, hit, material, wo, &sample);
        if contribution.max_element() <= 0.0 || !ctx.unoccluded(hit.p, &sample) {
            continue;
        }
        sum += contribution / (pmf * sample.pdf);
    }
    sum / ctx.light_sample_count() as f32
}

fn direct_mis(
    ctx: &RenderContext<'_>,
    hit: &HitRecord,
    material: &dyn Material,
    wo: Vec3,
    sampler: &mut Sampler,
) -> Color {
    let count = ctx.light_sample_count() as f32;
    let mut sum = Color::ZERO;
    for (sample, pmf) in ctx.sample_lights(hit.p, sampler) {
        let contribution = unshadowed(ctx, hit, material, wo, &sample);
        if contribution.max_element() <= 0.0 || !ctx.unoccluded(hit.p, &sample) {
            continue;
        }
        let light_pdf = pmf * sample.pdf;
        let bsdf_pdf = material.scatter_pdf(wo, sample.wi, hit, &ctx.options);
        sum += contribution * power_heuristic(count * light_pdf, bsdf_pdf) / light_pdf;
    }
    sum / count
}

/// Resampled importance sampling over the light-sample grid: candidates
/// are weighted by the luminance of their unshadowed contribution and only
/// the survivor is traced for visibility.
fn direct_reservoir(
    ctx: &RenderContext<'_>,
    hit: &HitRecord,
    material: &dyn Material,
    wo: Vec3,
    sampler: &mut Sampler,
) -> Color {
    let candidates = ctx.sample_lights(hit.p, sampler);
    let mut u = sampler.get_1d();
    let mut weight_sum = 0.0;
    let mut chosen: Option<(LightSample, Color, f32)> = None;

    for (sample, pmf) in candidates {
        let contribution = unshadowed(ctx, hit, material, wo, &sample);
        let target = luminance(contribution);
        if target <= 0.0 {
            continue;
        }
        let weight = target / (pmf * sample.pdf);
        weight_sum += weight;
        let p = weight / weight_sum;
        if u < p {
            chosen = Some((sample, contribution, target));
            u = (u / p).min(ONE_MINUS_EPSILON);
        } else {
            u = ((u - p) / (1.0 - p)).min(ONE_MINUS_EPSILON);
        }
    }

    let Some((sample, contribution, target)) = chosen else {
        return Color::ZERO;
    };
    if !ctx.unoccluded(hit.p, &sample) {
        return Color::ZERO;
    }
    contribution / target * (weight_sum / ctx.light_sample_count() as f32)
}

/// Draws the continuation from an even mix of the lights and the BSDF's
/// continuous lobes, and weights it by the mixture density.
fn continue_with_mixture(
    ctx: &RenderContext<'_>,
    ray_in: &Ray,
    hit: &HitRecord,
    material: &dyn Material,
    wo: Vec3,
    rec: &ScatterRecord,
    sampler: &mut Sampler,
) -> Option<(Ray, Color, EmissionPolicy)> {
    let bsdf = rec.pdf.as_ref()?;
    let toward_shapes: Vec<ShapePdf<'_>> = ctx
        .lights
        .iter()
        .filter_map(|light| light.primitive())
        .map(|primitive| ShapePdf::new(ctx.scene, primitive, hit.p))
        .collect();
    let environment = ctx.lights.has_environment().then_some(UniformSpherePdf);

    let light_count = toward_shapes.len() + usize::from(environment.is_some());
    let share = 0.5 / light_count as f32;
    let mut entries: Vec<(f32, &dyn Pdf)> = toward_shapes.iter().map(|p| (share, p as &dyn Pdf)).collect();
    if let Some(env) = &environment {
        entries.push((share, env as &dyn Pdf));
    }
    entries.push((0.5, bsdf.conditional() as &dyn Pdf));
    let mixture = MixturePdf::new(entries);

    let uc = sampler.get_1d();
    let u = sampler.get_2d();
    let wi = mixture.get(uc, u)?.try_normalize()?;
    // The material reached its continuous lobes only with this probability.
    let pdf = bsdf.selection_probability() * mixture.at(wi);
    if pdf <= 0.0 {
        return None;
    }
    let f = material.f(wo, wi, hit, ctx.options.mode);
    let weight = f * cosine_factor(material, hit, wi) / pdf;
    Some((hit.spawn_ray(ray_in, wi), weight, EmissionPolicy::Count))
}

/// Share of an emitter's radiance a vertex keeps under `policy`.
pub(super) fn hit_weight(policy: EmissionPolicy, ctx: &RenderContext<'_>, hit: &HitRecord, direction: Vec3) -> f32 {
    let light = ctx.lights.for_primitive(hit.primitive);
    match (policy, light) {
        (EmissionPolicy::Count, _) | (_, None) => 1.0,
        (EmissionPolicy::Skip, Some(_)) => 0.0,
        (EmissionPolicy::Mis { origin, bsdf_pdf }, Some(light)) => {
            let light_pdf = light_strategy_pdf(ctx, light.pdf_value(origin, direction));
            power_heuristic(bsdf_pdf, light_pdf)
        }
    }
}

/// Share of the environment's radiance an escaping path keeps.
pub(super) fn miss_weight(policy: EmissionPolicy, ctx: &RenderContext<'_>, direction: Vec3) -> f32 {
    let env = ctx.lights.environment();
    match (policy, env) {
        (EmissionPolicy::Count, _) | (_, None) => 1.0,
        (EmissionPolicy::Skip, Some(_)) => 0.0,
        (EmissionPolicy::Mis { origin, bsdf_pdf }, Some(env)) => {
            let light_pdf = light_strategy_pdf(ctx, env.pdf_value(origin, direction));
            power_heuristic(bsdf_pdf, light_pdf)
        }
    }
}

/// Density of the whole light-sampling strategy: uniform pick times the
/// light's own density, scaled by the number of light samples.
fn light_strategy_pdf(ctx: &RenderContext<'_>, pdf: f32) -> f32 {
    ctx.light_sample_count() as f32 * pdf / ctx.lights.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::BvhNode;
    use crate::material::{DiffuseEmitter, Lambertian, ThinDielectric};
    use crate::primitives::{AaRect, Primitive};
    use crate::scene::Scene;
    use lux_core::{RenderSettings, SamplerStrategy, Texture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// Emitted radiance of the test light.
    const LIGHT: f32 = 4.0;

    /// A diffuse floor lit by a unit square light one unit above the origin.
    /// Nothing bounces back, so the floor radiance at the origin is
    /// `albedo * LIGHT * F` with `F` the form factor of the square.
    fn lit_floor() -> Scene {
        let mut scene = Scene::new();
        let floor = scene.add_material(Lambertian::new(Color::splat(0.5)));
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, LIGHT));
        scene.add(Primitive::rect(AaRect::xz((-50.0, 50.0), (-50.0, 50.0), 0.0), floor));
        let square = scene.push(Primitive::rect(AaRect::xz((-0.5, 0.5), (-0.5, 0.5), 1.0), light));
        scene.add(Primitive::flip_face(square));
        scene
    }

    fn expected_floor_radiance() -> f32 {
        // Four 0.5 x 0.5 rectangles with a corner above the shading point.
        let a: f32 = 0.5;
        let s = (1.0 + a * a).sqrt();
        let corner = 2.0 * (a / s) * (a / s).atan() / (2.0 * std::f32::consts::PI);
        0.5 * LIGHT * 4.0 * corner
    }

    fn mean_radiance(integrator: &dyn Integrator, scene: &Scene, settings: &RenderSettings, ray: Ray, n: u64) -> Color {
        let lights = LightList::discover(scene, true).unwrap();
        integrator.check_lights(&lights).unwrap();
        let bvh = BvhNode::build(scene, &mut StdRng::seed_from_u64(42));
        let ctx = RenderContext::new(scene, bvh.as_ref(), &lights, settings);
        let mut sampler = Sampler::new(SamplerStrategy::Owen, n as u32, settings.seed);
        let mut sum = Color::ZERO;
        for i in 0..n {
            sampler.start_pixel_sample(0, i);
            let l = integrator.estimate(&ray, &ctx, &mut sampler);
            assert!(l.is_finite() && l.min_element() >= 0.0, "{l:?}");
            sum += l;
        }
        sum / n as f32
    }

    fn floor_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.5, 2.0), Vec3::new(0.0, -0.5, -2.0))
    }

    #[test]
    fn test_zero_depth_is_black() {
        let scene = lit_floor();
        let settings = RenderSettings {
            max_depth: 0,
            background: [1.0, 1.0, 1.0],
            ..RenderSettings::default()
        };
        let l = mean_radiance(&PathIntegrator::nee(), &scene, &settings, floor_ray(), 4);
        assert_eq!(l, Color::ZERO);
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = lit_floor();
        let settings = RenderSettings {
            background: [0.2, 0.3, 0.4],
            ..RenderSettings::default()
        };
        let up = Ray::new(Vec3::new(5.0, 0.5, 0.0), Vec3::Y);
        let l = mean_radiance(&PathIntegrator::mis(), &scene, &settings, up, 4);
        assert_eq!(l, Color::new(0.2, 0.3, 0.4));
    }

    #[test]
    fn test_camera_sees_light_directly() {
        let scene = lit_floor();
        let up = Ray::new(Vec3::new(0.1, 0.5, 0.1), Vec3::Y);
        let l = mean_radiance(&PathIntegrator::nee(), &scene, &RenderSettings::default(), up, 4);
        assert_eq!(l, Color::splat(LIGHT));
    }

    #[test]
    fn test_estimators_agree_on_lit_floor() {
        let scene = lit_floor();
        let expected = expected_floor_radiance();
        let settings = RenderSettings {
            light_samples_x: 2,
            light_samples_y: 2,
            ..RenderSettings::default()
        };
        for integrator in [
            PathIntegrator::nee(),
            PathIntegrator::mis(),
            PathIntegrator::reservoir(),
            PathIntegrator::roulette(),
            PathIntegrator::nee().with_roulette(true),
        ] {
            let l = mean_radiance(&integrator, &scene, &settings, floor_ray(), 4_000);
            assert!(
                (l.x - expected).abs() < 0.04 * expected,
                "{} estimated {} instead of {}",
                integrator.name(),
                l.x,
                expected
            );
        }
    }

    #[test]
    fn test_white_furnace_under_environment() {
        let mut scene = Scene::new();
        let grey = scene.add_material(Lambertian::new(Color::splat(0.5)));
        scene.add(Primitive::sphere(Vec3::ZERO, 1.0, grey));
        scene.set_environment(Arc::new(Texture::solid_color(Color::ONE)), 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        for integrator in [PathIntegrator::nee(), PathIntegrator::mis(), PathIntegrator::roulette()] {
            let l = mean_radiance(&integrator, &scene, &RenderSettings::default(), ray, 4_000);
            assert!((l.x - 0.5).abs() < 0.03, "{} estimated {}", integrator.name(), l.x);
        }
    }

    #[test]
    fn test_reservoir_rejects_environment() {
        let mut lights_scene = lit_floor();
        lights_scene.set_environment(Arc::new(Texture::solid_color(Color::ONE)), 1.0);
        let lights = LightList::discover(&lights_scene, false).unwrap();
        assert!(matches!(
            PathIntegrator::reservoir().check_lights(&lights),
            Err(RenderError::UnsupportedIntegratorLight { light: "environment", .. })
        ));
        assert!(PathIntegrator::nee().check_lights(&lights).is_ok());
    }

    #[test]
    fn test_split_sheet_transmits_light() {
        let mut scene = Scene::new();
        let sheet = scene.add_material(ThinDielectric::split(1.5));
        let light = scene.add_material(DiffuseEmitter::new(Color::ONE, LIGHT));
        scene.add(Primitive::rect(AaRect::xy((-1.0, 1.0), (-1.0, 1.0), 0.0), sheet));
        scene.add(Primitive::rect(AaRect::xy((-5.0, 5.0), (-5.0, 5.0), -1.0), light));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z);

        let (_, transmitted) = ThinDielectric::split(1.5).reflectance(1.0);
        let l = mean_radiance(&PathIntegrator::dispersion(), &scene, &RenderSettings::default(), ray, 2);
        assert!((l.x - transmitted * LIGHT).abs() < 1e-4, "{l:?}");
    }

    #[test]
    fn test_estimate_is_reproducible() {
        let scene = lit_floor();
        let settings = RenderSettings::default();
        let a = mean_radiance(&PathIntegrator::mis(), &scene, &settings, floor_ray(), 64);
        let b = mean_radiance(&PathIntegrator::mis(), &scene, &settings, floor_ray(), 64);
        assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));
    }
}
