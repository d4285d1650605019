use lux_math::{Color, Ray, Vec3};

use super::path::{cosine_factor, hit_weight, miss_weight, unshadowed};
use super::{EmissionPolicy, Integrator, PathVertex, RenderContext};
use crate::hittable::HitRecord;
use crate::material::Material;
use crate::medium::HomogeneousMedium;
use crate::sampler::Sampler;

/// Path tracer for scenes with homogeneous participating media.
///
/// Free-flight distances are drawn against the medium's majorant. A
/// collision before the next surface scatters by the phase function after
/// gathering the medium's own emission and a light sample; otherwise the
/// path continues at the surface as the light-sampling path tracer would,
/// with shadow rays attenuated by the medium they cross.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeIntegrator;

impl Integrator for VolumeIntegrator {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn estimate(&self, ray: &Ray, ctx: &RenderContext<'_>, sampler: &mut Sampler) -> Color {
        let camera_ray = ray.with_medium(ray.medium.or(ctx.scene.global_medium()));
        let mut stack = vec![PathVertex::camera(camera_ray, ctx.max_depth)];
        let mut radiance = Color::ZERO;
        while let Some(vertex) = stack.pop() {
            radiance += self.trace(vertex, ctx, sampler, &mut stack);
        }
        radiance
    }
}

impl VolumeIntegrator {
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
            let ray = Ray {
                direction,
                ..vertex.ray
            };
            let hit = ctx.intersect(&ray);
            let t_hit = hit.map_or(f32::INFINITY, |h| h.t);
            let depth = vertex.depth - 1;
            let medium = ray.medium.and_then(|index| ctx.scene.medium(index));

            if let Some(medium) = medium {
                if let Some(t) = medium.sample_distance(sampler.get_1d()) {
                    let sigma_maj = medium.sigma_maj();
                    if t < t_hit {
                        // Transmittance over the density of the sampled distance.
                        let beta = vertex.throughput * majorant_ratio(medium, t) / sigma_maj;
                        let p = ray.at(t);
                        let wo = -direction;
                        if medium.is_emitter() {
                            radiance += beta * medium.sigma_a() * medium.le();
                        }
                        radiance += beta * medium.sigma_s() * phase_direct(ctx, medium, p, wo, ray.medium, sampler);

                        let (wi, _) = medium.sample_phase(wo, sampler.get_2d());
                        let throughput = beta * medium.sigma_s();
                        if !throughput.is_finite() || throughput.max_element() <= 0.0 {
                            return radiance;
                        }
                        vertex = PathVertex {
                            ray: Ray::new(p, wi)
                                .with_medium(ray.medium)
                                .with_intensity(ray.intensity),
                            throughput,
                            depth,
                            emission: EmissionPolicy::Skip,
                        };
                        continue;
                    }
                    vertex.throughput *= majorant_ratio(medium, t_hit);
                }
            }

            let Some(hit) = hit else {
                let weight = miss_weight(vertex.emission, ctx, direction);
                return radiance + vertex.throughput * ctx.miss_radiance(direction) * weight;
            };

            let material = ctx.scene.material(hit.material);
            let emitted = material.emit(&ray, &hit);
            if emitted.max_element() > 0.0 {
                radiance += vertex.throughput * emitted * hit_weight(vertex.emission, ctx, &hit, direction);
            }

            let uc = sampler.get_1d();
            let u = sampler.get_2d();
            let Some(rec) = material.scatter(&ray, &hit, uc, u, &ctx.options) else {
                return radiance;
            };

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

            let (next, weight, emission) = if rec.is_specular() {
                (rec.ray, rec.attenuation, EmissionPolicy::Count)
            } else {
                let wo = -direction;
                radiance += vertex.throughput * surface_direct(ctx, &ray, &hit, material, wo, sampler);
                if rec.pdf_val <= 0.0 {
                    return radiance;
                }
                let wi = rec.ray.direction().normalize();
                let weight = rec.attenuation * cosine_factor(material, &hit, wi) / rec.pdf_val;
                (rec.ray, weight, EmissionPolicy::Skip)
            };

            let throughput = vertex.throughput * weight;
            if !throughput.is_finite() || throughput.max_element() <= 0.0 {
                return radiance;
            }
            vertex = PathVertex {
                ray: next,
                throughput,
                depth,
                emission,
            };
        }

        radiance
    }
}

/// `T(t) / exp(-sigma_maj t)` per channel, computed without underflow.
fn majorant_ratio(medium: &HomogeneousMedium, t: f32) -> Color {
    let excess = (Color::splat(medium.sigma_maj()) - medium.sigma_t()) * t;
    Color::new(excess.x.exp(), excess.y.exp(), excess.z.exp())
}

/// Transmittance over `distance` through `medium`. An empty medium is
/// transparent even over infinite distances.
fn segment_transmittance(medium: Option<&HomogeneousMedium>, distance: f32) -> Color {
    match medium {
        Some(medium) if medium.sigma_maj() > 0.0 => medium.transmittance(distance),
        _ => Color::ONE,
    }
}

/// Light arriving at a medium point and scattered toward `wo`, per unit
/// scattering coefficient.
fn phase_direct(
    ctx: &RenderContext<'_>,
    medium: &HomogeneousMedium,
    p: Vec3,
    wo: Vec3,
    medium_index: Option<usize>,
    sampler: &mut Sampler,
) -> Color {
    let current = medium_index.and_then(|index| ctx.scene.medium(index));
    let mut sum = Color::ZERO;
    for (sample, pmf) in ctx.sample_lights(p, sampler) {
        let phase = medium.phase(wo, sample.wi);
        if phase <= 0.0 || sample.le.max_element() <= 0.0 || !ctx.unoccluded(p, &sample) {
            continue;
        }
        let tr = segment_transmittance(current, sample.distance);
        sum += sample.le * tr * phase / (pmf * sample.pdf);
    }
    sum / ctx.light_sample_count() as f32
}

/// Light sampling at a surface, attenuated by the medium on the side each
/// shadow ray leaves into.
fn surface_direct(
    ctx: &RenderContext<'_>,
    ray: &Ray,
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
        let medium = hit
            .medium_towards(sample.wi, ray.medium)
            .and_then(|index| ctx.scene.medium(index));
        let tr = segment_transmittance(medium, sample.distance);
        sum += contribution * tr / (pmf * sample.pdf);
    }
    sum / ctx.light_sample_count() as f32
}
