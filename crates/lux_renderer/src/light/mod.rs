//! Light sources sampled for next-event estimation.
//!
//! Lights are discovered from emissive primitives when a render starts
//! (see [`LightList::discover`]). Area lights keep the world-space geometry
//! of the primitive they came from, with any decorator placement already
//! applied, so sampling them never walks the scene arena.

mod list;

pub use list::LightList;

use std::f32::consts::PI;
use std::sync::Arc;

use crate::hittable::Hittable;
use crate::primitives::{AaRect, Sphere};
use crate::scene::{MaterialId, PrimitiveId, Scene};
use lux_core::Texture;
use lux_math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};
use lux_math::{Affine3A, Affine3Ext, Color, Interval, Ray, Vec2, Vec3};

/// Distance at which points on the environment are placed.
const ENVIRONMENT_DISTANCE: f32 = 1e5;

/// Equirectangular texture coordinates of a world direction. `-Y` maps to
/// the top row (`v = 0`).
pub fn direction_to_equirect(direction: Vec3) -> Vec2 {
    let d = direction.normalize_or_zero();
    let theta = (-d.y).clamp(-1.0, 1.0).acos();
    let phi = (-d.z).atan2(d.x) + PI;
    Vec2::new(phi / (2.0 * PI), theta / PI)
}

/// A point on a light surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightPoint {
    pub p: Vec3,
    /// Normal on the emitting side
    pub normal: Vec3,
    pub uv: Vec2,
}

/// A direction toward a light chosen for a shading point.
#[derive(Clone, Copy, Debug)]
pub struct LightSample {
    pub point: LightPoint,
    /// Unit direction from the shading point to the light
    pub wi: Vec3,
    /// Distance to the light point, infinite for the environment
    pub distance: f32,
    /// Solid-angle density of `wi`
    pub pdf: f32,
    /// Radiance arriving along `-wi`
    pub le: Color,
}

impl LightSample {
    /// Shadow-ray interval that stops short of the light surface.
    pub fn shadow_interval(&self) -> Interval {
        Interval::new(1e-3, self.distance - 1e-3)
    }
}

/// A parallelogram emitter, placed in world space.
#[derive(Clone, Debug)]
pub struct QuadLight {
    corner: Vec3,
    edge_u: Vec3,
    edge_v: Vec3,
    normal: Vec3,
    area: f32,
    pub material: MaterialId,
    pub primitive: PrimitiveId,
}

impl QuadLight {
    /// Light for `rect` after `transform`. `flipped` turns emission toward
    /// `-axis`.
    pub fn from_rect(
        rect: &AaRect,
        transform: Affine3A,
        flipped: bool,
        material: MaterialId,
        primitive: PrimitiveId,
    ) -> Self {
        let (i0, i1) = rect.axis.plane_axes();
        let mut corner = Vec3::ZERO;
        corner[rect.axis.index()] = rect.k;
        corner[i0] = rect.d0.min;
        corner[i1] = rect.d1.min;
        let mut edge_u = Vec3::ZERO;
        edge_u[i0] = rect.d0.size();
        let mut edge_v = Vec3::ZERO;
        edge_v[i1] = rect.d1.size();
        let outward = if flipped { -rect.axis.unit() } else { rect.axis.unit() };

        let edge_u = transform.transform_vector3(edge_u);
        let edge_v = transform.transform_vector3(edge_v);
        Self {
            corner: transform.transform_point3(corner),
            edge_u,
            edge_v,
            normal: transform.transform_normal(outward),
            area: edge_u.cross(edge_v).length(),
            material,
            primitive,
        }
    }

    fn point(&self, u: Vec2) -> LightPoint {
        LightPoint {
            p: self.corner + u.x * self.edge_u + u.y * self.edge_v,
            normal: self.normal,
            uv: u,
        }
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let denom = self.normal.dot(direction);
        if denom.abs() < 1e-6 || self.area <= 0.0 {
            return 0.0;
        }
        let t = (self.corner - origin).dot(self.normal) / denom;
        if t <= 0.0 {
            return 0.0;
        }
        let local = origin + t * direction - self.corner;
        let a = local.dot(self.edge_u) / self.edge_u.length_squared();
        let b = local.dot(self.edge_v) / self.edge_v.length_squared();
        if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) {
            return 0.0;
        }
        let distance_squared = t * t * direction.length_squared();
        let cosine = denom.abs() / direction.length();
        distance_squared / (self.area * cosine)
    }
}

/// A spherical emitter, placed in world space.
#[derive(Clone, Debug)]
pub struct SphereLight {
    sphere: Sphere,
    /// Undoes the placement rotation for texture lookups
    to_object: Affine3A,
    flipped: bool,
    pub material: MaterialId,
    pub primitive: PrimitiveId,
}

impl SphereLight {
    pub fn from_sphere(
        sphere: &Sphere,
        transform: Affine3A,
        flipped: bool,
        material: MaterialId,
        primitive: PrimitiveId,
    ) -> Self {
        Self {
            sphere: Sphere::new(transform.transform_point3(sphere.center), sphere.radius),
            to_object: transform.inverse(),
            flipped,
            material,
            primitive,
        }
    }

    /// The point of the sphere in direction `outward` from its centre.
    fn point_toward(&self, outward: Vec3) -> LightPoint {
        let uv = Sphere::sphere_uv(self.to_object.transform_vector3(outward).normalize_or_zero());
        LightPoint {
            p: self.sphere.center + self.sphere.radius * outward,
            normal: if self.flipped { -outward } else { outward },
            uv,
        }
    }
}

/// An image surrounding the scene at infinity.
#[derive(Clone, Debug)]
pub struct EnvironmentLight {
    pub texture: Arc<Texture>,
    pub intensity: f32,
}

impl EnvironmentLight {
    /// Radiance arriving from `direction`.
    pub fn radiance(&self, direction: Vec3) -> Color {
        let uv = direction_to_equirect(direction);
        self.texture.sample(uv.x, uv.y) * self.intensity
    }
}

/// Every kind of light the integrators can sample.
#[derive(Clone, Debug)]
pub enum Light {
    Quad(QuadLight),
    Sphere(SphereLight),
    Environment(EnvironmentLight),
}

impl Light {
    pub fn kind(&self) -> &'static str {
        match self {
            Light::Quad(_) => "quad",
            Light::Sphere(_) => "sphere",
            Light::Environment(_) => "environment",
        }
    }

    /// The scene root this light was discovered from.
    pub fn primitive(&self) -> Option<PrimitiveId> {
        match self {
            Light::Quad(q) => Some(q.primitive),
            Light::Sphere(s) => Some(s.primitive),
            Light::Environment(_) => None,
        }
    }

    pub fn is_environment(&self) -> bool {
        matches!(self, Light::Environment(_))
    }

    /// A point on the light, uniform over its area. The environment returns
    /// a distant point in a uniformly chosen direction.
    pub fn get_sample(&self, u: Vec2) -> LightPoint {
        match self {
            Light::Quad(q) => q.point(u),
            Light::Sphere(s) => s.point_toward(sample_uniform_sphere(u)),
            Light::Environment(_) => {
                let direction = sample_uniform_sphere(u);
                LightPoint {
                    p: direction * ENVIRONMENT_DISTANCE,
                    normal: -direction,
                    uv: direction_to_equirect(direction),
                }
            }
        }
    }

    pub fn get_normal_at(&self, p: Vec3) -> Vec3 {
        match self {
            Light::Quad(q) => q.normal,
            Light::Sphere(s) => {
                let outward = (p - s.sphere.center).normalize_or_zero();
                if s.flipped {
                    -outward
                } else {
                    outward
                }
            }
            Light::Environment(_) => -p.normalize_or_zero(),
        }
    }

    pub fn get_area(&self) -> f32 {
        match self {
            Light::Quad(q) => q.area,
            Light::Sphere(s) => s.sphere.area(),
            Light::Environment(_) => f32::INFINITY,
        }
    }

    /// Solid-angle density with which [`Light::sample_li`] picks `direction`
    /// from `origin`.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        match self {
            Light::Quad(q) => q.pdf_value(origin, direction),
            Light::Sphere(s) => s.sphere.pdf_value(origin, direction),
            Light::Environment(_) => uniform_sphere_pdf(),
        }
    }

    /// Radiance leaving `point` along `w_from_light`. Area lights emit from
    /// the side their normal faces only.
    pub fn l_emit(&self, scene: &Scene, point: &LightPoint, w_from_light: Vec3) -> Color {
        match self {
            Light::Quad(QuadLight { material, .. }) | Light::Sphere(SphereLight { material, .. }) => {
                if point.normal.dot(w_from_light) > 0.0 {
                    scene.material(*material).emission(point.uv)
                } else {
                    Color::ZERO
                }
            }
            Light::Environment(env) => env.radiance(-w_from_light),
        }
    }

    /// Picks a direction toward the light as seen from `origin`. Quads are
    /// sampled by area, spheres over their visible cone, the environment
    /// uniformly over the sphere.
    pub fn sample_li(&self, scene: &Scene, origin: Vec3, u: Vec2) -> Option<LightSample> {
        let (point, wi, distance, pdf) = match self {
            Light::Quad(q) => {
                let point = q.point(u);
                let to_light = point.p - origin;
                let distance = to_light.length();
                if distance <= 0.0 {
                    return None;
                }
                let wi = to_light / distance;
                let pdf = q.pdf_value(origin, wi);
                (point, wi, distance, pdf)
            }
            Light::Sphere(s) => {
                let wi = s.sphere.sample_direction(origin, u).normalize_or_zero();
                let rec = s.sphere.hit(&Ray::new(origin, wi), Interval::new(1e-4, f32::INFINITY))?;
                let outward = (rec.p - s.sphere.center) / s.sphere.radius;
                (s.point_toward(outward), wi, rec.t, s.sphere.pdf_value(origin, wi))
            }
            Light::Environment(env) => {
                let wi = sample_uniform_sphere(u);
                let point = LightPoint {
                    p: origin + wi * ENVIRONMENT_DISTANCE,
                    normal: -wi,
                    uv: direction_to_equirect(wi),
                };
                return Some(LightSample {
                    point,
                    wi,
                    distance: f32::INFINITY,
                    pdf: uniform_sphere_pdf(),
                    le: env.radiance(wi),
                });
            }
        };
        if pdf <= 0.0 || !pdf.is_finite() {
            return None;
        }
        Some(LightSample {
            le: self.l_emit(scene, &point, -wi),
            point,
            wi,
            distance,
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::DiffuseEmitter;
    use crate::primitives::Axis;
    use crate::pdf::Pdf;
    use crate::test_utils::{assert_approx, estimate_pdf_integral};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Adapts a light's density and sampler to the `Pdf` interface.
    struct LightPdf<'a> {
        light: &'a Light,
        scene: &'a Scene,
        origin: Vec3,
    }

    impl Pdf for LightPdf<'_> {
        fn get(&self, _uc: f32, u: Vec2) -> Option<Vec3> {
            self.light.sample_li(self.scene, self.origin, u).map(|s| s.wi)
        }

        fn at(&self, direction: Vec3) -> f32 {
            self.light.pdf_value(self.origin, direction)
        }
    }

    fn emissive_scene() -> (Scene, MaterialId) {
        let mut scene = Scene::new();
        let m = scene.add_material(DiffuseEmitter::new(Color::new(1.0, 0.5, 0.25), 4.0));
        (scene, m)
    }

    fn ceiling(scene_material: MaterialId) -> Light {
        let rect = AaRect::xz((-1.0, 1.0), (-0.5, 0.5), 2.0);
        Light::Quad(QuadLight::from_rect(&rect, Affine3A::IDENTITY, true, scene_material, PrimitiveId(0)))
    }

    #[test]
    fn test_equirect_poles_and_horizon() {
        assert_approx!(direction_to_equirect(Vec3::NEG_Y).y, 0.0, 1e-5);
        assert_approx!(direction_to_equirect(Vec3::Y).y, 1.0, 1e-5);
        let side = direction_to_equirect(Vec3::X);
        assert_approx!(side.y, 0.5, 1e-5);
        assert_approx!(side.x, 0.5, 1e-5);
    }

    #[test]
    fn test_quad_geometry() {
        let (_, m) = emissive_scene();
        let light = ceiling(m);
        assert_approx!(light.get_area(), 2.0, 1e-5);
        assert_eq!(light.get_normal_at(Vec3::ZERO), Vec3::NEG_Y);
        let p = light.get_sample(Vec2::new(0.5, 0.5)).p;
        assert!((p - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_quad_emits_from_one_side() {
        let (scene, m) = emissive_scene();
        let light = ceiling(m);
        let point = light.get_sample(Vec2::splat(0.5));
        let down = light.l_emit(&scene, &point, Vec3::NEG_Y);
        assert_eq!(down, Color::new(4.0, 2.0, 1.0));
        assert_eq!(light.l_emit(&scene, &point, Vec3::Y), Color::ZERO);

        let below = light.sample_li(&scene, Vec3::ZERO, Vec2::splat(0.3)).unwrap();
        assert!(below.le.x > 0.0);
        let above = light.sample_li(&scene, Vec3::new(0.0, 4.0, 0.0), Vec2::splat(0.3)).unwrap();
        assert_eq!(above.le, Color::ZERO);
    }

    #[test]
    fn test_quad_sampling_matches_density() {
        let (scene, m) = emissive_scene();
        let light = ceiling(m);
        let origin = Vec3::new(0.3, 0.0, 0.1);
        let pdf = LightPdf { light: &light, scene: &scene, origin };
        assert_approx!(estimate_pdf_integral(&pdf, 200_000, 42), 1.0, 0.05);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let sample = light.sample_li(&scene, origin, Vec2::new(rng.gen(), rng.gen())).unwrap();
            assert_approx!(sample.pdf, light.pdf_value(origin, sample.wi), 1e-3 * sample.pdf);
            assert!(sample.shadow_interval().max < sample.distance);
        }
    }

    #[test]
    fn test_sphere_sampling_matches_density() {
        let (scene, m) = emissive_scene();
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -2.0), 1.0);
        let light = Light::Sphere(SphereLight::from_sphere(
            &sphere,
            Affine3A::IDENTITY,
            false,
            m,
            PrimitiveId(0),
        ));
        let origin = Vec3::new(0.2, 0.1, 0.0);
        let pdf = LightPdf { light: &light, scene: &scene, origin };
        assert_approx!(estimate_pdf_integral(&pdf, 200_000, 42), 1.0, 0.05);

        let sample = light.sample_li(&scene, origin, Vec2::new(0.4, 0.6)).unwrap();
        assert!(sample.le.x > 0.0);
        assert!(sample.distance > 0.9 && sample.distance < 2.0);
    }

    #[test]
    fn test_rotated_quad_keeps_area_and_turns_normal() {
        let (_, m) = emissive_scene();
        let rect = AaRect::xy((0.0, 2.0), (0.0, 1.0), 0.0);
        let rotation = Affine3A::from_quat(Axis::Y.rotation(std::f32::consts::FRAC_PI_2));
        let light = Light::Quad(QuadLight::from_rect(&rect, rotation, false, m, PrimitiveId(3)));
        assert_approx!(light.get_area(), 2.0, 1e-5);
        assert!((light.get_normal_at(Vec3::ZERO) - Vec3::X).length() < 1e-5);
        assert_eq!(light.primitive(), Some(PrimitiveId(3)));
    }

    #[test]
    fn test_environment_is_infinite() {
        let texture = Arc::new(Texture::solid_color(Color::new(0.5, 0.5, 1.0)));
        let light = Light::Environment(EnvironmentLight { texture, intensity: 2.0 });
        let (scene, _) = emissive_scene();
        assert!(light.get_area().is_infinite());
        assert!(light.primitive().is_none());
        let sample = light.sample_li(&scene, Vec3::ZERO, Vec2::new(0.1, 0.9)).unwrap();
        assert!(sample.distance.is_infinite());
        assert_eq!(sample.le, Color::new(1.0, 1.0, 2.0));
        assert_approx!(sample.pdf, uniform_sphere_pdf(), 1e-6);
        let far = light.get_sample(Vec2::new(0.1, 0.9));
        assert!((light.get_normal_at(far.p) - far.normal).length() < 1e-4);
    }
}
