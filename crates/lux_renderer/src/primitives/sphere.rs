//! Sphere primitive, also usable as a spherical area light.

use std::f32::consts::PI;

use crate::hittable::{HitRecord, Hittable};
use lux_math::sampling::{sample_cone_to_sphere, sample_uniform_sphere, INV_4PI};
use lux_math::{Aabb, Interval, Onb, Ray, Vec2, Vec3};

#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        Self {
            center,
            radius,
            bbox: Aabb::from_points(center - rvec, center + rvec),
        }
    }

    /// Texture coordinates for a point on the unit sphere. `+Z` lands on
    /// `u = 0`, `v = 0.5`.
    pub(crate) fn sphere_uv(p: Vec3) -> Vec2 {
        let phi = p.z.atan2(p.x);
        let theta = p.y.clamp(-1.0, 1.0).asin();
        let u = 1.0 - (phi + PI) / (2.0 * PI);
        let v = (theta + PI / 2.0) / PI;
        Vec2::new((u + 0.75).rem_euclid(1.0), v)
    }

    /// Solid-angle density of `direction` as seen from `origin` when
    /// sampling the visible cone of the sphere.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if self.hit(&Ray::new(origin, direction), Interval::new(0.001, f32::INFINITY)).is_none() {
            return 0.0;
        }

        let distance_squared = (self.center - origin).length_squared();
        let r2 = self.radius * self.radius;
        if distance_squared <= r2 {
            return INV_4PI;
        }
        let cos_theta_max = (1.0 - r2 / distance_squared).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        if solid_angle <= 0.0 {
            return 0.0;
        }
        1.0 / solid_angle
    }

    /// Direction from `origin` toward a point of the visible cap.
    pub fn sample_direction(&self, origin: Vec3, u: Vec2) -> Vec3 {
        let direction = self.center - origin;
        let distance_squared = direction.length_squared();
        if distance_squared <= self.radius * self.radius {
            return sample_uniform_sphere(u);
        }
        Onb::from_w(direction).to_world(sample_cone_to_sphere(self.radius, distance_squared, u))
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let mut rec = HitRecord {
            t: root,
            p: ray.at(root),
            ..HitRecord::default()
        };
        let outward_normal = (rec.p - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        rec.uv = Self::sphere_uv(outward_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
