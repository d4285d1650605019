//! Ray/surface intersection records.

use crate::medium::MediumInterface;
use crate::scene::{MaterialId, PrimitiveId};
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Everything a material or light needs to know about a surface hit.
#[derive(Clone, Copy, Debug)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Unit normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Ray parameter of the hit
    pub t: f32,
    pub uv: Vec2,
    /// Fiber direction for curves, zero elsewhere
    pub tangent: Vec3,
    /// The ray arrived on the side the outward normal points to
    pub front_face: bool,
    pub material: MaterialId,
    pub medium: Option<MediumInterface>,
    /// Top-level primitive that was hit
    pub primitive: PrimitiveId,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::Z,
            t: f32::INFINITY,
            uv: Vec2::ZERO,
            tangent: Vec3::ZERO,
            front_face: true,
            material: MaterialId::default(),
            medium: None,
            primitive: PrimitiveId::default(),
        }
    }
}

impl HitRecord {
    /// Orient the stored normal against `ray` and remember which side was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    #[inline]
    pub fn is_inside(&self) -> bool {
        !self.front_face
    }

    /// Normal pointing to the side the outward geometric normal faces.
    pub fn outward_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }

    /// Medium on the side `direction` leaves into, falling back to `current`
    /// when the surface does not separate media.
    pub fn medium_towards(&self, direction: Vec3, current: Option<usize>) -> Option<usize> {
        match self.medium {
            Some(interface) => {
                if direction.dot(self.outward_normal()) > 0.0 {
                    interface.outside
                } else {
                    interface.inside
                }
            }
            None => current,
        }
    }

    /// Spawn a ray from the hit point, carrying over the medium it enters.
    pub fn spawn_ray(&self, incoming: &Ray, direction: Vec3) -> Ray {
        Ray::new(self.p, direction)
            .with_medium(self.medium_towards(direction, incoming.medium))
            .with_intensity(incoming.intensity)
    }
}

/// Geometry that answers ray queries on its own.
///
/// Records come back without material or medium; the scene fills those in
/// from the primitive that owns the geometry.
pub trait Hittable: Send + Sync {
    /// Closest hit strictly inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;

    fn bounding_box(&self) -> Aabb;
}
