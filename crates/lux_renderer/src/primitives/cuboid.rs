//! Axis-aligned box made of six rectangles.

use super::rect::AaRect;
use crate::hittable::{HitRecord, Hittable};
use lux_math::{Aabb, Interval, Ray, Vec3};

#[derive(Clone, Debug)]
pub struct Cuboid {
    faces: [AaRect; 6],
    bbox: Aabb,
}

impl Cuboid {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        let lo = a.min(b);
        let hi = a.max(b);
        let (x, y, z) = ((lo.x, hi.x), (lo.y, hi.y), (lo.z, hi.z));

        // Even slots sit on the upper bound of their axis.
        let faces = [
            AaRect::yz(y, z, hi.x),
            AaRect::yz(y, z, lo.x),
            AaRect::xz(x, z, hi.y),
            AaRect::xz(x, z, lo.y),
            AaRect::xy(x, y, hi.z),
            AaRect::xy(x, y, lo.z),
        ];
        Self {
            faces,
            bbox: Aabb::from_points(lo, hi),
        }
    }
}

impl Hittable for Cuboid {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest: Option<(usize, HitRecord)> = None;
        let mut interval = ray_t;
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(rec) = face.hit(ray, interval) {
                interval = interval.with_max(rec.t);
                closest = Some((i, rec));
            }
        }

        let (face, mut rec) = closest?;
        let outward = if face % 2 == 0 {
            self.faces[face].axis.unit()
        } else {
            -self.faces[face].axis.unit()
        };
        rec.set_face_normal(ray, outward);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_outward_normals() {
        let cuboid = Cuboid::new(Vec3::ZERO, Vec3::ONE);
        let interval = Interval::new(0.001, f32::INFINITY);

        let from_below = cuboid.hit(&Ray::new(Vec3::new(0.5, -2.0, 0.5), Vec3::Y), interval).unwrap();
        assert!(from_below.front_face);
        assert_eq!(from_below.normal, Vec3::NEG_Y);
        assert!((from_below.t - 2.0).abs() < 1e-5);

        let from_above = cuboid.hit(&Ray::new(Vec3::new(0.5, 3.0, 0.5), Vec3::NEG_Y), interval).unwrap();
        assert!(from_above.front_face);
        assert_eq!(from_above.normal, Vec3::Y);
    }

    #[test]
    fn test_cuboid_from_inside() {
        let cuboid = Cuboid::new(Vec3::splat(-1.0), Vec3::ONE);
        let rec = cuboid
            .hit(&Ray::new(Vec3::ZERO, Vec3::X), Interval::new(0.001, f32::INFINITY))
            .unwrap();
        assert!(rec.is_inside());
        assert!((rec.t - 1.0).abs() < 1e-5);
    }
}
