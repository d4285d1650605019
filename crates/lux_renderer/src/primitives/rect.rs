//! Axis-aligned rectangles.

use crate::hittable::{HitRecord, Hittable};
use lux_math::{Aabb, Interval, Quat, Ray, Vec2, Vec3};

/// A coordinate axis. For rectangles it names the plane normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// The two in-plane axes, in increasing order.
    pub fn plane_axes(self) -> (usize, usize) {
        match self {
            Axis::X => (1, 2),
            Axis::Y => (0, 2),
            Axis::Z => (0, 1),
        }
    }

    pub fn rotation(self, angle: f32) -> Quat {
        match self {
            Axis::X => Quat::from_rotation_x(angle),
            Axis::Y => Quat::from_rotation_y(angle),
            Axis::Z => Quat::from_rotation_z(angle),
        }
    }
}

/// Rectangle in the plane `axis = k`, spanning `d0` and `d1` along the two
/// remaining axes. The outward normal is `+axis`.
#[derive(Clone, Debug)]
pub struct AaRect {
    pub axis: Axis,
    pub d0: Interval,
    pub d1: Interval,
    pub k: f32,
}

impl AaRect {
    pub fn new(axis: Axis, k: f32, d0: (f32, f32), d1: (f32, f32)) -> Self {
        Self {
            axis,
            d0: Interval::new(d0.0.min(d0.1), d0.0.max(d0.1)),
            d1: Interval::new(d1.0.min(d1.1), d1.0.max(d1.1)),
            k,
        }
    }

    /// Rectangle in the XY plane at `z = k`.
    pub fn xy(x: (f32, f32), y: (f32, f32), k: f32) -> Self {
        Self::new(Axis::Z, k, x, y)
    }

    /// Rectangle in the XZ plane at `y = k`.
    pub fn xz(x: (f32, f32), z: (f32, f32), k: f32) -> Self {
        Self::new(Axis::Y, k, x, z)
    }

    /// Rectangle in the YZ plane at `x = k`.
    pub fn yz(y: (f32, f32), z: (f32, f32), k: f32) -> Self {
        Self::new(Axis::X, k, y, z)
    }

    pub fn area(&self) -> f32 {
        self.d0.size() * self.d1.size()
    }

    fn point(&self, a: f32, b: f32) -> Vec3 {
        let (i0, i1) = self.axis.plane_axes();
        let mut p = Vec3::ZERO;
        p[self.axis.index()] = self.k;
        p[i0] = a;
        p[i1] = b;
        p
    }

    /// Corners in winding order, such that `(v1 - v0) x (v3 - v0)` points
    /// along `+axis`.
    pub fn corners(&self) -> [Vec3; 4] {
        let (d0, d1) = (self.d0, self.d1);
        let v0 = self.point(d0.min, d1.min);
        let v1 = self.point(d0.max, d1.min);
        let v2 = self.point(d0.max, d1.max);
        let v3 = self.point(d0.min, d1.max);
        if (v1 - v0).cross(v3 - v0).dot(self.axis.unit()) >= 0.0 {
            [v0, v1, v2, v3]
        } else {
            [v0, v3, v2, v1]
        }
    }

    /// Solid-angle density of `direction` from `origin` under uniform area sampling.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let Some(rec) = self.hit(&Ray::new(origin, direction), Interval::new(0.001, f32::INFINITY))
        else {
            return 0.0;
        };

        let area = self.area();
        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();
        if area <= 0.0 || cosine < 1e-6 {
            return 0.0;
        }
        distance_squared / (cosine * area)
    }

    /// Unnormalized direction from `origin` to a uniformly chosen point.
    pub fn sample_direction(&self, origin: Vec3, u: Vec2) -> Vec3 {
        let a = self.d0.min + u.x * self.d0.size();
        let b = self.d1.min + u.y * self.d1.size();
        self.point(a, b) - origin
    }
}

impl Hittable for AaRect {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let axis = self.axis.index();
        let (i0, i1) = self.axis.plane_axes();

        let denom = ray.direction()[axis];
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = (self.k - ray.origin()[axis]) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let p = ray.at(t);
        let (a, b) = (p[i0], p[i1]);
        if !self.d0.contains(a) || !self.d1.contains(b) {
            return None;
        }

        let mut rec = HitRecord {
            t,
            p,
            uv: Vec2::new(
                (a - self.d0.min) / self.d0.size(),
                (b - self.d1.min) / self.d1.size(),
            ),
            ..HitRecord::default()
        };
        rec.p[axis] = self.k;
        rec.set_face_normal(ray, self.axis.unit());
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        let (i0, i1) = self.axis.plane_axes();
        let mut intervals = [Interval::new(self.k, self.k); 3];
        intervals[i0] = self.d0;
        intervals[i1] = self.d1;
        Aabb::new(intervals[0], intervals[1], intervals[2])
    }
}
