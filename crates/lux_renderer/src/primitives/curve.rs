//! Cubic Bézier curves rendered as chains of cylinders, for hair and fur.

use crate::hittable::{HitRecord, Hittable};
use lux_math::{Aabb, Interval, Ray, Vec3};

/// Number of straight cylinder segments a curve is diced into.
const SEGMENTS: usize = 8;

#[derive(Clone, Debug)]
pub struct Curve {
    control_points: [Vec3; 4],
    width0: f32,
    width1: f32,
    bbox: Aabb,
}

impl Curve {
    pub fn new(control_points: [Vec3; 4], width0: f32, width1: f32) -> Self {
        let r = width0.max(width1).max(0.0);
        let bbox = Aabb::enclosing(control_points);
        let bbox = Aabb::from_points(bbox.min() - Vec3::splat(r), bbox.max() + Vec3::splat(r));
        Self {
            control_points,
            width0,
            width1,
            bbox,
        }
    }

    pub fn eval(&self, u: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.control_points;
        let v = 1.0 - u;
        v * v * v * p0 + 3.0 * v * v * u * p1 + 3.0 * v * u * u * p2 + u * u * u * p3
    }

    pub fn derivative(&self, u: f32) -> Vec3 {
        let [p0, p1, p2, p3] = self.control_points;
        let v = 1.0 - u;
        3.0 * v * v * (p1 - p0) + 6.0 * v * u * (p2 - p1) + 3.0 * u * u * (p3 - p2)
    }

    fn width_at(&self, u: f32) -> f32 {
        self.width0 + (self.width1 - self.width0) * u
    }
}

impl Hittable for Curve {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let points: [Vec3; SEGMENTS + 1] =
            std::array::from_fn(|i| self.eval(i as f32 / SEGMENTS as f32));
        let tangents: [Vec3; SEGMENTS + 1] =
            std::array::from_fn(|i| self.derivative(i as f32 / SEGMENTS as f32));

        let mut best: Option<(f32, Vec3, Vec3, Vec3)> = None;
        let mut best_t = ray_t.max;

        for i in 0..SEGMENTS {
            let (pa, pb) = (points[i], points[i + 1]);
            let seg = pb - pa;
            let seg_len = seg.length();
            if seg_len <= 0.0 {
                continue;
            }
            let axis = seg / seg_len;
            let radius = 0.5
                * (self.width_at(i as f32 / SEGMENTS as f32)
                    + self.width_at((i + 1) as f32 / SEGMENTS as f32));

            // Project onto the plane perpendicular to the segment axis.
            let d_perp = ray.direction() - ray.direction().dot(axis) * axis;
            let delta = ray.origin() - pa;
            let o_perp = delta - delta.dot(axis) * axis;

            let a = d_perp.length_squared();
            let b = 2.0 * d_perp.dot(o_perp);
            let c = o_perp.length_squared() - radius * radius;
            let Some(roots) = solve_quadratic(a, b, c) else {
                continue;
            };

            for t in roots {
                if t <= ray_t.min || t >= best_t {
                    continue;
                }
                let hp = ray.at(t);
                let proj = (hp - pa).dot(axis);
                if !(0.0..=seg_len).contains(&proj) {
                    continue;
                }
                let s = proj / seg_len;
                let Some(tangent) = tangents[i].lerp(tangents[i + 1], s).try_normalize() else {
                    continue;
                };
                let radial = hp - (pa + axis * proj);
                let Some(normal) = (radial - radial.dot(tangent) * tangent).try_normalize() else {
                    continue;
                };
                best_t = t;
                best = Some((t, hp, normal, tangent));
            }
        }

        let (t, p, normal, tangent) = best?;
        let mut rec = HitRecord {
            t,
            p,
            tangent,
            ..HitRecord::default()
        };
        rec.set_face_normal(ray, normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// Real roots of `a t^2 + b t + c`, smallest first.
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<[f32; 2]> {
    if a.abs() < 1e-12 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let q = if b < 0.0 { -0.5 * (b - sq) } else { -0.5 * (b + sq) };
    let (r0, r1) = if q == 0.0 {
        (0.0, 0.0)
    } else {
        (q / a, c / q)
    };
    Some(if r0 < r1 { [r0, r1] } else { [r1, r0] })
}
