//! Per-mesh triangle BVH.
//!
//! Built once per mesh, independently of the scene BVH: split on the axis of
//! greatest extent at the triangle-centroid median.

use lux_math::{Aabb, Interval, Ray, Vec3};

/// Maximum triangles per leaf node.
const LEAF_MAX_SIZE: usize = 4;

pub enum MeshBvhNode {
    Branch {
        left: Box<MeshBvhNode>,
        right: Box<MeshBvhNode>,
        bbox: Aabb,
    },
    Leaf {
        triangles: Vec<usize>,
        bbox: Aabb,
    },
    Empty,
}

/// A triangle hit in barycentric terms; the mesh turns it into a record.
#[derive(Clone, Copy, Debug)]
pub struct TriangleHit {
    pub triangle: usize,
    pub t: f32,
    pub b1: f32,
    pub b2: f32,
}

impl MeshBvhNode {
    pub fn build(positions: &[Vec3], faces: &[[usize; 3]]) -> Self {
        if faces.is_empty() {
            return MeshBvhNode::Empty;
        }
        let ids: Vec<usize> = (0..faces.len()).collect();
        Self::build_range(positions, faces, ids)
    }

    fn build_range(positions: &[Vec3], faces: &[[usize; 3]], mut ids: Vec<usize>) -> Self {
        let bbox = Aabb::enclosing(
            ids.iter()
                .flat_map(|&id| faces[id].iter().map(|&v| positions[v])),
        );

        if ids.len() <= LEAF_MAX_SIZE {
            return MeshBvhNode::Leaf {
                triangles: ids,
                bbox,
            };
        }

        let axis = bbox.longest_axis();
        let centroid = |id: usize| {
            let [a, b, c] = faces[id];
            (positions[a] + positions[b] + positions[c]) / 3.0
        };
        ids.sort_unstable_by(|&a, &b| {
            centroid(a)[axis]
                .partial_cmp(&centroid(b)[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let right_ids = ids.split_off(ids.len() / 2);
        MeshBvhNode::Branch {
            left: Box::new(Self::build_range(positions, faces, ids)),
            right: Box::new(Self::build_range(positions, faces, right_ids)),
            bbox,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            MeshBvhNode::Empty => Aabb::EMPTY,
            MeshBvhNode::Leaf { bbox, .. } | MeshBvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    pub fn hit(
        &self,
        positions: &[Vec3],
        faces: &[[usize; 3]],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<TriangleHit> {
        match self {
            MeshBvhNode::Empty => None,
            MeshBvhNode::Leaf { triangles, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                let mut closest = None;
                let mut interval = ray_t;
                for &id in triangles {
                    if let Some(hit) = hit_triangle(positions, faces[id], id, ray, interval) {
                        interval = interval.with_max(hit.t);
                        closest = Some(hit);
                    }
                }
                closest
            }
            MeshBvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                let hit_left = left.hit(positions, faces, ray, ray_t);
                let right_t = hit_left.map_or(ray_t, |h| ray_t.with_max(h.t));
                right.hit(positions, faces, ray, right_t).or(hit_left)
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            MeshBvhNode::Empty | MeshBvhNode::Leaf { .. } => 1,
            MeshBvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Möller-Trumbore intersection.
pub fn hit_triangle(
    positions: &[Vec3],
    face: [usize; 3],
    id: usize,
    ray: &Ray,
    ray_t: Interval,
) -> Option<TriangleHit> {
    let p0 = positions[face[0]];
    let edge1 = positions[face[1]] - p0;
    let edge2 = positions[face[2]] - p0;

    let h = ray.direction().cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin() - p0;
    let b1 = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }

    let q = s.cross(edge1);
    let b2 = ray.direction().dot(q) * inv_det;
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if !ray_t.surrounds(t) {
        return None;
    }
    Some(TriangleHit {
        triangle: id,
        t,
        b1,
        b2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn grid(n: usize) -> (Vec<Vec3>, Vec<[usize; 3]>) {
        let mut positions = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                positions.push(Vec3::new(i as f32, j as f32, (i + j) as f32 * 0.1));
            }
        }
        let mut faces = Vec::new();
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let a = j * row + i;
                faces.push([a, a + 1, a + row + 1]);
                faces.push([a, a + row + 1, a + row]);
            }
        }
        (positions, faces)
    }

    #[test]
    fn test_leaf_threshold() {
        let (positions, faces) = grid(1);
        let bvh = MeshBvhNode::build(&positions, &faces);
        assert!(matches!(bvh, MeshBvhNode::Leaf { .. }));

        let (positions, faces) = grid(8);
        let bvh = MeshBvhNode::build(&positions, &faces);
        assert!(matches!(bvh, MeshBvhNode::Branch { .. }));
        assert!(bvh.depth() > 3);
    }

    #[test]
    fn test_matches_linear_scan() {
        let (positions, faces) = grid(8);
        let bvh = MeshBvhNode::build(&positions, &faces);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let origin = Vec3::new(rng.gen_range(-1.0..9.0), rng.gen_range(-1.0..9.0), 10.0);
            let target = Vec3::new(rng.gen_range(0.0..8.0), rng.gen_range(0.0..8.0), 0.0);
            let ray = Ray::new(origin, target - origin);
            let interval = Interval::new(0.001, f32::INFINITY);

            let linear = faces
                .iter()
                .enumerate()
                .filter_map(|(id, &f)| hit_triangle(&positions, f, id, &ray, interval))
                .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap());
            let accelerated = bvh.hit(&positions, &faces, &ray, interval);

            match (linear, accelerated) {
                (None, None) => {}
                (Some(a), Some(b)) => assert!((a.t - b.t).abs() < 1e-4),
                (a, b) => panic!("mismatch: {:?} vs {:?}", a, b),
            }
        }
    }

    #[test]
    fn test_parallel_ray_misses() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let ray = Ray::new(Vec3::new(0.2, 0.2, 0.0), Vec3::X);
        assert!(hit_triangle(&positions, [0, 1, 2], 0, &ray, Interval::new(0.0, 10.0)).is_none());
    }
}
