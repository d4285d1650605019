//! Scene bounding volume hierarchy.
//!
//! Each split picks a random axis, sorts the primitives by bounding-box
//! center on it and halves the list. No cost heuristic is involved. A lone
//! primitive is referenced by both children so every internal node has
//! exactly two; a node's box is the union of its children's boxes.

use crate::hittable::HitRecord;
use crate::scene::{PrimitiveId, Scene};
use lux_math::{Aabb, Interval, Ray};
use rand::Rng;

pub enum BvhChild {
    Primitive(PrimitiveId, Aabb),
    Node(Box<BvhNode>),
}

impl BvhChild {
    fn bounding_box(&self) -> Aabb {
        match self {
            BvhChild::Primitive(_, bbox) => *bbox,
            BvhChild::Node(node) => node.bbox,
        }
    }

    fn hit(&self, scene: &Scene, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            BvhChild::Primitive(id, _) => scene.hit_root(*id, ray, ray_t),
            BvhChild::Node(node) => node.hit(scene, ray, ray_t),
        }
    }
}

pub struct BvhNode {
    pub left: BvhChild,
    pub right: BvhChild,
    pub bbox: Aabb,
}

impl BvhNode {
    /// Build over the scene's root primitives. `None` for an empty scene.
    pub fn build<R: Rng>(scene: &Scene, rng: &mut R) -> Option<Self> {
        let objects: Vec<(PrimitiveId, Aabb)> = scene
            .roots()
            .iter()
            .map(|&id| (id, scene.bounding_box(id)))
            .collect();
        if objects.is_empty() {
            return None;
        }
        let node = Self::build_range(objects, rng);
        log::debug!(
            "Built scene BVH over {} primitives: {} nodes, depth {}",
            scene.roots().len(),
            node.node_count(),
            node.depth()
        );
        Some(node)
    }

    fn build_range<R: Rng>(mut objects: Vec<(PrimitiveId, Aabb)>, rng: &mut R) -> Self {
        let axis = rng.gen_range(0..3);
        let center = |bbox: &Aabb| bbox.axis_interval(axis).min + bbox.axis_interval(axis).max;

        let (left, right) = match objects.len() {
            1 => {
                let (id, bbox) = objects[0];
                (BvhChild::Primitive(id, bbox), BvhChild::Primitive(id, bbox))
            }
            2 => {
                objects.sort_by(|a, b| center(&a.1).total_cmp(&center(&b.1)));
                let (a, b) = (objects[0], objects[1]);
                (BvhChild::Primitive(a.0, a.1), BvhChild::Primitive(b.0, b.1))
            }
            n => {
                objects.sort_by(|a, b| center(&a.1).total_cmp(&center(&b.1)));
                let right = objects.split_off(n / 2);
                (
                    BvhChild::Node(Box::new(Self::build_range(objects, rng))),
                    BvhChild::Node(Box::new(Self::build_range(right, rng))),
                )
            }
        };

        let bbox = Aabb::surrounding(&left.bounding_box(), &right.bounding_box());
        Self { left, right, bbox }
    }

    /// Closest hit in `ray_t`. The right child is searched only up to the
    /// left child's hit.
    pub fn hit(&self, scene: &Scene, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }
        let hit_left = self.left.hit(scene, ray, ray_t);
        let right_t = hit_left.map_or(ray_t, |rec| ray_t.with_max(rec.t));
        self.right.hit(scene, ray, right_t).or(hit_left)
    }

    pub fn node_count(&self) -> usize {
        let count = |child: &BvhChild| match child {
            BvhChild::Node(node) => node.node_count(),
            BvhChild::Primitive(..) => 0,
        };
        1 + count(&self.left) + count(&self.right)
    }

    pub fn depth(&self) -> usize {
        let depth = |child: &BvhChild| match child {
            BvhChild::Node(node) => node.depth(),
            BvhChild::Primitive(..) => 0,
        };
        1 + depth(&self.left).max(depth(&self.right))
    }

    /// Whether every node's box is exactly the union of its children's.
    pub fn bounds_are_tight(&self) -> bool {
        let union = Aabb::surrounding(&self.left.bounding_box(), &self.right.bounding_box());
        let child_ok = |child: &BvhChild| match child {
            BvhChild::Node(node) => node.bounds_are_tight(),
            BvhChild::Primitive(..) => true,
        };
        union == self.bbox && child_ok(&self.left) && child_ok(&self.right)
    }
}
