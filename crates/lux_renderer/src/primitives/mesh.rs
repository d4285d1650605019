//! Triangle meshes with their own acceleration structure.

use super::mesh_bvh::MeshBvhNode;
use crate::error::{RenderError, RenderResult};
use crate::hittable::{HitRecord, Hittable};
use lux_core::Mesh;
use lux_math::{Aabb, Interval, Ray, Vec2};

pub struct TriangleMesh {
    mesh: Mesh,
    faces: Vec<[usize; 3]>,
    bvh: MeshBvhNode,
}

impl TriangleMesh {
    /// Validate the index buffer and build the triangle BVH.
    pub fn new(mut mesh: Mesh) -> RenderResult<Self> {
        if !mesh.indices_in_range() {
            return Err(RenderError::InvalidPrimitive {
                primitive: usize::MAX,
                reason: "mesh index out of range".to_string(),
            });
        }
        mesh.sanitize_attributes();
        let faces: Vec<[usize; 3]> = mesh.triangles().collect();
        let bvh = MeshBvhNode::build(&mesh.positions, &faces);
        log::debug!(
            "Built mesh BVH: {} triangles, depth {}",
            faces.len(),
            bvh.depth()
        );
        Ok(Self { mesh, faces, bvh })
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}

impl Hittable for TriangleMesh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let hit = self.bvh.hit(&self.mesh.positions, &self.faces, ray, ray_t)?;
        let [i0, i1, i2] = self.faces[hit.triangle];
        let b0 = 1.0 - hit.b1 - hit.b2;
        let positions = &self.mesh.positions;

        let geometric = (positions[i1] - positions[i0])
            .cross(positions[i2] - positions[i0])
            .normalize();

        let mut rec = HitRecord {
            t: hit.t,
            p: ray.at(hit.t),
            uv: Vec2::new(hit.b1, hit.b2),
            ..HitRecord::default()
        };
        rec.set_face_normal(ray, geometric);

        if let Some(uvs) = &self.mesh.uvs {
            let uv = |i: usize| Vec2::from_array(uvs[i]);
            rec.uv = b0 * uv(i0) + hit.b1 * uv(i1) + hit.b2 * uv(i2);
        }

        // Shading normals are flipped onto the side the geometric normal faces.
        if let Some(normals) = &self.mesh.normals {
            let shading = (b0 * normals[i0] + hit.b1 * normals[i1] + hit.b2 * normals[i2])
                .try_normalize();
            if let Some(shading) = shading {
                rec.normal = if shading.dot(rec.normal) < 0.0 {
                    -shading
                } else {
                    shading
                };
            }
        }

        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }
}
