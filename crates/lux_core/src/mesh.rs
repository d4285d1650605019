//! Indexed triangle geometry.
//!
//! Loaders live outside the renderer; they hand over a `Mesh` and the
//! triangle-mesh primitive builds its own acceleration structure on top.

use lux_math::{Aabb, Vec3};

#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,

    /// Per-vertex shading normals (optional)
    pub normals: Option<Vec<Vec3>>,

    /// Per-vertex texture coordinates (optional)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices, three per face
    pub indices: Vec<u32>,

    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self::new_with_uvs(positions, indices, normals, None)
    }

    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> Self {
        let bounds = Aabb::enclosing(positions.iter().copied());
        Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        }
    }

    /// Smooth vertex normals from area-weighted face normals (counter-clockwise winding).
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for [i0, i1, i2] in self.triangles() {
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Drops per-vertex attributes whose length disagrees with the vertex count.
    pub fn sanitize_attributes(&mut self) {
        let vertex_count = self.positions.len();
        if self.normals.as_ref().is_some_and(|n| n.len() != vertex_count) {
            log::debug!("Discarding normals that do not match {} vertices", vertex_count);
            self.normals = None;
        }
        if self.uvs.as_ref().is_some_and(|uv| uv.len() != vertex_count) {
            log::debug!("Discarding uvs that do not match {} vertices", vertex_count);
            self.uvs = None;
        }
    }

    /// Vertex index triples, one per face. A trailing partial face is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
    }

    /// Whether every index refers to an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
