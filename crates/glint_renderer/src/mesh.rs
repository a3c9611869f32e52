//! Indexed triangle meshes.
//!
//! Faces are index triples into the mesh's vertex list. A mesh can carry its
//! own KD-tree over faces; without one, faces are scanned linearly.

use std::sync::Arc;

use glam::Mat3;
use glint_core::{Intersection, Material};
use glint_math::{dominant_axis, Aabb, Ray, Vec2, Vec3, RAY_EPSILON};

use crate::error::{KdTreeError, MeshError};
use crate::kdtree::{KdTree, KdTreeSettings};

/// Barycentric weights this far below zero still count as inside, so rays
/// through a shared edge hit one of the two faces.
const BARY_TOLERANCE: f32 = 1.0e-6;

/// A triangle mesh with one material.
#[derive(Debug)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<Vec<Vec2>>,
    faces: Vec<[u32; 3]>,
    material: Arc<Material>,
    /// Interpolate per-vertex normals instead of using the face normal
    smooth: bool,
    faces_tree: KdTree,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Vec3>, material: Arc<Material>) -> Self {
        Self {
            vertices,
            normals: None,
            uvs: None,
            faces: Vec::new(),
            material,
            smooth: false,
            faces_tree: KdTree::default(),
        }
    }

    /// Attach per-vertex normals and turn on smooth shading.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals.into_iter().map(Vec3::normalize_or_zero).collect());
        self.smooth = true;
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
    }

    /// Add a face by vertex indices.
    ///
    /// Invalidates the face KD-tree if one was built.
    pub fn add_face(&mut self, a: u32, b: u32, c: u32) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        if [a, b, c].iter().any(|&i| i as usize >= vertex_count) {
            return Err(MeshError::FaceOutOfRange {
                a,
                b,
                c,
                vertex_count,
            });
        }
        self.faces.push([a, b, c]);
        self.faces_tree.clear();
        Ok(())
    }

    /// Check per-vertex attribute counts against the vertex count.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        if self.faces.is_empty() {
            return Err(MeshError::NoFaces);
        }
        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(MeshError::NormalCount {
                    count: normals.len(),
                    vertex_count,
                });
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != vertex_count {
                return Err(MeshError::UvCount {
                    count: uvs.len(),
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Replace vertex normals with the average of adjacent face normals and
    /// turn on smooth shading.
    pub fn generate_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len()];
        for &[a, b, c] in &self.faces {
            let (pa, pb, pc) = (
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            );
            let n = (pa - pc).cross(pb - pc).normalize_or_zero();
            for i in [a, b, c] {
                sums[i as usize] += n;
            }
        }
        self.normals = Some(sums.into_iter().map(Vec3::normalize_or_zero).collect());
        self.smooth = true;
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    fn corners(&self, face: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[face];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    pub fn face_bounds(&self, face: usize) -> Aabb {
        let [a, b, c] = self.corners(face);
        Aabb::from_points(a.min(b).min(c), a.max(b).max(c))
    }

    pub fn bounding_box(&self) -> Aabb {
        (0..self.faces.len()).fold(Aabb::EMPTY, |acc, i| Aabb::surrounding(&acc, &self.face_bounds(i)))
    }

    /// Build the face KD-tree.
    pub fn build_acceleration(&mut self, settings: KdTreeSettings) -> Result<(), KdTreeError> {
        let boxes: Vec<Aabb> = (0..self.faces.len()).map(|i| self.face_bounds(i)).collect();
        self.faces_tree.set_settings(settings);
        self.faces_tree.build(&boxes)
    }

    pub fn clear_acceleration(&mut self) {
        self.faces_tree.clear();
    }

    pub fn is_accelerated(&self) -> bool {
        self.faces_tree.is_built()
    }

    /// Nearest face hit, through the face KD-tree when one is built.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        if self.faces_tree.is_built() {
            return self.faces_tree.intersect(ray, |face| self.intersect_face(face, ray));
        }

        let mut best: Option<Intersection<'_>> = None;
        for face in 0..self.faces.len() {
            if let Some(hit) = self.intersect_face(face, ray) {
                if best.as_ref().map_or(true, |b| hit.t < b.t) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Ray against a single face.
    pub fn intersect_face(&self, face: usize, ray: &Ray) -> Option<Intersection<'_>> {
        let [a, b, c] = self.corners(face);

        let normal = (a - c).cross(b - c);
        let area = normal.length();
        // Collinear corners span no plane
        if area <= f32::EPSILON * (a - c).length() * (b - c).length() {
            return None;
        }
        let normal = normal / area;

        let denom = normal.dot(ray.direction);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let t = normal.dot(a - ray.origin) / denom;
        if t <= RAY_EPSILON || !t.is_finite() {
            return None;
        }
        let p = ray.at(t);

        // Project onto the plane of the two axes the normal is least aligned
        // with and solve for weights that sum to one
        let dropped = dominant_axis(normal);
        let (i, j) = ((dropped + 1) % 3, (dropped + 2) % 3);
        let system = Mat3::from_cols(
            Vec3::new(a[i], a[j], 1.0),
            Vec3::new(b[i], b[j], 1.0),
            Vec3::new(c[i], c[j], 1.0),
        );
        if system.determinant().abs() <= f32::MIN_POSITIVE {
            return None;
        }
        let weights = system.inverse() * Vec3::new(p[i], p[j], 1.0);
        if weights.min_element() < -BARY_TOLERANCE || weights == Vec3::ZERO {
            return None;
        }
        let weights = weights.max(Vec3::ZERO);

        let [ia, ib, ic] = self.faces[face].map(|v| v as usize);
        let vertex_count = self.vertices.len();
        let shading_normal = match (&self.normals, self.smooth) {
            (Some(normals), true) if normals.len() == vertex_count => {
                let blended = weights.x * normals[ia] + weights.y * normals[ib] + weights.z * normals[ic];
                blended.try_normalize().unwrap_or(normal)
            }
            _ => normal,
        };
        let uv = match &self.uvs {
            Some(uvs) if uvs.len() == vertex_count => weights.x * uvs[ia] + weights.y * uvs[ib] + weights.z * uvs[ic],
            _ => Vec2::ZERO,
        };

        Some(
            Intersection::new(t, shading_normal, &self.material)
                .with_bary(weights)
                .with_uv(uv)
                .with_face(face),
        )
    }
}
