//! Closed set of scene objects.

use glint_core::Intersection;
use glint_math::{Aabb, Ray};

use crate::mesh::TriangleMesh;
use crate::sphere::Sphere;

/// Anything that can be placed in a scene.
#[derive(Debug)]
pub enum Geometry {
    Sphere(Sphere),
    Mesh(TriangleMesh),
}

impl Geometry {
    /// Nearest hit with t > `RAY_EPSILON`.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        match self {
            Geometry::Sphere(sphere) => sphere.intersect(ray),
            Geometry::Mesh(mesh) => mesh.intersect(ray),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Geometry::Sphere(sphere) => sphere.bounding_box(),
            Geometry::Mesh(mesh) => mesh.bounding_box(),
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut TriangleMesh> {
        match self {
            Geometry::Mesh(mesh) => Some(mesh),
            Geometry::Sphere(_) => None,
        }
    }
}

impl From<Sphere> for Geometry {
    fn from(sphere: Sphere) -> Self {
        Geometry::Sphere(sphere)
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(mesh: TriangleMesh) -> Self {
        Geometry::Mesh(mesh)
    }
}
