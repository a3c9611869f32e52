//! Intersection record produced by ray/primitive tests.

use crate::Material;
use glint_math::{Ray, Vec2, Vec3};

/// Record of a ray-object intersection.
///
/// Short-lived: it borrows the material of the primitive that was hit and
/// lives no longer than the trace call that produced it.
#[derive(Clone, Copy, Debug)]
pub struct Intersection<'a> {
    /// Ray parameter of the hit, always greater than `RAY_EPSILON`
    pub t: f32,
    /// Unit surface normal (outward for spheres, winding order for faces)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a Material,
    /// Barycentric weights for triangle hits, zero otherwise
    pub bary: Vec3,
    /// Texture coordinates
    pub uv: Vec2,
    /// Index of the scene object that was hit
    pub object: usize,
    /// Face index inside a mesh
    pub face: Option<usize>,
}

impl<'a> Intersection<'a> {
    pub fn new(t: f32, normal: Vec3, material: &'a Material) -> Self {
        Self {
            t,
            normal,
            material,
            bary: Vec3::ZERO,
            uv: Vec2::ZERO,
            object: 0,
            face: None,
        }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_bary(mut self, bary: Vec3) -> Self {
        self.bary = bary;
        self
    }

    pub fn with_face(mut self, face: usize) -> Self {
        self.face = Some(face);
        self
    }

    /// Tag the record with the scene object index.
    pub fn on_object(mut self, object: usize) -> Self {
        self.object = object;
        self
    }

    /// World-space hit point along `ray`.
    #[inline]
    pub fn point(&self, ray: &Ray) -> Vec3 {
        ray.at(self.t)
    }
}
