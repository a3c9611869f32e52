use crate::Vec3;

/// What a ray is being traced for.
///
/// Primary rays leave the camera as `Visibility`; the tracer spawns the
/// other kinds at hit points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RayKind {
    Visibility,
    Shadow,
    Reflection,
    Refraction,
}

/// A ray in 3D space with origin, direction, and kind.
///
/// Rays represent a half-line starting at `origin` and traveling in
/// `direction`. Directions produced by the camera and the tracer are unit
/// length, but intersection code does not rely on it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub kind: RayKind,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3, kind: RayKind) -> Self {
        Self {
            origin,
            direction,
            kind,
        }
    }

    /// Create a ray with a normalized copy of `direction`.
    pub fn normalized(origin: Vec3, direction: Vec3, kind: RayKind) -> Self {
        Self::new(origin, direction.normalize(), kind)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn kind(&self) -> RayKind {
        self.kind
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
