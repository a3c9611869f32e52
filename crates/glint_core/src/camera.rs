//! Pinhole camera for primary ray generation.

use glint_math::{Ray, RayKind, Vec3};

/// Camera mapping normalized image coordinates to primary rays.
///
/// (0, 0) is the bottom-left corner of the image and (1, 1) the top-right.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    fov: f32,
    aspect_ratio: f32,

    // Cached basis, refreshed by update()
    look: Vec3,
    u: Vec3,
    v: Vec3,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 45 degree field of view.
    pub fn new() -> Self {
        let mut camera = Self {
            eye: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            fov: 45.0,
            aspect_ratio: 1.0,
            look: Vec3::NEG_Z,
            u: Vec3::X,
            v: Vec3::Y,
        };
        camera.update();
        camera
    }

    /// Set camera position.
    pub fn with_position(mut self, eye: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.eye = eye;
        self.look_at = look_at;
        self.vup = vup;
        self.update();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self.update();
        self
    }

    /// Set width / height of the image plane.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.update();
        self
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    fn update(&mut self) {
        let normalized_height = 2.0 * (self.fov.to_radians() / 2.0).tan();

        self.look = (self.look_at - self.eye).normalize();
        let right = self.look.cross(self.vup).normalize();
        let up = right.cross(self.look);

        self.u = right * normalized_height * self.aspect_ratio;
        self.v = up * normalized_height;
    }

    /// Visibility ray through normalized image coordinates (x, y).
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let dir = self.look + (x - 0.5) * self.u + (y - 0.5) * self.v;
        Ray::normalized(self.eye, dir, RayKind::Visibility)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
