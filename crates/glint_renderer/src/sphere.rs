//! Sphere primitive for ray tracing.

use std::f32::consts::PI;
use std::sync::Arc;

use glint_core::{Intersection, Material};
use glint_math::{Aabb, Ray, Vec2, Vec3, RAY_EPSILON};

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Spherical UV mapping of a unit outward normal.
    fn sphere_uv(n: Vec3) -> Vec2 {
        let u = 0.5 + (-n.z).atan2(-n.x) / (2.0 * PI);
        let v = 0.5 - (-n.y).clamp(-1.0, 1.0).asin() / PI;
        Vec2::new(u, v)
    }

    /// Nearest hit with t > `RAY_EPSILON`.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        if self.radius <= 0.0 {
            return None;
        }

        // Solve |o + t d - c|^2 = r^2 with o relative to the center
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        if a <= f32::EPSILON {
            return None;
        }
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        let far = (-half_b + sqrtd) / a;
        if far <= RAY_EPSILON {
            return None;
        }
        let near = (-half_b - sqrtd) / a;
        let t = if near > RAY_EPSILON { near } else { far };

        let normal = ((ray.at(t) - self.center) / self.radius).normalize();
        Some(Intersection::new(t, normal, &self.material).with_uv(Self::sphere_uv(normal)))
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
