// Re-export glam for convenience
pub use glam::*;

// Glint math types
mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::{Ray, RayKind};

/// Minimum accepted ray parameter for a hit.
///
/// Secondary rays start exactly on a surface; anything closer than this is
/// treated as the surface the ray left.
pub const RAY_EPSILON: f32 = 1.0e-4;

/// Index (0=X, 1=Y, 2=Z) of the component with the largest magnitude.
#[inline]
pub fn dominant_axis(v: Vec3) -> usize {
    let a = v.abs();
    if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    }
}
