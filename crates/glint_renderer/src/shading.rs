//! Local illumination at a hit point.
//!
//! Phong shading with shadow rays, or a cool-to-warm stylized model that
//! ignores shadows. Ambient and emissive terms are added once on top of the
//! per-light sum.

use glint_core::{Color, Intersection, Light};
use glint_math::{Ray, RayKind, Vec3};

use crate::config::TraceConfig;
use crate::scene::{RayCaster, Scene};

const COOL_TONE: Color = Color::new(0.0, 0.0, 0.4);
const WARM_TONE: Color = Color::new(0.4, 0.4, 0.0);
const COOL_DIFFUSE: f32 = 0.2;
const WARM_DIFFUSE: f32 = 0.6;

/// Radiance leaving `hit` back along `ray`, before any recursion.
pub fn shade<W>(world: &W, scene: &Scene, config: &TraceConfig, ray: &Ray, hit: &Intersection<'_>) -> Color
where
    W: RayCaster + ?Sized,
{
    let material = hit.material;
    let point = hit.point(ray);
    let normal = hit.normal;
    let view = -ray.direction;

    // A bump map replaces the normal in the Lambertian term only
    let lambert_normal = material
        .bump(hit, config.bump_scale)
        .map(|p| (2.0 * p - Vec3::ONE).normalize_or_zero())
        .unwrap_or(normal);

    let kd = material.kd(hit);
    let ks = material.ks(hit);
    let shininess = material.shininess(hit);

    let mut intensity = Color::ZERO;
    for light in scene.lights() {
        let to_light = light.direction_from(point);
        let n_dot_l = lambert_normal.dot(to_light);

        let contribution = if config.stylized {
            let cool = (1.0 - n_dot_l) / 2.0;
            let warm = 1.0 - cool;
            cool * (COOL_TONE + COOL_DIFFUSE * kd) + warm * (WARM_TONE + WARM_DIFFUSE * kd)
        } else {
            let mirrored = (2.0 * to_light.dot(normal) * normal - to_light).normalize_or_zero();
            let specular = view.dot(mirrored).max(0.0).powf(shininess);
            let light_color = light.color();
            shadow_attenuation(world, light, point)
                * (kd * light_color * n_dot_l.max(0.0) + ks * light_color * specular)
        };

        intensity += contribution * light.distance_attenuation(point);
    }

    intensity + material.ka(hit) * scene.ambient() + material.ke(hit)
}

/// Fraction of `light` reaching `point`.
///
/// White when nothing is in the way, black behind an opaque occluder. A
/// transmissive occluder passes its `kt`, faded by the distance light
/// travels through it to the next surface.
pub fn shadow_attenuation<W>(world: &W, light: &Light, point: Vec3) -> Color
where
    W: RayCaster + ?Sized,
{
    let shadow_ray = Ray::new(point, light.direction_from(point), RayKind::Shadow);
    let Some(blocker) = world.closest_hit(&shadow_ray) else {
        return Color::ONE;
    };
    if let Some(distance) = light.distance_from(point) {
        if blocker.t >= distance {
            return Color::ONE;
        }
    }

    let kt = blocker.material.kt(&blocker);
    if kt.max_element() <= 0.0 {
        return Color::ZERO;
    }

    let entry = blocker.point(&shadow_ray);
    let onward = Ray::new(entry, light.direction_from(entry), RayKind::Shadow);
    let gap = world.closest_hit(&onward).map_or(1.0, |hit| hit.t);
    kt * light.shadow_falloff().factor(gap)
}
