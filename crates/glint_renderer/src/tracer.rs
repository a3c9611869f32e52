//! Recursive Whitted-style tracing.
//!
//! A `Tracer` borrows everything one trace needs: the scene, its KD-tree,
//! an optional environment map and the configuration. It holds no mutable
//! state, so the same tracer can serve every pixel of a frame.

use glint_core::{Color, CubeMap, Intersection};
use glint_math::{Ray, RayKind, Vec3};

use crate::config::TraceConfig;
use crate::kdtree::KdTree;
use crate::scene::{RayCaster, Scene};
use crate::shading;

/// Mirror `d` about the plane with normal `n`.
#[inline]
pub fn reflect_direction(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}

/// Direction of the ray transmitted through a surface with normal `n` and
/// refractive index `index`, or `None` under total internal reflection.
///
/// Rays against the normal enter the material (ratio `1 / index`); rays
/// along it leave (ratio `index`). Only leaving rays are tested for total
/// internal reflection. An entering ray bent past 90 degrees (possible when
/// `index < 1`) keeps its tangent part and gets a unit normal part.
pub fn refract_direction(d: Vec3, n: Vec3, index: f32) -> Option<Vec3> {
    let cos = n.dot(d);
    let entering = cos < 0.0;

    if !entering && 1.0 - index * index * (1.0 - cos * cos) < 0.0 {
        return None;
    }

    let ratio = if entering { 1.0 / index } else { index };
    let tangent = ratio * (d - cos * n);
    let sin2 = tangent.length_squared();
    let cos2 = if sin2 > 1.0 { 1.0 } else { 1.0 - sin2 };

    let axis = if entering { -n } else { n };
    (tangent + axis * cos2.sqrt()).try_normalize()
}

/// Borrowed view of a loaded scene ready for tracing.
#[derive(Clone, Copy)]
pub struct Tracer<'a> {
    scene: &'a Scene,
    kd_tree: Option<&'a KdTree>,
    cube_map: Option<&'a CubeMap>,
    config: &'a TraceConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, config: &'a TraceConfig) -> Self {
        Self {
            scene,
            kd_tree: None,
            cube_map: None,
            config,
        }
    }

    pub fn with_kd_tree(mut self, kd_tree: &'a KdTree) -> Self {
        self.kd_tree = Some(kd_tree);
        self
    }

    pub fn with_cube_map(mut self, cube_map: Option<&'a CubeMap>) -> Self {
        self.cube_map = cube_map;
        self
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn config(&self) -> &'a TraceConfig {
        self.config
    }

    /// Color seen through normalized image coordinates, clamped to [0, 1].
    pub fn trace(&self, x: f32, y: f32) -> Color {
        let ray = self.scene.camera().ray_through(x, y);
        self.trace_ray(&ray, Color::ONE, self.config.max_depth)
            .clamp(Color::ZERO, Color::ONE)
    }

    /// Unclamped radiance along `ray`.
    ///
    /// `depth` counts the remaining bounces; below zero only local shading
    /// is returned. `throughput` is the product of the reflection and
    /// transmission weights along the path so far.
    pub fn trace_ray(&self, ray: &Ray, throughput: Color, depth: i32) -> Color {
        let Some(hit) = self.closest_hit(ray) else {
            return self.background(ray);
        };

        let local = shading::shade(self, self.scene, self.config, ray, &hit);
        if depth < 0 {
            return local;
        }

        let material = hit.material;
        let point = hit.point(ray);
        let mut color = local;

        let kr = material.kr(&hit);
        if kr != Color::ZERO {
            let reflected = Ray::normalized(point, reflect_direction(ray.direction, hit.normal), RayKind::Reflection);
            color += kr * self.trace_ray(&reflected, throughput * kr, depth - 1);
        }

        let kt = material.kt(&hit);
        if kt.max_element() > 0.0 {
            if let Some(direction) = refract_direction(ray.direction, hit.normal, material.index(&hit)) {
                let refracted = Ray::new(point, direction, RayKind::Refraction);
                color += kt * self.trace_ray(&refracted, throughput * kt, depth - 1);
            }
        }

        color
    }

    /// Nearest hit over the scene, through the KD-tree when it is enabled
    /// and built.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'a>> {
        let scene = self.scene;
        if self.config.acceleration {
            if let Some(tree) = self.kd_tree.filter(|tree| tree.is_built()) {
                let hit = tree.intersect(ray, |index| scene.intersect_object(index, ray));
                if hit.is_some() || !self.config.linear_fallback {
                    return hit;
                }
            }
        }
        scene.intersect(ray)
    }

    fn background(&self, ray: &Ray) -> Color {
        match self.cube_map {
            Some(map) if self.config.use_cube_map => map.sample(ray.direction),
            _ => Color::ZERO,
        }
    }
}

impl RayCaster for Tracer<'_> {
    fn closest_hit(&self, ray: &Ray) -> Option<Intersection<'_>> {
        self.intersect(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::Sphere;
    use glint_core::{Attenuation, Camera, Light, Material};
    use std::sync::Arc;

    fn lit_scene(material: Material) -> Scene {
        let camera = Camera::new().with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let mut scene = Scene::new(camera);
        scene.add_object(Sphere::new(Vec3::ZERO, 1.0, Arc::new(material)));
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, 5.0), Color::ONE, Attenuation::NONE));
        scene
    }

    #[test]
    fn test_reflect_direction() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect_direction(d, Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_refract_matched_index_goes_straight() {
        let d = Vec3::new(0.3, -1.0, 0.2).normalize();
        let t = refract_direction(d, Vec3::Y, 1.0).unwrap();
        assert!((t - d).length() < 1e-5);

        // Leaving: direction along the normal
        let out = Vec3::new(0.3, 1.0, 0.2).normalize();
        let t = refract_direction(out, Vec3::Y, 1.0).unwrap();
        assert!((t - out).length() < 1e-5);
    }

    #[test]
    fn test_refract_entering_bends_toward_normal() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let t = refract_direction(d, Vec3::Y, 1.5).unwrap();
        // Snell: sin(t) = sin(45 deg) / 1.5
        let expected_sin = std::f32::consts::FRAC_1_SQRT_2 / 1.5;
        assert!((t.x - expected_sin).abs() < 1e-5);
        assert!(t.y < 0.0);
        assert!((t.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Inside glass, 60 degrees off the normal is past the ~41.8 degree
        // critical angle
        let (sin, cos) = 60f32.to_radians().sin_cos();
        let d = Vec3::new(sin, cos, 0.0);
        assert!(refract_direction(d, Vec3::Y, 1.5).is_none());

        // 30 degrees still escapes
        let (sin, cos) = 30f32.to_radians().sin_cos();
        let d = Vec3::new(sin, cos, 0.0);
        assert!(refract_direction(d, Vec3::Y, 1.5).is_some());
    }

    #[test]
    fn test_entering_thinner_medium_still_refracts() {
        // Ratio 2 bends a 60 degree ray past grazing; it continues downward
        let (sin, cos) = 60f32.to_radians().sin_cos();
        let d = Vec3::new(sin, -cos, 0.0);
        let t = refract_direction(d, Vec3::Y, 0.5).expect("entering rays always refract");
        assert!(t.y < 0.0);
        assert!((t - Vec3::new(2.0 * sin, -1.0, 0.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_miss_is_black_without_cube_map() {
        let scene = lit_scene(Material::diffuse(Color::ONE));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);
        // Corner of the frame looks past the sphere
        assert_eq!(tracer.trace(0.0, 0.0), Color::ZERO);
    }

    #[test]
    fn test_miss_samples_cube_map() {
        let scene = lit_scene(Material::diffuse(Color::ONE));
        let sky = CubeMap::from_colors([Color::new(0.1, 0.2, 0.3); 6]);
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config).with_cube_map(Some(&sky));
        assert!((tracer.trace(0.0, 0.0) - Color::new(0.1, 0.2, 0.3)).length() < 1e-5);

        let config = config.with_cube_map(false);
        let tracer = Tracer::new(&scene, &config).with_cube_map(Some(&sky));
        assert_eq!(tracer.trace(0.0, 0.0), Color::ZERO);
    }

    #[test]
    fn test_negative_depth_is_local_only() {
        let material = Material::diffuse(Color::splat(0.3)).with_reflective(Color::ONE);
        let scene = lit_scene(material);
        let sky = CubeMap::from_colors([Color::ONE; 6]);
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config).with_cube_map(Some(&sky));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, RayKind::Visibility);
        let local = tracer.trace_ray(&ray, Color::ONE, -1);
        assert!((local - Color::splat(0.3)).length() < 1e-4);

        // One bounce adds the sky seen in the mirror
        let bounced = tracer.trace_ray(&ray, Color::ONE, 0);
        assert!((bounced - Color::splat(1.3)).length() < 1e-4);
    }

    #[test]
    fn test_glass_sphere_passes_background() {
        let scene = lit_scene(Material::glass(1.5));
        let sky = CubeMap::from_colors([Color::new(0.0, 0.5, 0.0); 6]);
        let config = TraceConfig::default().with_max_depth(4);
        let tracer = Tracer::new(&scene, &config).with_cube_map(Some(&sky));

        // Straight through the center: in, out, then the sky
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, RayKind::Visibility);
        let color = tracer.trace_ray(&ray, Color::ONE, config.max_depth);
        assert!((color - Color::new(0.0, 0.5, 0.0)).length() < 1e-3, "{color:?}");
    }
}
