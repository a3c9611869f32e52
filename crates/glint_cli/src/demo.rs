//! Built-in demo scene.

use std::sync::Arc;

use glint_core::{Attenuation, Camera, Color, CubeMap, Light, Material, Texture};
use glint_math::{Vec2, Vec3};
use glint_renderer::{Scene, SceneError, Sphere, TriangleMesh};

const CHECKS: u32 = 8;

fn checker(size: u32, light: Color, dark: Color) -> Texture {
    let cell = (size / CHECKS).max(1);
    Texture::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            light
        } else {
            dark
        }
    })
}

fn floor(material: Arc<Material>) -> Result<TriangleMesh, SceneError> {
    let extent = 8.0;
    let mut mesh = TriangleMesh::new(
        vec![
            Vec3::new(-extent, 0.0, -extent),
            Vec3::new(extent, 0.0, -extent),
            Vec3::new(extent, 0.0, extent),
            Vec3::new(-extent, 0.0, extent),
        ],
        material,
    )
    .with_uvs(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ]);
    mesh.add_face(0, 2, 1)?;
    mesh.add_face(0, 3, 2)?;
    Ok(mesh)
}

/// Smooth-shaded square pyramid.
fn pyramid(base: Vec3, size: f32, material: Arc<Material>) -> Result<TriangleMesh, SceneError> {
    let h = 0.5 * size;
    let mut mesh = TriangleMesh::new(
        vec![
            base + Vec3::new(-h, 0.0, -h),
            base + Vec3::new(h, 0.0, -h),
            base + Vec3::new(h, 0.0, h),
            base + Vec3::new(-h, 0.0, h),
            base + Vec3::new(0.0, size, 0.0),
        ],
        material,
    );
    for (a, b) in [(3, 2), (2, 1), (1, 0), (0, 3)] {
        mesh.add_face(a, b, 4)?;
    }
    Ok(mesh)
}

pub fn scene(aspect_ratio: f32) -> Result<Scene, SceneError> {
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 2.0, 7.0), Vec3::new(0.0, 0.7, 0.0), Vec3::Y)
        .with_fov(45.0)
        .with_aspect_ratio(aspect_ratio);
    let mut scene = Scene::new(camera).with_ambient(Color::splat(0.08));

    let checks = Arc::new(checker(256, Color::splat(0.8), Color::new(0.15, 0.15, 0.2)));
    let floor_material = Material::diffuse(Color::ONE)
        .with_diffuse(checks)
        .with_ambient(Color::splat(0.5))
        .with_reflective(Color::splat(0.15));
    scene.add_object(floor(Arc::new(floor_material))?);

    let red = Material::diffuse(Color::new(0.8, 0.15, 0.1))
        .with_ambient(Color::ONE)
        .with_specular(Color::splat(0.5), 48.0);
    scene.add_object(Sphere::new(Vec3::new(-1.8, 0.8, 0.0), 0.8, Arc::new(red)));
    scene.add_object(Sphere::new(Vec3::new(0.0, 1.0, 0.8), 1.0, Arc::new(Material::glass(1.5))));
    scene.add_object(Sphere::new(Vec3::new(1.9, 0.7, -0.4), 0.7, Arc::new(Material::mirror())));

    let gold = Material::diffuse(Color::new(0.7, 0.55, 0.2))
        .with_ambient(Color::ONE)
        .with_specular(Color::new(0.9, 0.8, 0.5), 24.0)
        .with_reflective(Color::splat(0.2));
    let mut tent = pyramid(Vec3::new(0.3, 0.0, -2.5), 1.6, Arc::new(gold))?;
    tent.generate_normals();
    scene.add_object(tent);

    scene.add_light(Light::point(
        Vec3::new(4.0, 6.0, 5.0),
        Color::ONE,
        Attenuation::new(1.0, 0.02, 0.004),
    ));
    scene.add_light(Light::directional(Vec3::new(-1.0, -1.5, -0.8), Color::splat(0.35)));
    Ok(scene)
}

/// Vertical gradient from horizon to zenith on the side faces.
pub fn sky() -> CubeMap {
    let horizon = Color::new(0.85, 0.9, 1.0);
    let zenith = Color::new(0.25, 0.45, 0.85);
    let ground = Color::new(0.3, 0.28, 0.25);
    let size = 32;
    let side = || {
        Texture::from_fn(size, size, |_, y| {
            // Row 0 is the top of a side face
            let t = y as f32 / (size - 1) as f32;
            zenith.lerp(horizon, t)
        })
    };
    let flat = |color: Color| Texture::from_fn(size, size, |_, _| color);
    let faces = [side(), side(), flat(zenith), flat(ground), side(), side()];
    CubeMap::new(faces).unwrap_or_else(|_| CubeMap::from_colors([horizon; 6]))
}
