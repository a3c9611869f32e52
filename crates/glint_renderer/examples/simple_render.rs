//! Simple Whitted tracer example.
//!
//! Renders three spheres over a mirror floor and saves to PPM format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use glint_renderer::{
    Attenuation, Camera, Color, Light, Material, RayTracer, Scene, SceneError, Sphere, TraceConfig, TriangleMesh,
    Vec3,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let (width, height) = (320, 180);
    let config = TraceConfig::default().with_max_depth(4).with_samples(2);

    let mut tracer = RayTracer::new(config)?;
    tracer.load_scene(&|| build_scene(width as f32 / height as f32))?;
    tracer.trace_setup(width, height);
    let status = tracer.render(&AtomicBool::new(false), |_, _| {});
    println!("Render finished: {:?}", status);

    let filename = "output.ppm";
    let (bytes, w, h) = tracer.buffer();
    save_ppm(bytes, w, h, filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene(aspect_ratio: f32) -> Result<Scene, SceneError> {
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 1.5, 6.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y)
        .with_fov(40.0)
        .with_aspect_ratio(aspect_ratio);
    let mut scene = Scene::new(camera).with_ambient(Color::splat(0.05));

    let red = Material::diffuse(Color::new(0.8, 0.2, 0.2))
        .with_ambient(Color::ONE)
        .with_specular(Color::splat(0.4), 32.0);
    scene.add_object(Sphere::new(Vec3::new(-1.4, 0.7, 0.0), 0.7, Arc::new(red)));
    scene.add_object(Sphere::new(Vec3::new(0.0, 0.8, -0.8), 0.8, Arc::new(Material::glass(1.5))));
    scene.add_object(Sphere::new(Vec3::new(1.4, 0.6, 0.3), 0.6, Arc::new(Material::mirror())));

    let floor = Material::diffuse(Color::splat(0.6))
        .with_ambient(Color::ONE)
        .with_reflective(Color::splat(0.3));
    let mut plane = TriangleMesh::new(
        vec![
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(-10.0, 0.0, 10.0),
        ],
        Arc::new(floor),
    );
    plane.add_face(0, 2, 1)?;
    plane.add_face(0, 3, 2)?;
    scene.add_object(plane);

    scene.add_light(Light::point(Vec3::new(3.0, 6.0, 4.0), Color::ONE, Attenuation::new(1.0, 0.01, 0.002)));
    scene.add_light(Light::directional(Vec3::new(-1.0, -1.0, -0.5), Color::splat(0.3)));
    Ok(scene)
}

/// Save RGB bytes (bottom row first) as PPM.
fn save_ppm(bytes: &[u8], width: u32, height: u32, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", width, height)?;
    writeln!(writer, "255")?;

    for j in (0..height as usize).rev() {
        for i in 0..width as usize {
            let at = (i + j * width as usize) * 3;
            writeln!(writer, "{} {} {}", bytes[at], bytes[at + 1], bytes[at + 2])?;
        }
    }

    Ok(())
}
