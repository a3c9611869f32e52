//! Scene container and the scene source seam.

use glint_core::{Camera, Color, Intersection, Light};
use glint_math::{Aabb, Ray};

use crate::error::{KdTreeError, SceneError};
use crate::geometry::Geometry;
use crate::kdtree::KdTreeSettings;

/// Objects, lights, camera and ambient light of one scene.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<Geometry>,
    lights: Vec<Light>,
    camera: Camera,
    ambient: Color,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Default::default()
        }
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    /// Add an object and return its index.
    pub fn add_object(&mut self, object: impl Into<Geometry>) -> usize {
        self.objects.push(object.into());
        self.objects.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn objects(&self) -> &[Geometry] {
        &self.objects
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    /// Reject scenes that would trace garbage.
    pub fn validate(&self) -> Result<(), SceneError> {
        let aspect = self.camera.aspect_ratio();
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(SceneError::BadAspectRatio(aspect));
        }
        for object in &self.objects {
            if let Geometry::Mesh(mesh) = object {
                mesh.validate()?;
            }
        }
        Ok(())
    }

    /// Bounding box of every object, indexed like `objects()`.
    pub fn bounding_boxes(&self) -> Vec<Aabb> {
        self.objects.iter().map(Geometry::bounding_box).collect()
    }

    /// Nearest hit over all objects, tested one by one.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let mut best: Option<Intersection<'_>> = None;
        for index in 0..self.objects.len() {
            if let Some(hit) = self.intersect_object(index, ray) {
                if best.as_ref().map_or(true, |b| hit.t < b.t) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Hit against a single object, tagged with its index.
    pub fn intersect_object(&self, index: usize, ray: &Ray) -> Option<Intersection<'_>> {
        self.objects
            .get(index)?
            .intersect(ray)
            .map(|hit| hit.on_object(index))
    }

    /// Build face KD-trees for every mesh.
    pub fn build_mesh_acceleration(&mut self, settings: KdTreeSettings) -> Result<(), KdTreeError> {
        for mesh in self.objects.iter_mut().filter_map(Geometry::as_mesh_mut) {
            mesh.clear_acceleration();
            mesh.build_acceleration(settings)?;
        }
        Ok(())
    }

    pub fn clear_mesh_acceleration(&mut self) {
        for mesh in self.objects.iter_mut().filter_map(Geometry::as_mesh_mut) {
            mesh.clear_acceleration();
        }
    }
}

/// Closest-hit queries against a world of objects.
///
/// Implemented by `Scene` as a linear scan and by the tracer, which goes
/// through the KD-tree when one is built.
pub trait RayCaster {
    fn closest_hit(&self, ray: &Ray) -> Option<Intersection<'_>>;
}

impl RayCaster for Scene {
    fn closest_hit(&self, ray: &Ray) -> Option<Intersection<'_>> {
        self.intersect(ray)
    }
}

/// Something that produces a scene, e.g. a file parser.
pub trait SceneSource {
    fn load(&self) -> Result<Scene, SceneError>;
}

impl<F> SceneSource for F
where
    F: Fn() -> Result<Scene, SceneError>,
{
    fn load(&self) -> Result<Scene, SceneError> {
        self()
    }
}
