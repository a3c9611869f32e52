//! Tracing session and framebuffer.
//!
//! `RayTracer` owns the loaded scene, its KD-tree, an optional cube map and
//! the output image. A render walks the image bottom row first, polls a stop
//! flag once per row, and hands each finished row to a callback.
//! `render_parallel` spreads rows over the rayon thread pool instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use glint_core::{Color, CubeMap};
use glint_math::{Aabb, Ray};
use rayon::prelude::*;

use crate::config::TraceConfig;
use crate::error::{KdTreeError, TraceError};
use crate::kdtree::KdTree;
use crate::sampling::{PixelSample, PixelSampler};
use crate::scene::{Scene, SceneSource};
use crate::tracer::Tracer;

/// Convert a color channel to a byte; values outside [0, 1] saturate.
#[inline]
pub fn channel_to_byte(c: f32) -> u8 {
    (255.0 * c.clamp(0.0, 1.0)) as u8
}

/// 8-bit RGB image, row 0 at the bottom.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Resize if needed and clear to black.
    pub fn reset(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        } else {
            self.pixels.fill(0);
        }
    }

    fn offset(&self, i: u32, j: u32) -> Option<usize> {
        (i < self.width && j < self.height).then(|| (i as usize + j as usize * self.width as usize) * 3)
    }

    /// Store a color; writes outside the image are ignored.
    pub fn set_pixel(&mut self, i: u32, j: u32, color: Color) {
        if let Some(at) = self.offset(i, j) {
            self.pixels[at] = channel_to_byte(color.x);
            self.pixels[at + 1] = channel_to_byte(color.y);
            self.pixels[at + 2] = channel_to_byte(color.z);
        }
    }

    pub fn pixel(&self, i: u32, j: u32) -> Option<[u8; 3]> {
        let at = self.offset(i, j)?;
        Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]])
    }

    /// Raw RGB bytes, `(i + j * width) * 3` per pixel.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// How a call to `render` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Every row was traced.
    Complete,
    /// The stop flag was raised; `rows` rows were finished.
    Stopped { rows: u32 },
    /// No scene is loaded or the framebuffer is empty.
    NotReady,
}

/// A tracing session.
#[derive(Debug)]
pub struct RayTracer {
    config: TraceConfig,
    scene: Option<Scene>,
    kd_tree: KdTree,
    cube_map: Option<CubeMap>,
    buffer: FrameBuffer,
    sampler: PixelSampler,
}

impl RayTracer {
    pub fn new(config: TraceConfig) -> Result<Self, TraceError> {
        config.validate()?;
        Ok(Self {
            kd_tree: KdTree::new(config.kd_settings()),
            sampler: PixelSampler::from_config(&config),
            config,
            scene: None,
            cube_map: None,
            buffer: FrameBuffer::default(),
        })
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn kd_tree(&self) -> &KdTree {
        &self.kd_tree
    }

    /// Load a scene from `source` and build its acceleration structures.
    ///
    /// If the source fails, the previously loaded scene stays in place.
    pub fn load_scene<S>(&mut self, source: &S) -> Result<(), TraceError>
    where
        S: SceneSource + ?Sized,
    {
        let start = Instant::now();
        let scene = match source.load() {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("Scene load failed, keeping the previous scene: {}", e);
                return Err(e.into());
            }
        };
        self.set_scene(scene)?;
        log::info!("Scene loaded in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Install an already built scene.
    pub fn set_scene(&mut self, mut scene: Scene) -> Result<(), TraceError> {
        if let Err(e) = scene.validate() {
            log::error!("Rejected scene, keeping the previous scene: {}", e);
            return Err(e.into());
        }

        if self.config.acceleration {
            let settings = self.config.kd_settings();
            scene.build_mesh_acceleration(settings)?;

            let boxes = scene.bounding_boxes();
            self.kd_tree.set_settings(settings);
            if let Err(e) = self.build_kd_tree(&boxes) {
                // The old tree is gone, so the old scene cannot be traced
                self.scene = None;
                return Err(e.into());
            }
        } else {
            scene.clear_mesh_acceleration();
            self.kd_tree.clear();
        }

        log::info!(
            "Scene ready: {} objects, {} lights",
            scene.objects().len(),
            scene.lights().len()
        );
        self.scene = Some(scene);
        Ok(())
    }

    /// Build the scene tree, tearing down a previous tree and retrying once.
    fn build_kd_tree(&mut self, boxes: &[Aabb]) -> Result<(), KdTreeError> {
        match self.kd_tree.build(boxes) {
            Err(KdTreeError::AlreadyBuilt) => {
                log::warn!("KD-tree already built; tearing it down and rebuilding");
                self.kd_tree.clear();
                self.kd_tree.build(boxes)
            }
            result => result,
        }
    }

    pub fn set_cube_map(&mut self, cube_map: Option<CubeMap>) {
        self.cube_map = cube_map;
    }

    pub fn cube_map(&self) -> Option<&CubeMap> {
        self.cube_map.as_ref()
    }

    pub fn scene_loaded(&self) -> bool {
        self.scene.is_some()
    }

    /// A scene is loaded and the framebuffer has pixels.
    pub fn is_ready(&self) -> bool {
        self.scene_loaded() && !self.buffer.is_empty()
    }

    /// Camera aspect ratio of the loaded scene.
    pub fn aspect_ratio(&self) -> Option<f32> {
        self.scene.as_ref().map(|scene| scene.camera().aspect_ratio())
    }

    /// Prepare a `width` x `height` framebuffer, cleared to black, and
    /// restart the sample sequence.
    pub fn trace_setup(&mut self, width: u32, height: u32) {
        self.buffer.reset(width, height);
        self.sampler = PixelSampler::from_config(&self.config);
    }

    fn tracer(&self) -> Option<Tracer<'_>> {
        let scene = self.scene.as_ref()?;
        Some(
            Tracer::new(scene, &self.config)
                .with_kd_tree(&self.kd_tree)
                .with_cube_map(self.cube_map.as_ref()),
        )
    }

    /// Color through normalized image coordinates; black with no scene.
    pub fn trace(&self, x: f32, y: f32) -> Color {
        self.tracer().map_or(Color::ZERO, |tracer| tracer.trace(x, y))
    }

    /// Unclamped radiance along `ray` with the given bounce budget.
    pub fn trace_ray(&self, ray: &Ray, depth: i32) -> Color {
        self.tracer()
            .map_or(Color::ZERO, |tracer| tracer.trace_ray(ray, Color::ONE, depth))
    }

    /// Sample pixel (`i`, `j`) and store it in the framebuffer.
    pub fn trace_pixel(&mut self, i: u32, j: u32) -> PixelSample {
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let Some(scene) = self.scene.as_ref() else {
            return PixelSample {
                color: Color::ZERO,
                samples: 0,
            };
        };
        let tracer = Tracer::new(scene, &self.config)
            .with_kd_tree(&self.kd_tree)
            .with_cube_map(self.cube_map.as_ref());

        let sample = self.sampler.sample(i, j, width, height, |x, y| tracer.trace(x, y));
        self.buffer.set_pixel(i, j, sample.color);
        sample
    }

    /// The framebuffer as raw RGB bytes with its width and height.
    pub fn buffer(&self) -> (&[u8], u32, u32) {
        (self.buffer.as_bytes(), self.buffer.width(), self.buffer.height())
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Trace the whole framebuffer.
    ///
    /// `stop` is checked before each row; `on_row` sees the image after
    /// every finished row.
    pub fn render<F>(&mut self, stop: &AtomicBool, mut on_row: F) -> RenderStatus
    where
        F: FnMut(u32, &FrameBuffer),
    {
        if !self.is_ready() {
            log::warn!("Render requested with no scene or an empty framebuffer");
            return RenderStatus::NotReady;
        }

        let start = Instant::now();
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let mut rays = 0u64;

        for j in 0..height {
            if stop.load(Ordering::Relaxed) {
                log::info!("Render stopped after {} of {} rows", j, height);
                return RenderStatus::Stopped { rows: j };
            }
            for i in 0..width {
                rays += u64::from(self.trace_pixel(i, j).samples);
            }
            on_row(j, &self.buffer);
        }

        log::info!(
            "Rendered {}x{} ({} primary rays) in {:.2?}",
            width,
            height,
            rays,
            start.elapsed()
        );
        RenderStatus::Complete
    }

    /// Trace the whole framebuffer with rows spread over the rayon pool.
    ///
    /// Each row draws its jitter from its own generator seeded with the
    /// configured seed plus the row index, so a given seed always yields the
    /// same image regardless of thread count. Rows not yet started when
    /// `stop` is raised stay black; `Stopped` reports how many finished.
    pub fn render_parallel(&mut self, stop: &AtomicBool) -> RenderStatus {
        if !self.is_ready() {
            log::warn!("Render requested with no scene or an empty framebuffer");
            return RenderStatus::NotReady;
        }
        let Some(tracer) = self.tracer() else {
            return RenderStatus::NotReady;
        };

        let start = Instant::now();
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let mode = self.sampler.mode();
        let seed = self.config.seed;

        let rows: Vec<Option<Vec<PixelSample>>> = (0..height)
            .into_par_iter()
            .map(|j| {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }
                let mut sampler = PixelSampler::new(mode, seed.wrapping_add(u64::from(j)));
                Some(
                    (0..width)
                        .map(|i| sampler.sample(i, j, width, height, |x, y| tracer.trace(x, y)))
                        .collect(),
                )
            })
            .collect();

        let mut finished = 0;
        let mut rays = 0u64;
        for (j, row) in (0..height).zip(rows) {
            let Some(samples) = row else {
                continue;
            };
            for (i, sample) in (0..width).zip(samples) {
                self.buffer.set_pixel(i, j, sample.color);
                rays += u64::from(sample.samples);
            }
            finished += 1;
        }

        if finished < height {
            log::info!("Render stopped with {} of {} rows done", finished, height);
            return RenderStatus::Stopped { rows: finished };
        }
        log::info!(
            "Rendered {}x{} ({} primary rays) on {} threads in {:.2?}",
            width,
            height,
            rays,
            rayon::current_num_threads(),
            start.elapsed()
        );
        RenderStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::sphere::Sphere;
    use glint_core::{Attenuation, Camera, Light, Material};
    use glint_math::{RayKind, Vec3};
    use std::sync::Arc;

    fn sphere_scene() -> Result<Scene, SceneError> {
        let camera = Camera::new().with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let mut scene = Scene::new(camera);
        scene.add_object(Sphere::new(Vec3::ZERO, 1.0, Arc::new(Material::diffuse(Color::ONE))));
        scene.add_light(Light::point(Vec3::new(0.0, 0.0, 5.0), Color::ONE, Attenuation::NONE));
        Ok(scene)
    }

    #[test]
    fn test_framebuffer_layout() {
        let mut fb = FrameBuffer::new(3, 2);
        assert_eq!(fb.as_bytes().len(), 18);

        fb.set_pixel(1, 1, Color::new(1.0, 0.5, 2.0));
        assert_eq!(fb.pixel(1, 1), Some([255, 127, 255]));
        assert_eq!(&fb.as_bytes()[12..15], &[255, 127, 255]);

        // Out of range writes are dropped
        fb.set_pixel(3, 0, Color::ONE);
        assert_eq!(fb.pixel(3, 0), None);
    }

    #[test]
    fn test_framebuffer_reset() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set_pixel(0, 0, Color::ONE);
        fb.reset(2, 2);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));

        fb.reset(4, 1);
        assert_eq!((fb.width(), fb.height()), (4, 1));
        assert_eq!(fb.as_bytes().len(), 12);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        assert!(!tracer.scene_loaded());
        assert_eq!(tracer.aspect_ratio(), None);
        assert_eq!(tracer.trace(0.5, 0.5), Color::ZERO);

        tracer.load_scene(&sphere_scene).unwrap();
        assert!(tracer.scene_loaded());
        assert!(!tracer.is_ready());
        assert!(tracer.kd_tree().is_built());
        assert_eq!(tracer.aspect_ratio(), Some(1.0));

        tracer.trace_setup(4, 4);
        assert!(tracer.is_ready());

        // Loading again rebuilds the tree in place
        tracer.load_scene(&sphere_scene).unwrap();
        assert!(tracer.kd_tree().is_built());
    }

    #[test]
    fn test_failed_load_keeps_previous_scene() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        tracer.load_scene(&sphere_scene).unwrap();

        let broken = || -> Result<Scene, SceneError> { Err(SceneError::Parse("line 3: expected '{'".into())) };
        let err = tracer.load_scene(&broken).unwrap_err();
        assert!(matches!(err, TraceError::SceneLoad(SceneError::Parse(_))));
        assert!(tracer.scene_loaded());
        assert_eq!(tracer.scene().map(|s| s.objects().len()), Some(1));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TraceConfig::default().with_samples(0);
        assert!(matches!(RayTracer::new(config), Err(TraceError::Config(_))));
    }

    #[test]
    fn test_render_fills_buffer() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        tracer.load_scene(&sphere_scene).unwrap();
        tracer.trace_setup(9, 9);

        let mut rows = Vec::new();
        let status = tracer.render(&AtomicBool::new(false), |j, _| rows.push(j));
        assert_eq!(status, RenderStatus::Complete);
        assert_eq!(rows, (0..9).collect::<Vec<_>>());

        let (bytes, w, h) = tracer.buffer();
        assert_eq!((w, h), (9, 9));
        assert_eq!(bytes.len(), 9 * 9 * 3);

        // The sphere fills the middle, the corners see nothing
        let center = tracer.frame().pixel(4, 4).unwrap();
        assert!(center.iter().all(|&c| c > 200));
        assert_eq!(tracer.frame().pixel(0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_render_honors_stop_flag() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        tracer.load_scene(&sphere_scene).unwrap();
        tracer.trace_setup(4, 4);

        let stop = AtomicBool::new(false);
        let status = tracer.render(&stop, |j, _| {
            if j == 1 {
                stop.store(true, Ordering::Relaxed);
            }
        });
        assert_eq!(status, RenderStatus::Stopped { rows: 2 });
    }

    #[test]
    fn test_render_without_scene() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        tracer.trace_setup(2, 2);
        assert_eq!(tracer.render(&AtomicBool::new(false), |_, _| {}), RenderStatus::NotReady);
    }

    #[test]
    fn test_accelerated_and_linear_sessions_agree() {
        let mut fast = RayTracer::new(TraceConfig::default()).unwrap();
        let mut slow = RayTracer::new(TraceConfig::default().with_acceleration(false)).unwrap();
        fast.load_scene(&sphere_scene).unwrap();
        slow.load_scene(&sphere_scene).unwrap();
        assert!(!slow.kd_tree().is_built());

        let ray = Ray::new(Vec3::new(0.3, 0.2, 5.0), Vec3::NEG_Z, RayKind::Visibility);
        let (a, b) = (fast.trace_ray(&ray, 3), slow.trace_ray(&ray, 3));
        assert!((a - b).length() < 1e-6, "{a:?} vs {b:?}");
        assert!(a.length() > 0.0);
    }

    #[test]
    fn test_parallel_render_matches_serial() {
        let mut serial = RayTracer::new(TraceConfig::default().with_samples(2)).unwrap();
        let mut parallel = RayTracer::new(TraceConfig::default().with_samples(2)).unwrap();
        for tracer in [&mut serial, &mut parallel] {
            tracer.load_scene(&sphere_scene).unwrap();
            tracer.trace_setup(12, 8);
        }

        let stop = AtomicBool::new(false);
        assert_eq!(serial.render(&stop, |_, _| {}), RenderStatus::Complete);
        assert_eq!(parallel.render_parallel(&stop), RenderStatus::Complete);
        // Without jitter both paths trace the same positions
        assert_eq!(serial.buffer().0, parallel.buffer().0);
    }

    #[test]
    fn test_parallel_render_stopped_up_front() {
        let mut tracer = RayTracer::new(TraceConfig::default()).unwrap();
        tracer.load_scene(&sphere_scene).unwrap();
        tracer.trace_setup(4, 4);

        let status = tracer.render_parallel(&AtomicBool::new(true));
        assert_eq!(status, RenderStatus::Stopped { rows: 0 });
        assert!(tracer.buffer().0.iter().all(|&b| b == 0));
    }
}
