//! Glint Renderer - Whitted-style recursive ray tracing on the CPU.
//!
//! Primary rays come from the scene camera; each hit is shaded with Phong
//! lighting and shadow rays, then mirror reflection and refraction recurse
//! until the depth budget runs out. Scenes and meshes are accelerated with
//! KD-trees built from a surface-area or median split heuristic.
//!
//! The usual entry point is [`RayTracer`]: load a scene, call
//! [`RayTracer::trace_setup`] with an image size, then [`RayTracer::render`].

mod config;
mod error;
mod geometry;
mod kdtree;
mod mesh;
mod renderer;
mod sampling;
mod scene;
mod shading;
mod sphere;
mod tracer;

pub use config::TraceConfig;
pub use error::{ConfigError, KdTreeError, MeshError, SceneError, TraceError};
pub use geometry::Geometry;
pub use kdtree::{KdTree, KdTreeSettings, KdTreeStats, SplitHeuristic};
pub use mesh::TriangleMesh;
pub use renderer::{channel_to_byte, FrameBuffer, RayTracer, RenderStatus};
pub use sampling::{PixelSample, PixelSampler, SamplingMode, ADAPTIVE_THRESHOLD};
pub use scene::{RayCaster, Scene, SceneSource};
pub use shading::{shade, shadow_attenuation};
pub use sphere::Sphere;
pub use tracer::{reflect_direction, refract_direction, Tracer};

/// Re-export scene description types from glint_core
pub use glint_core::{
    Attenuation, Camera, Color, CubeFace, CubeMap, Intersection, Light, Material, MaterialParameter, Texture,
};

/// Re-export math types from glint_math
pub use glint_math::{Aabb, Interval, Ray, RayKind, Vec2, Vec3, RAY_EPSILON};
