//! Error types for scene assembly, acceleration builds and configuration.
//!
//! Geometric degeneracies (parallel rays, zero-area faces, imaginary roots)
//! are not errors: intersection code reports them as a miss.

use glint_core::TextureError;
use thiserror::Error;

/// Invalid triangle mesh data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Face ({a}, {b}, {c}) references a vertex past the end ({vertex_count} vertices)")]
    FaceOutOfRange {
        a: u32,
        b: u32,
        c: u32,
        vertex_count: usize,
    },

    #[error("Bad trimesh: {count} normals for {vertex_count} vertices")]
    NormalCount { count: usize, vertex_count: usize },

    #[error("Bad trimesh: {count} texture coordinates for {vertex_count} vertices")]
    UvCount { count: usize, vertex_count: usize },

    #[error("Mesh has no faces")]
    NoFaces,
}

/// Failures building a KD-tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KdTreeError {
    #[error("KD-tree already built; tear it down before rebuilding")]
    AlreadyBuilt,

    #[error("Primitive {0} has an empty bounding box")]
    EmptyBoundingBox(usize),
}

/// Errors reported while producing a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Scene parse error: {0}")]
    Parse(String),

    #[error("Texture mapping error: {0}")]
    Texture(#[from] TextureError),

    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    #[error("Scene has no camera aspect ratio set (got {0})")]
    BadAspectRatio(f32),
}

/// Invalid trace configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Sample count must be at least 1")]
    ZeroSamples,

    #[error("KD-tree costs must be non-negative (traversal {traversal}, intersection {intersection})")]
    NegativeCost { traversal: f32, intersection: f32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the tracing session.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to load scene: {0}")]
    SceneLoad(#[from] SceneError),

    #[error("Acceleration structure build failed: {0}")]
    Acceleration(#[from] KdTreeError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
