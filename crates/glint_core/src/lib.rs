//! Glint Core - scene description types for the Whitted ray tracer.
//!
//! This crate provides the renderer-agnostic pieces a scene is made of:
//!
//! - **Surfaces**: `Material`, `MaterialParameter`, `Texture`
//! - **Lighting**: `Light` (directional and point), `Attenuation`
//! - **Viewing**: `Camera`, `CubeMap` environment
//! - **Hit data**: `Intersection`, the record every primitive test produces
//!
//! Decoding image files and parsing scene files happen elsewhere; textures
//! are built from already-decoded pixels.

pub mod camera;
pub mod cube_map;
pub mod intersection;
pub mod light;
pub mod material;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use cube_map::{CubeFace, CubeMap};
pub use intersection::Intersection;
pub use light::{Attenuation, Light};
pub use material::{luma, Color, Material, MaterialParameter};
pub use texture::{Texture, TextureError, TextureResult};
