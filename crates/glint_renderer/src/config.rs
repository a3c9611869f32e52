//! Trace configuration.
//!
//! One immutable snapshot is handed to a tracing session; shading and the
//! recursive tracer read it, nothing writes it back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kdtree::{KdTreeSettings, SplitHeuristic};

/// Trace configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Recursion budget for reflection and refraction
    pub max_depth: i32,
    /// Sub-pixel grid size (N x N samples); 1 disables anti-aliasing
    pub samples: u32,
    /// Randomly offset each grid sample within its cell
    pub jitter: bool,
    /// Stop sampling a pixel once its luma settles
    pub adaptive: bool,
    /// Use KD-trees for the scene and for meshes
    pub acceleration: bool,
    pub heuristic: SplitHeuristic,
    pub kd_max_depth: u32,
    pub kd_min_objects: usize,
    pub traversal_cost: f32,
    pub intersection_cost: f32,
    /// Retry with a linear scene scan when the KD-tree misses
    pub linear_fallback: bool,
    /// Strength of bump map gradients
    pub bump_scale: f32,
    /// Cool-to-warm shading instead of Phong
    pub stylized: bool,
    /// Sample the cube map for rays that escape the scene
    pub use_cube_map: bool,
    /// Seed for jitter and adaptive sample order
    pub seed: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        let kd = KdTreeSettings::default();
        Self {
            max_depth: 3,
            samples: 1,
            jitter: false,
            adaptive: false,
            acceleration: true,
            heuristic: kd.heuristic,
            kd_max_depth: kd.max_depth,
            kd_min_objects: kd.min_objects,
            traversal_cost: kd.traversal_cost,
            intersection_cost: kd.intersection_cost,
            linear_fallback: true,
            bump_scale: 1.0,
            stylized: false,
            use_cube_map: true,
            seed: 0,
        }
    }
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: i32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_acceleration(mut self, acceleration: bool) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_heuristic(mut self, heuristic: SplitHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_linear_fallback(mut self, fallback: bool) -> Self {
        self.linear_fallback = fallback;
        self
    }

    pub fn with_bump_scale(mut self, scale: f32) -> Self {
        self.bump_scale = scale;
        self
    }

    pub fn with_stylized(mut self, stylized: bool) -> Self {
        self.stylized = stylized;
        self
    }

    pub fn with_cube_map(mut self, use_cube_map: bool) -> Self {
        self.use_cube_map = use_cube_map;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check values serde and the builders cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if self.traversal_cost < 0.0 || self.intersection_cost < 0.0 {
            return Err(ConfigError::NegativeCost {
                traversal: self.traversal_cost,
                intersection: self.intersection_cost,
            });
        }
        Ok(())
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TraceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// KD-tree build parameters derived from this config.
    pub fn kd_settings(&self) -> KdTreeSettings {
        KdTreeSettings {
            max_depth: self.kd_max_depth,
            min_objects: self.kd_min_objects,
            traversal_cost: self.traversal_cost,
            intersection_cost: self.intersection_cost,
            heuristic: self.heuristic,
        }
    }
}
