//! Scene lights.
//!
//! The set of light types is closed, so lights are a plain enum rather than
//! a trait object.

use glint_math::Vec3;

use crate::Color;

/// Quadratic distance falloff `min(1, 1 / (c0 + c1 d + c2 d^2))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// No falloff at all.
    pub const NONE: Attenuation = Attenuation::new(1.0, 0.0, 0.0);

    /// Falloff used to fade light passing through a transmissive occluder
    /// of a directional light, which has no coefficients of its own.
    pub const DIRECTIONAL_SHADOW: Attenuation = Attenuation::new(0.2, 0.2, 0.6);

    /// Attenuation factor at distance `d`, never above 1.
    pub fn factor(&self, d: f32) -> f32 {
        let denom = self.constant + self.linear * d + self.quadratic * d * d;
        if denom <= f32::EPSILON {
            return 1.0;
        }
        (1.0 / denom).min(1.0)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Attenuation::NONE
    }
}

/// A light source.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Infinitely distant light shining along `orientation`.
    Directional { orientation: Vec3, color: Color },
    /// Light at a position with quadratic distance falloff.
    Point {
        position: Vec3,
        color: Color,
        attenuation: Attenuation,
    },
}

impl Light {
    /// Directional light traveling along `orientation` (normalized here).
    pub fn directional(orientation: Vec3, color: Color) -> Self {
        Light::Directional {
            orientation: orientation.normalize(),
            color,
        }
    }

    pub fn point(position: Vec3, color: Color, attenuation: Attenuation) -> Self {
        Light::Point {
            position,
            color,
            attenuation,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Light::Directional { color, .. } | Light::Point { color, .. } => *color,
        }
    }

    /// Unit vector from `p` toward the light.
    pub fn direction_from(&self, p: Vec3) -> Vec3 {
        match self {
            Light::Directional { orientation, .. } => -*orientation,
            Light::Point { position, .. } => (*position - p).normalize(),
        }
    }

    /// Distance from `p` to the light; `None` for lights at infinity.
    pub fn distance_from(&self, p: Vec3) -> Option<f32> {
        match self {
            Light::Directional { .. } => None,
            Light::Point { position, .. } => Some((*position - p).length()),
        }
    }

    /// Distance falloff at `p`: 1 for directional lights.
    pub fn distance_attenuation(&self, p: Vec3) -> f32 {
        match self {
            Light::Directional { .. } => 1.0,
            Light::Point {
                position,
                attenuation,
                ..
            } => attenuation.factor((*position - p).length()),
        }
    }

    /// Falloff applied to light leaking through a transmissive occluder.
    pub fn shadow_falloff(&self) -> Attenuation {
        match self {
            Light::Directional { .. } => Attenuation::DIRECTIONAL_SHADOW,
            Light::Point { attenuation, .. } => *attenuation,
        }
    }
}
