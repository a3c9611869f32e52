//! Phong material description.
//!
//! Every coefficient is a `MaterialParameter`: either a constant color or a
//! texture looked up with the intersection's texture coordinates.

use std::sync::Arc;

use glint_math::{Vec2, Vec3};

use crate::{Intersection, Texture};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// A coefficient that is constant or varies over the surface.
#[derive(Clone, Debug)]
pub enum MaterialParameter {
    Constant(Color),
    Mapped(Arc<Texture>),
}

impl MaterialParameter {
    pub fn value(&self, uv: Vec2) -> Color {
        match self {
            MaterialParameter::Constant(c) => *c,
            MaterialParameter::Mapped(texture) => texture.sample(uv),
        }
    }

    /// Luma (Rec. 601 weights) of the value at `uv`.
    pub fn intensity(&self, uv: Vec2) -> f32 {
        luma(self.value(uv))
    }

    /// True for a constant black parameter.
    pub fn is_zero(&self) -> bool {
        matches!(self, MaterialParameter::Constant(c) if *c == Color::ZERO)
    }
}

impl Default for MaterialParameter {
    fn default() -> Self {
        MaterialParameter::Constant(Color::ZERO)
    }
}

impl From<Color> for MaterialParameter {
    fn from(color: Color) -> Self {
        MaterialParameter::Constant(color)
    }
}

impl From<Arc<Texture>> for MaterialParameter {
    fn from(texture: Arc<Texture>) -> Self {
        MaterialParameter::Mapped(texture)
    }
}

/// Rec. 601 luma of an RGB color.
#[inline]
pub fn luma(c: Color) -> f32 {
    0.299 * c.x + 0.587 * c.y + 0.114 * c.z
}

/// Surface material for Phong shading plus mirror/transmission terms.
#[derive(Clone, Debug)]
pub struct Material {
    /// Emissive
    pub ke: MaterialParameter,
    /// Ambient
    pub ka: MaterialParameter,
    /// Specular
    pub ks: MaterialParameter,
    /// Diffuse
    pub kd: MaterialParameter,
    /// Reflective
    pub kr: MaterialParameter,
    /// Transmissive
    pub kt: MaterialParameter,
    /// Phong exponent
    pub shininess: f32,
    /// Index of refraction (1.0 = air, 1.5 = glass)
    pub index: f32,
    /// Height map whose gradient perturbs the shading normal
    pub bump: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ke: MaterialParameter::default(),
            ka: MaterialParameter::default(),
            ks: MaterialParameter::default(),
            kd: MaterialParameter::default(),
            kr: MaterialParameter::default(),
            kt: MaterialParameter::default(),
            shininess: 0.0,
            index: 1.0,
            bump: None,
        }
    }
}

impl Material {
    /// Purely diffuse material with the given albedo.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            kd: albedo.into(),
            ..Default::default()
        }
    }

    /// Perfect mirror: reflects everything, no local shading.
    pub fn mirror() -> Self {
        Self {
            kr: Color::ONE.into(),
            ..Default::default()
        }
    }

    /// Clear dielectric with the given index of refraction.
    pub fn glass(index: f32) -> Self {
        Self {
            kt: Color::ONE.into(),
            index,
            ..Default::default()
        }
    }

    pub fn with_ambient(mut self, ka: impl Into<MaterialParameter>) -> Self {
        self.ka = ka.into();
        self
    }

    pub fn with_diffuse(mut self, kd: impl Into<MaterialParameter>) -> Self {
        self.kd = kd.into();
        self
    }

    pub fn with_specular(mut self, ks: impl Into<MaterialParameter>, shininess: f32) -> Self {
        self.ks = ks.into();
        self.shininess = shininess;
        self
    }

    pub fn with_emissive(mut self, ke: impl Into<MaterialParameter>) -> Self {
        self.ke = ke.into();
        self
    }

    pub fn with_reflective(mut self, kr: impl Into<MaterialParameter>) -> Self {
        self.kr = kr.into();
        self
    }

    pub fn with_transmissive(mut self, kt: impl Into<MaterialParameter>, index: f32) -> Self {
        self.kt = kt.into();
        self.index = index;
        self
    }

    pub fn with_bump(mut self, bump: Arc<Texture>) -> Self {
        self.bump = Some(bump);
        self
    }

    pub fn ke(&self, hit: &Intersection) -> Color {
        self.ke.value(hit.uv)
    }

    pub fn ka(&self, hit: &Intersection) -> Color {
        self.ka.value(hit.uv)
    }

    pub fn ks(&self, hit: &Intersection) -> Color {
        self.ks.value(hit.uv)
    }

    pub fn kd(&self, hit: &Intersection) -> Color {
        self.kd.value(hit.uv)
    }

    pub fn kr(&self, hit: &Intersection) -> Color {
        self.kr.value(hit.uv)
    }

    pub fn kt(&self, hit: &Intersection) -> Color {
        self.kt.value(hit.uv)
    }

    pub fn shininess(&self, _hit: &Intersection) -> f32 {
        self.shininess
    }

    pub fn index(&self, _hit: &Intersection) -> f32 {
        self.index
    }

    /// Bump perturbation at the hit, or `None` when no bump source is bound.
    pub fn bump(&self, hit: &Intersection, scale: f32) -> Option<Vec3> {
        self.bump
            .as_ref()
            .map(|map| map.bump_gradient(hit.uv, scale))
    }
}
