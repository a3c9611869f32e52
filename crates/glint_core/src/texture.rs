//! Texture maps for material parameters, bump sources and cube-map faces.
//!
//! Textures hold already-decoded pixels in linear float RGB. A texture with
//! no pixels never fails a lookup: it samples as white, so a material whose
//! map failed to arrive still renders.

use glint_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur while building a texture from raw pixels.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Cube map faces must share one size, face {face} is {width}x{height}")]
    FaceSizeMismatch { face: usize, width: u32, height: u32 },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A texture with pixel data.
#[derive(Clone, Debug, Default)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Linear RGB pixels, row-major, row 0 first
    pub pixels: Vec<Vec3>,
}

impl Texture {
    /// Build a texture from packed 8-bit RGB bytes.
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> TextureResult<Self> {
        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            log::warn!(
                "Rejected {}x{} texture: {} bytes for {} expected",
                width,
                height,
                bytes.len(),
                expected
            );
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a texture by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Vec3) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Get pixel at integer coordinates, clamped to the last row/column.
    pub fn pixel_at(&self, x: i64, y: i64) -> Vec3 {
        if self.is_empty() {
            return Vec3::ONE;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(Vec3::ONE)
    }

    /// Bilinearly filtered lookup at texture coordinates in [0, 1].
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let xf = uv.x * self.width as f32;
        let yf = uv.y * self.height as f32;
        let x = xf.floor();
        let y = yf.floor();
        let (dx, dy) = (xf - x, yf - y);
        let (x, y) = (x as i64, y as i64);

        self.pixel_at(x, y) * ((1.0 - dx) * (1.0 - dy))
            + self.pixel_at(x + 1, y) * (dx * (1.0 - dy))
            + self.pixel_at(x, y + 1) * ((1.0 - dx) * dy)
            + self.pixel_at(x + 1, y + 1) * (dx * dy)
    }

    /// Average of a `width`x`width` block of texels starting at the texel
    /// under `uv`. A width of 0 or 1 is a plain bilinear lookup.
    pub fn sample_box(&self, uv: Vec2, width: u32) -> Vec3 {
        if width <= 1 {
            return self.sample(uv);
        }
        let x0 = (uv.x * self.width as f32).floor() as i64;
        let y0 = (uv.y * self.height as f32).floor() as i64;
        let mut sum = Vec3::ZERO;
        for dy in 0..width as i64 {
            for dx in 0..width as i64 {
                sum += self.pixel_at(x0 + dx, y0 + dy);
            }
        }
        sum / (width * width) as f32
    }

    /// Surface perturbation from the local intensity gradient.
    ///
    /// The forward differences along x and y, scaled by `scale`, tilt a
    /// +Z vector; the result is unit length.
    pub fn bump_gradient(&self, uv: Vec2, scale: f32) -> Vec3 {
        let x = (uv.x * self.width as f32) as i64;
        let y = (uv.y * self.height as f32) as i64;
        let here = self.pixel_at(x, y);
        let dx = here - self.pixel_at(x + 1, y);
        let dy = here - self.pixel_at(x, y + 1);
        let avg = |v: Vec3| (v.x + v.y + v.z) / 3.0;
        Vec3::new(scale * avg(dx), scale * avg(dy), 1.0).normalize()
    }
}
