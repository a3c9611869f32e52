//! Environment cube map consulted by rays that leave the scene.

use glint_math::{Vec2, Vec3};

use crate::{Color, Texture, TextureError, TextureResult};

/// Cube faces in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl CubeFace {
    /// Face hit by `dir` and the face-local texture coordinates in [0, 1].
    pub fn project(dir: Vec3) -> (CubeFace, Vec2) {
        let a = dir.abs();
        let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
            if dir.x > 0.0 {
                (CubeFace::PosX, -dir.z, -dir.y, a.x)
            } else {
                (CubeFace::NegX, dir.z, -dir.y, a.x)
            }
        } else if a.y >= a.z {
            if dir.y > 0.0 {
                (CubeFace::PosY, dir.x, dir.z, a.y)
            } else {
                (CubeFace::NegY, dir.x, -dir.z, a.y)
            }
        } else if dir.z > 0.0 {
            (CubeFace::PosZ, dir.x, -dir.y, a.z)
        } else {
            (CubeFace::NegZ, -dir.x, -dir.y, a.z)
        };

        let uv = Vec2::new(0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0));
        (face, uv.clamp(Vec2::ZERO, Vec2::ONE))
    }
}

/// Six textures surrounding the scene.
#[derive(Debug, Clone)]
pub struct CubeMap {
    faces: [Texture; 6],
    filter_width: u32,
}

impl CubeMap {
    /// Build a cube map; faces are ordered +X, -X, +Y, -Y, +Z, -Z and must
    /// share one resolution.
    pub fn new(faces: [Texture; 6]) -> TextureResult<Self> {
        let (w, h) = (faces[0].width, faces[0].height);
        if let Some((face, tex)) = faces
            .iter()
            .enumerate()
            .find(|(_, t)| t.width != w || t.height != h)
        {
            log::warn!(
                "Cube map face {} is {}x{}, expected {}x{} like face 0",
                face,
                tex.width,
                tex.height,
                w,
                h
            );
            return Err(TextureError::FaceSizeMismatch {
                face,
                width: tex.width,
                height: tex.height,
            });
        }
        Ok(Self {
            faces,
            filter_width: 1,
        })
    }

    /// Cube map with one flat color per face.
    pub fn from_colors(colors: [Color; 6]) -> Self {
        Self {
            faces: colors.map(Texture::solid_color),
            filter_width: 1,
        }
    }

    /// Average `width`x`width` texels per lookup to soften the environment.
    pub fn with_filter_width(mut self, width: u32) -> Self {
        self.filter_width = width.max(1);
        self
    }

    pub fn face(&self, face: CubeFace) -> &Texture {
        &self.faces[face as usize]
    }

    /// Environment color seen along `direction`.
    pub fn sample(&self, direction: Vec3) -> Color {
        if direction == Vec3::ZERO {
            return Color::ZERO;
        }
        let (face, uv) = CubeFace::project(direction);
        self.faces[face as usize].sample_box(uv, self.filter_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored() -> CubeMap {
        CubeMap::from_colors([
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 1.0, 0.0),
            Color::new(0.0, 0.0, 1.0),
            Color::new(1.0, 1.0, 0.0),
            Color::new(0.0, 1.0, 1.0),
            Color::new(1.0, 0.0, 1.0),
        ])
    }

    #[test]
    fn test_face_selection() {
        assert_eq!(CubeFace::project(Vec3::X).0, CubeFace::PosX);
        assert_eq!(CubeFace::project(-Vec3::X).0, CubeFace::NegX);
        assert_eq!(CubeFace::project(Vec3::new(0.1, 0.9, -0.2)).0, CubeFace::PosY);
        assert_eq!(CubeFace::project(Vec3::new(0.1, -0.2, -0.9)).0, CubeFace::NegZ);
    }

    #[test]
    fn test_face_center_uv() {
        let (_, uv) = CubeFace::project(Vec3::Z);
        assert!((uv - Vec2::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_sample_by_direction() {
        let map = colored();
        assert_eq!(map.sample(Vec3::new(0.0, -3.0, 0.5)), Color::new(1.0, 1.0, 0.0));
        assert_eq!(map.sample(Vec3::new(0.2, 0.1, 1.0)), Color::new(0.0, 1.0, 1.0));
        assert_eq!(map.sample(Vec3::ZERO), Color::ZERO);
    }

    #[test]
    fn test_face_size_mismatch() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut faces: [Texture; 6] = Default::default();
        for face in faces.iter_mut() {
            *face = Texture::solid_color(Color::ONE);
        }
        faces[3] = Texture::from_fn(2, 2, |_, _| Color::ONE);
        let err = CubeMap::new(faces).unwrap_err();
        assert!(matches!(err, TextureError::FaceSizeMismatch { face: 3, .. }));
    }

    #[test]
    fn test_filtered_sample_of_flat_face() {
        let map = colored().with_filter_width(3);
        assert!((map.sample(Vec3::X) - Color::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
