use crate::core::color::{decode_srgb8, encode_srgb8};
use image::{DynamicImage, RgbImage};
use log::{error, info};
use nalgebra::Vector3;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face '{path}' is {width}x{height}, expected a square face of size {expected}")]
    FaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// A 2D image decoded to linear RGB.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    texels: Vec<Vector3<f32>>,
}

impl Texture {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref).map_err(|source| TextureError::Load {
            path: path_ref.to_path_buf(),
            source,
        })?;

        let texture = Self::from_image(&img);
        info!(
            "Loaded texture: {:?} ({}x{})",
            path_ref, texture.width, texture.height
        );
        Ok(texture)
    }

    /// Decodes an sRGB image into linear texels once, so sampling stays cheap.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let texels = rgb
            .pixels()
            .map(|p| {
                Vector3::new(
                    decode_srgb8(p[0]),
                    decode_srgb8(p[1]),
                    decode_srgb8(p[2]),
                )
            })
            .collect();

        Self {
            width,
            height,
            texels,
        }
    }

    /// Samples with bilinear filtering and clamp-to-edge addressing.
    /// `(u, v)` in [0, 1], origin at the top-left texel.
    pub fn sample(&self, u: f32, v: f32) -> Vector3<f32> {
        if self.texels.is_empty() {
            return Vector3::zeros();
        }

        // -0.5 because texel centers are at 0.5
        let x = u.clamp(0.0, 1.0) * self.width as f32 - 0.5;
        let y = v.clamp(0.0, 1.0) * self.height as f32 - 0.5;

        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let wx = x - x.floor();
        let wy = y - y.floor();

        let c00 = self.texel_clamped(x0, y0);
        let c10 = self.texel_clamped(x0 + 1, y0);
        let c01 = self.texel_clamped(x0, y0 + 1);
        let c11 = self.texel_clamped(x0 + 1, y0 + 1);

        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        top * (1.0 - wy) + bottom * wy
    }

    fn texel_clamped(&self, x: i32, y: i32) -> Vector3<f32> {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.texels[y * self.width as usize + x]
    }
}

/// Cube faces in storage order, with the file stem each one is loaded from.
pub const CUBE_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

const FALLBACK_FACE_SIZE: u32 = 32;
const FALLBACK_ZENITH: [f32; 3] = [0.35, 0.55, 0.85];
const FALLBACK_NADIR: [f32; 3] = [0.08, 0.08, 0.1];

/// Six square faces addressed by direction, in the usual
/// +X, -X, +Y, -Y, +Z, -Z cube map convention.
#[derive(Debug, Clone)]
pub struct Cubemap {
    pub name: String,
    /// Always six entries, in `CUBE_FACES` order.
    faces: Vec<Texture>,
}

impl Cubemap {
    /// Loads `<dir>/{px,nx,py,ny,pz,nz}.png`. All faces must be square and
    /// share one size.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, TextureError> {
        let dir = dir.as_ref();
        let mut faces = Vec::with_capacity(CUBE_FACES.len());
        let mut face_size = None;

        for stem in CUBE_FACES {
            let path = dir.join(format!("{}.png", stem));
            let face = Texture::load(&path)?;
            let expected = *face_size.get_or_insert(face.width);
            if face.width != face.height || face.width != expected {
                return Err(TextureError::FaceSize {
                    path,
                    width: face.width,
                    height: face.height,
                    expected,
                });
            }
            faces.push(face);
        }

        Ok(Self {
            name: dir.display().to_string(),
            faces,
        })
    }

    /// Like [`Cubemap::load`], but logs the failure and substitutes a
    /// procedural sky gradient.
    pub fn load_or_gradient<P: AsRef<Path>>(dir: P) -> Self {
        match Self::load(&dir) {
            Ok(cubemap) => cubemap,
            Err(e) => {
                error!("{}. Using a gradient sky instead.", e);
                Self::gradient(
                    &dir.as_ref().display().to_string(),
                    Vector3::from(FALLBACK_ZENITH),
                    Vector3::from(FALLBACK_NADIR),
                )
            }
        }
    }

    /// A cubemap blending from `nadir` straight down to `zenith` straight up.
    pub fn gradient(name: &str, zenith: Vector3<f32>, nadir: Vector3<f32>) -> Self {
        let size = FALLBACK_FACE_SIZE;
        let faces = (0..CUBE_FACES.len())
            .map(|face| {
                let img = RgbImage::from_fn(size, size, |x, y| {
                    let s = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let t = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let dir = face_direction(face, s, t).normalize();
                    let color = nadir.lerp(&zenith, dir.y * 0.5 + 0.5);
                    image::Rgb(color.map(encode_srgb8).into())
                });
                Texture::from_image(&DynamicImage::ImageRgb8(img))
            })
            .collect();

        Self {
            name: name.to_string(),
            faces,
        }
    }

    /// Samples the face hit by `dir` (need not be normalized).
    pub fn sample(&self, dir: &Vector3<f32>) -> Vector3<f32> {
        let (face, s, t) = select_face(dir);
        self.faces[face].sample((s + 1.0) * 0.5, (t + 1.0) * 0.5)
    }
}

/// Major-axis face selection. Returns the face index and the face
/// coordinates in [-1, 1], `t` growing downwards in the face image.
fn select_face(dir: &Vector3<f32>) -> (usize, f32, f32) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if dir.x >= 0.0 {
            (0, -dir.z, -dir.y, ax)
        } else {
            (1, dir.z, -dir.y, ax)
        }
    } else if ay >= az {
        if dir.y >= 0.0 {
            (2, dir.x, dir.z, ay)
        } else {
            (3, dir.x, -dir.z, ay)
        }
    } else if dir.z >= 0.0 {
        (4, dir.x, -dir.y, az)
    } else {
        (5, -dir.x, -dir.y, az)
    };

    if ma <= f32::EPSILON {
        return (face, 0.0, 0.0);
    }
    (face, sc / ma, tc / ma)
}

/// Inverse of [`select_face`] for a point on the unit cube.
fn face_direction(face: usize, s: f32, t: f32) -> Vector3<f32> {
    match face {
        0 => Vector3::new(1.0, -t, -s),
        1 => Vector3::new(-1.0, -t, s),
        2 => Vector3::new(s, 1.0, t),
        3 => Vector3::new(s, -1.0, -t),
        4 => Vector3::new(s, -t, 1.0),
        _ => Vector3::new(-s, -t, -1.0),
    }
}
