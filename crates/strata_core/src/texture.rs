//! Surface textures.
//!
//! A texture maps a surface UV and world position to a colour. Image
//! textures wrap pixel buffers that were decoded before rendering starts;
//! nothing in here touches the filesystem.

use std::sync::Arc;

use rand::RngCore;
use strata_math::{Color, Vec3};
use thiserror::Error;

use crate::Perlin;

/// Errors that can occur while building a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Texture {name} has zero size ({width}x{height})")]
    EmptyImage {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("Texture {name} expects {expected} pixels, got {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A colour lookup over a surface.
pub trait Texture: Send + Sync {
    fn value(&self, u: f64, v: f64, p: Vec3) -> Color;
}

/// The same colour everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantTexture {
    color: Color,
}

impl ConstantTexture {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Texture for ConstantTexture {
    fn value(&self, _u: f64, _v: f64, _p: Vec3) -> Color {
        self.color
    }
}

/// Solid 3D checker pattern alternating between two textures.
pub struct CheckerTexture {
    odd: Arc<dyn Texture>,
    even: Arc<dyn Texture>,
    scale: f64,
}

impl CheckerTexture {
    /// Checker with the classic frequency of 10 cells per world unit per axis.
    pub fn new(odd: Arc<dyn Texture>, even: Arc<dyn Texture>) -> Self {
        Self::with_scale(odd, even, 10.0)
    }

    pub fn with_scale(odd: Arc<dyn Texture>, even: Arc<dyn Texture>, scale: f64) -> Self {
        Self { odd, even, scale }
    }

    pub fn from_colors(odd: Color, even: Color) -> Self {
        Self::new(
            Arc::new(ConstantTexture::new(odd)),
            Arc::new(ConstantTexture::new(even)),
        )
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f64, v: f64, p: Vec3) -> Color {
        let sines = (self.scale * p.x).sin() * (self.scale * p.y).sin() * (self.scale * p.z).sin();
        if sines < 0.0 {
            self.odd.value(u, v, p)
        } else {
            self.even.value(u, v, p)
        }
    }
}

/// Marble-like grey pattern from Perlin turbulence.
pub struct NoiseTexture {
    perlin: Perlin,
    scale: f64,
}

impl NoiseTexture {
    pub fn new(scale: f64, rng: &mut dyn RngCore) -> Self {
        Self {
            perlin: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f64, _v: f64, p: Vec3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.perlin.turbulence(p, 7);
        Color::ONE * 0.5 * (1.0 + phase.sin())
    }
}

/// A decoded image with pixel data.
///
/// Stores pixels in linear RGBA float format, row-major with row 0 at the top.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data, one [R, G, B, A] per pixel
    pub pixels: Vec<[f32; 4]>,

    /// Where the pixels came from (for diagnostics)
    pub name: String,
}

impl ImageTexture {
    /// Create a new texture from linear pixel data.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<[f32; 4]>,
        name: impl Into<String>,
    ) -> TextureResult<Self> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyImage {
                name,
                width,
                height,
            });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                name,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            name,
        })
    }

    /// Create a texture from 8-bit sRGB RGBA bytes, converting to linear.
    pub fn from_srgb8(
        width: u32,
        height: u32,
        bytes: &[u8],
        name: impl Into<String>,
    ) -> TextureResult<Self> {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();
        Self::new(width, height, pixels, name)
    }

    /// Sample the texture at UV coordinates (bilinear filtering).
    ///
    /// UVs wrap, with (0, 0) at bottom-left.
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        // Convert to pixel coordinates
        let x = u * (self.width as f64 - 1.0);
        let y = (1.0 - v) * (self.height as f64 - 1.0); // Flip V for image coordinates

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let top = self.get_pixel(x0, y0) * (1.0 - fx) + self.get_pixel(x1, y0) * fx;
        let bottom = self.get_pixel(x0, y1) * (1.0 - fx) + self.get_pixel(x1, y1) * fx;

        top * (1.0 - fy) + bottom * fy
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> Color {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Color::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .unwrap_or(Color::ZERO)
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f64, v: f64, _p: Vec3) -> Color {
        self.sample(u, v)
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
