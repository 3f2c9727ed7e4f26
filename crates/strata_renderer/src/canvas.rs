//! Image buffer for storing render output.

use strata_math::{Color, Vec4};

/// Row-major RGBA image, row 0 at the top.
///
/// Pixels hold display values: the renderer writes them after averaging
/// and gamma encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Vec4>,
}

impl Canvas {
    /// Create a new canvas filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::new(0.0, 0.0, 0.0, 1.0); width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y) to an opaque colour.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = to_pixel(color);
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[Vec4] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Mutable pixel storage, for splitting into disjoint row ranges.
    pub fn pixels_mut(&mut self) -> &mut [Vec4] {
        &mut self.pixels
    }

    /// Copy a block of rows starting at row `y`. Rows past the bottom are
    /// dropped.
    pub fn write_rows(&mut self, y: u32, pixels: &[Vec4]) {
        let start = self.index(0, y).min(self.pixels.len());
        let end = (start + pixels.len()).min(self.pixels.len());
        self.pixels[start..end].copy_from_slice(&pixels[..end - start]);
    }

    /// Convert to RGBA bytes (for display or saving). Values are clamped to [0, 1].
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.to_array())
            .map(|c| (255.0 * c.clamp(0.0, 1.0)).round() as u8)
            .collect()
    }
}

/// Opaque f32 pixel from an f64 colour.
#[inline]
pub fn to_pixel(color: Color) -> Vec4 {
    Vec4::new(color.x as f32, color.y as f32, color.z as f32, 1.0)
}
