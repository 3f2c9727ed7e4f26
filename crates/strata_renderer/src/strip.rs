//! Strip-based work partitioning.
//!
//! Divides the image into full-width horizontal strips that can be
//! rendered independently and in parallel.

use strata_core::TileOrder;
use strata_math::Vec4;

/// Preferred strip heights, tried in order.
pub const STEP_CANDIDATES: [u32; 10] = [32, 25, 24, 20, 16, 12, 10, 8, 5, 4];

/// A band of full-width rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    /// First row of the strip (row 0 is the top of the image)
    pub y: u32,
    /// Number of rows
    pub height: u32,
    /// Position in top-to-bottom order, independent of render order
    pub index: usize,
}

impl Strip {
    /// Rows covered, as a half-open range.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.y..self.y + self.height
    }
}

/// Strip height for an image `height` rows tall.
///
/// The first candidate that divides the height wins. Otherwise the largest
/// candidate that fits is used and the last strip comes out shorter.
/// Images shorter than the smallest candidate render as a single strip.
pub fn step_height(height: u32) -> u32 {
    if height < STEP_CANDIDATES[STEP_CANDIDATES.len() - 1] {
        return height.max(1);
    }
    STEP_CANDIDATES
        .iter()
        .copied()
        .find(|c| height % c == 0)
        .or_else(|| STEP_CANDIDATES.iter().copied().find(|c| *c <= height))
        .unwrap_or(height)
}

/// Generate strips covering `height` rows, `step` rows each.
pub fn generate_strips(height: u32, step: u32, order: TileOrder) -> Vec<Strip> {
    let step = step.max(1);
    let mut strips: Vec<Strip> = (0..height)
        .step_by(step as usize)
        .enumerate()
        .map(|(index, y)| Strip {
            y,
            height: step.min(height - y),
            index,
        })
        .collect();

    if order == TileOrder::Spiral {
        sort_spiral(&mut strips, height);
    }
    strips
}

/// Sort strips by distance from the image centre (centre-out order).
///
/// Strips closer to the centre are rendered first, so a preview shows the
/// most visually important part of the image early.
fn sort_spiral(strips: &mut [Strip], height: u32) {
    let center = height as f64 / 2.0;
    let distance = |s: &Strip| (s.y as f64 + s.height as f64 / 2.0 - center).abs();
    strips.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Result of rendering a strip.
#[derive(Debug, Clone)]
pub struct StripResult {
    /// The strip that was rendered
    pub strip: Strip,
    /// Image width in pixels
    pub width: u32,
    /// Pixel colours in row-major order within the strip
    pub pixels: Vec<Vec4>,
}
