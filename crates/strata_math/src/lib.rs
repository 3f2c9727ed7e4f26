// Re-export the glam types the engine is built on. Geometry runs in f64,
// image pixels are stored as f32 RGBA.
pub use glam::{DMat3, DVec2, DVec3, Vec4};

/// 3-component double precision vector used for points, directions and colours.
pub type Vec3 = DVec3;

mod aabb;
mod color;
mod interval;
mod onb;
mod ray;
mod rng;
pub mod sampling;
mod transform;

pub use aabb::Aabb;
pub use color::{gamma_encode, sanitize, Color};
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use rng::{strip_rngs, StrataRng};
pub use transform::RotationExt;
