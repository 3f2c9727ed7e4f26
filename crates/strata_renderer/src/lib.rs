//! Strata Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer for physically-based rendering: a BVH over
//! analytic primitives, importance-sampled materials, a multiple importance
//! sampling integrator and a strip scheduler running on a rayon pool.
//!
//! The [`Worker`] state machine exposes the same engine to a distributed
//! leader, one tile at a time.

mod bvh;
mod camera;
mod canvas;
mod constant_medium;
mod cuboid;
mod error;
mod hittable;
mod instance;
mod integrator;
mod material;
mod pdf;
mod rect;
mod renderer;
mod scene;
mod sphere;
mod strip;
mod triangle;
mod worker;

pub use bvh::BvhNode;
pub use camera::Camera;
pub use canvas::{to_pixel, Canvas};
pub use constant_medium::ConstantMedium;
pub use cuboid::Cuboid;
pub use error::{RenderError, RenderResult, SceneError, SceneResult};
pub use hittable::{Hit, HitRecord, Hittable, HittableList};
pub use instance::{FlipNormals, RotateY, Translate};
pub use integrator::{
    sampler_for, AlbedoSampler, NormalSampler, PathTracer, Sampler, WireFrameSampler, T_MIN,
};
pub use material::{reflect, refract, schlick, Material, PbrMaterial, ScatterRecord};
pub use pdf::{CosinePdf, HittablePdf, MaterialPdf, MixturePdf, PbrPdf, Pdf};
pub use rect::{AxisRect, Plane};
pub use renderer::{render, render_pixel, render_with_preview};
pub use scene::Scene;
pub use sphere::Sphere;
pub use strip::{generate_strips, step_height, Strip, StripResult, STEP_CANDIDATES};
pub use triangle::Triangle;
pub use worker::{
    RenderStats, SetupStatus, TileChunk, TileOutcome, TileRequest, Worker, WorkerStatus,
    WorkerStatusReport,
};

/// Re-export Vec3 and common math types from strata_math
pub use strata_math::{Aabb, Color, Interval, Ray, Vec3};
