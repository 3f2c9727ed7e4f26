//! Transform wrappers around other hittables.
//!
//! Rays are moved into the wrapped object's local space, intersected there,
//! and the hit is mapped back to world space. The wrapped geometry is
//! shared, so one prototype can be placed many times.

use std::sync::Arc;

use rand::RngCore;
use strata_math::{Aabb, DMat3, Interval, Ray, RotationExt, Vec3};

use crate::hittable::{Hit, Hittable};

/// Offset an object by a fixed vector.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        Self { object, offset }
    }
}

impl Translate {
    fn to_local(&self, ray: &Ray) -> Ray {
        ray.spawn(ray.origin() - self.offset, ray.direction())
    }

    fn to_world<'a>(&self, (mut rec, material): Hit<'a>) -> Hit<'a> {
        rec.point += self.offset;
        (rec, material)
    }
}

impl Hittable for Translate {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let hit = self.object.hit(&self.to_local(ray), ray_t)?;
        Some(self.to_world(hit))
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let (hit, edge) = self.object.hit_edge(&self.to_local(ray), ray_t, width)?;
        Some((self.to_world(hit), edge))
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.object
            .bounding_box(time0, time1)
            .map(|bbox| bbox.translate(self.offset))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.object.pdf_value(origin - self.offset, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin - self.offset, rng)
    }

    fn is_emitter(&self) -> bool {
        self.object.is_emitter()
    }
}

/// Rotate an object about the Y axis through the origin.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    /// Local-to-world rotation
    rotation: DMat3,
    /// World-to-local rotation
    inverse: DMat3,
}

impl RotateY {
    pub fn new(object: Arc<dyn Hittable>, degrees: f64) -> Self {
        let rotation = DMat3::from_rotation_y(degrees.to_radians());
        Self {
            object,
            rotation,
            inverse: rotation.transpose(),
        }
    }
}

impl RotateY {
    fn to_local(&self, ray: &Ray) -> Ray {
        ray.spawn(self.inverse * ray.origin(), self.inverse * ray.direction())
    }

    fn to_world<'a>(&self, (mut rec, material): Hit<'a>) -> Hit<'a> {
        // Rotation preserves which side the ray came from
        rec.point = self.rotation * rec.point;
        rec.normal = self.rotation * rec.normal;
        (rec, material)
    }
}

impl Hittable for RotateY {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let hit = self.object.hit(&self.to_local(ray), ray_t)?;
        Some(self.to_world(hit))
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let (hit, edge) = self.object.hit_edge(&self.to_local(ray), ray_t, width)?;
        Some((self.to_world(hit), edge))
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.object
            .bounding_box(time0, time1)
            .map(|bbox| self.rotation.transform_aabb(&bbox))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.object
            .pdf_value(self.inverse * origin, self.inverse * direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.rotation * self.object.random(self.inverse * origin, rng)
    }

    fn is_emitter(&self) -> bool {
        self.object.is_emitter()
    }
}

/// Swap the front and back faces of an object.
///
/// Used to turn one-sided lights and domes towards the scene.
pub struct FlipNormals {
    object: Arc<dyn Hittable>,
}

impl FlipNormals {
    pub fn new(object: Arc<dyn Hittable>) -> Self {
        Self { object }
    }
}

impl Hittable for FlipNormals {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let (mut rec, material) = self.object.hit(ray, ray_t)?;
        rec.front_face = !rec.front_face;
        Some((rec, material))
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let ((mut rec, material), edge) = self.object.hit_edge(ray, ray_t, width)?;
        rec.front_face = !rec.front_face;
        Some(((rec, material), edge))
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.object.bounding_box(time0, time1)
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.object.pdf_value(origin, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin, rng)
    }

    fn is_emitter(&self) -> bool {
        self.object.is_emitter()
    }
}
