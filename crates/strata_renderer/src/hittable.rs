//! Hittable trait and HitRecord for ray-object intersection.

use std::sync::Arc;

use rand::{Rng, RngCore};
use strata_math::{Aabb, Interval, Ray, Vec3};

use crate::Material;

/// Record of a ray-object intersection.
///
/// Only ever built for a confirmed hit inside the caller's interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// UV texture coordinates
    pub u: f64,
    pub v: f64,
    /// Point of intersection
    pub point: Vec3,
    /// Unit surface normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Whether the ray hit the front (outward) side of the surface
    pub front_face: bool,
}

impl HitRecord {
    /// Build a record at `t` along `ray` from the geometric outward normal.
    ///
    /// The stored normal is flipped to face the ray, and `front_face`
    /// remembers which side was struck.
    pub fn new(ray: &Ray, t: f64, outward_normal: Vec3, u: f64, v: f64) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };
        Self {
            t,
            u,
            v,
            point: ray.point_at(t),
            normal,
            front_face,
        }
    }
}

/// A successful hit: the record plus the material at the hit point.
pub type Hit<'a> = (HitRecord, &'a Material);

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `t` inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>>;

    /// Box enclosing the object over the shutter interval `[time0, time1]`.
    ///
    /// `None` for unbounded objects.
    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb>;

    /// Nearest intersection, flagged when it lies within `width` of the
    /// primitive's outline.
    ///
    /// `width` is relative to the primitive: a barycentric margin for
    /// triangles, a fraction of the side for rectangles, and the cosine
    /// between ray and normal for spheres. Objects without edges never flag.
    fn hit_edge(&self, ray: &Ray, ray_t: Interval, _width: f64) -> Option<(Hit<'_>, bool)> {
        self.hit(ray, ray_t).map(|hit| (hit, false))
    }

    /// Solid-angle density of sampling `direction` from `origin` towards
    /// this object. Zero for objects that cannot be importance sampled.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f64 {
        0.0
    }

    /// Direction from `origin` towards a random point on this object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }

    /// True if the object emits light and should be sampled directly.
    fn is_emitter(&self) -> bool {
        false
    }
}

/// A list of hittable objects, scanned linearly.
///
/// Used for small light sets and as the input to BVH construction.
#[derive(Clone, Default)]
pub struct HittableList {
    objects: Vec<Arc<dyn Hittable>>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        self.objects.push(object);
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Arc<dyn Hittable>] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<Arc<dyn Hittable>> {
        self.objects
    }
}

impl From<Vec<Arc<dyn Hittable>>> for HittableList {
    fn from(objects: Vec<Arc<dyn Hittable>>) -> Self {
        Self { objects }
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let mut closest: Option<Hit<'_>> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(hit) = object.hit(ray, ray_t.with_max(closest_so_far)) {
                closest_so_far = hit.0.t;
                closest = Some(hit);
            }
        }

        closest
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let mut closest = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some((hit, edge)) = object.hit_edge(ray, ray_t.with_max(closest_so_far), width)
            {
                closest_so_far = hit.0.t;
                closest = Some((hit, edge));
            }
        }

        closest
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        let (first, rest) = self.objects.split_first()?;
        let mut bbox = first.bounding_box(time0, time1)?;
        for object in rest {
            bbox = Aabb::surrounding(&bbox, &object.bounding_box(time0, time1)?);
        }
        Some(bbox)
    }

    /// Average of the members' densities, matching uniform member choice in `random`.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f64;
        self.objects
            .iter()
            .map(|o| weight * o.pdf_value(origin, direction))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let index = rng.gen_range(0..self.objects.len());
        self.objects[index].random(origin, rng)
    }

    fn is_emitter(&self) -> bool {
        self.objects.iter().any(|o| o.is_emitter())
    }
}
