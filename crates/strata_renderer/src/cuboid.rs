//! Axis-aligned box built from six rectangles.

use std::sync::Arc;

use rand::RngCore;
use strata_math::{Aabb, Interval, Ray, Vec3};

use crate::hittable::{Hit, Hittable, HittableList};
use crate::{AxisRect, FlipNormals, Material};

/// A closed box with outward-facing sides.
pub struct Cuboid {
    min: Vec3,
    max: Vec3,
    sides: HittableList,
}

impl Cuboid {
    /// Box between two opposite corners, given in any order.
    pub fn new(a: Vec3, b: Vec3, material: Arc<Material>) -> Self {
        let (min, max) = (a.min(b), a.max(b));
        let mut sides = HittableList::new();
        let m = || material.clone();

        // Rectangles face +axis, so the min-side faces get flipped
        sides.add(Arc::new(AxisRect::xy((min.x, max.x), (min.y, max.y), max.z, m())));
        sides.add(Arc::new(FlipNormals::new(Arc::new(AxisRect::xy(
            (min.x, max.x),
            (min.y, max.y),
            min.z,
            m(),
        )))));
        sides.add(Arc::new(AxisRect::xz((min.x, max.x), (min.z, max.z), max.y, m())));
        sides.add(Arc::new(FlipNormals::new(Arc::new(AxisRect::xz(
            (min.x, max.x),
            (min.z, max.z),
            min.y,
            m(),
        )))));
        sides.add(Arc::new(AxisRect::yz((min.y, max.y), (min.z, max.z), max.x, m())));
        sides.add(Arc::new(FlipNormals::new(Arc::new(AxisRect::yz(
            (min.y, max.y),
            (min.z, max.z),
            min.x,
            m(),
        )))));

        Self { min, max, sides }
    }
}

impl Hittable for Cuboid {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        self.sides.hit(ray, ray_t)
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        self.sides.hit_edge(ray, ray_t, width)
    }

    fn bounding_box(&self, _time0: f64, _time1: f64) -> Option<Aabb> {
        Some(Aabb::from_points(self.min, self.max))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.sides.pdf_value(origin, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.sides.random(origin, rng)
    }

    fn is_emitter(&self) -> bool {
        self.sides.is_emitter()
    }
}
