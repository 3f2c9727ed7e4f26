//! Homogeneous participating media (smoke, fog).

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_xoshiro::SplitMix64;
use strata_core::Texture;
use strata_math::{Aabb, Interval, Ray, Vec3};

use crate::hittable::{Hit, HitRecord, Hittable};
use crate::Material;

/// A volume of constant density bounded by a closed surface.
///
/// A ray travelling through the volume scatters after an exponentially
/// distributed free-flight distance. The distance is drawn from a generator
/// seeded by the ray itself, so the same ray always scatters at the same
/// point and the medium needs no mutable state.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f64,
    phase_function: Arc<Material>,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f64, albedo: Arc<dyn Texture>) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Arc::new(Material::isotropic(albedo)),
        }
    }

    fn free_flight_distance(&self, ray: &Ray) -> f64 {
        let mut rng = SplitMix64::seed_from_u64(ray_seed(ray));
        // 1 - U lies in (0, 1], keeping ln finite
        let xi: f64 = 1.0 - rng.gen::<f64>();
        self.neg_inv_density * xi.ln()
    }
}

fn ray_seed(ray: &Ray) -> u64 {
    let o = ray.origin();
    let d = ray.direction();
    [o.x, o.y, o.z, d.x, d.y, d.z, ray.time()]
        .iter()
        .fold(0xcbf2_9ce4_8422_2325u64, |hash, v| {
            (hash ^ v.to_bits()).wrapping_mul(0x0100_0000_01b3).rotate_left(17)
        })
}

impl Hittable for ConstantMedium {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let (rec1, _) = self.boundary.hit(ray, Interval::UNIVERSE)?;
        let (rec2, _) = self
            .boundary
            .hit(ray, Interval::new(rec1.t + 0.0001, f64::INFINITY))?;

        let t_enter = rec1.t.max(ray_t.min).max(0.0);
        let t_exit = rec2.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }

        let ray_length = ray.direction().length();
        let distance_inside_boundary = (t_exit - t_enter) * ray_length;
        let hit_distance = self.free_flight_distance(ray);
        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        let rec = HitRecord {
            t,
            u: 0.0,
            v: 0.0,
            point: ray.point_at(t),
            normal: Vec3::X, // arbitrary
            front_face: true,
        };
        Some((rec, self.phase_function.as_ref()))
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        self.boundary.bounding_box(time0, time1)
    }
}
