//! Sphere primitive for ray tracing.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::RngCore;
use strata_core::Texture;
use strata_math::sampling::random_to_sphere;
use strata_math::{Aabb, Interval, Onb, Ray, Vec3};

use crate::hittable::{Hit, HitRecord, Hittable};
use crate::{FlipNormals, Material};

/// A sphere whose centre may move linearly during the shutter interval.
pub struct Sphere {
    center0: Vec3,
    center1: Vec3,
    time0: f64,
    time1: f64,
    radius: f64,
    material: Arc<Material>,
}

impl Sphere {
    /// Create a new static sphere.
    pub fn new(center: Vec3, radius: f64, material: Arc<Material>) -> Self {
        Self::moving(center, center, 0.0, 1.0, radius, material)
    }

    /// Create a sphere travelling from `center0` at `time0` to `center1` at `time1`.
    pub fn moving(
        center0: Vec3,
        center1: Vec3,
        time0: f64,
        time1: f64,
        radius: f64,
        material: Arc<Material>,
    ) -> Self {
        Self {
            center0,
            center1,
            time0,
            time1,
            radius: radius.max(0.0),
            material,
        }
    }

    /// Inward-facing emissive sphere surrounding the scene, lit by `texture`.
    pub fn sky_dome(center: Vec3, radius: f64, texture: Arc<dyn Texture>) -> FlipNormals {
        let light = Arc::new(Material::diffuse_light_texture(texture));
        FlipNormals::new(Arc::new(Sphere::new(center, radius, light)))
    }

    /// Centre position at `time`.
    pub fn center(&self, time: f64) -> Vec3 {
        let span = self.time1 - self.time0;
        if span == 0.0 {
            return self.center0;
        }
        self.center0 + (self.center1 - self.center0) * ((time - self.time0) / span)
    }

    /// UV coordinates for a point on the unit sphere centered at the origin.
    fn get_sphere_uv(p: Vec3) -> (f64, f64) {
        // theta: angle down from +Y, phi: angle around Y from -X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let center = self.center(ray.time());
        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.point_at(root) - center) / self.radius;
        let (u, v) = Self::get_sphere_uv(outward_normal);
        let rec = HitRecord::new(ray, root, outward_normal, u, v);
        Some((rec, self.material.as_ref()))
    }

    /// Edge along the silhouette, where the ray grazes the surface with a
    /// cosine below `width`.
    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let hit = self.hit(ray, ray_t)?;
        let cosine = ray.direction().normalize_or_zero().dot(hit.0.normal).abs();
        Some((hit, cosine < width))
    }

    fn bounding_box(&self, time0: f64, time1: f64) -> Option<Aabb> {
        let rvec = Vec3::splat(self.radius);
        let (c0, c1) = (self.center(time0), self.center(time1));
        let box0 = Aabb::from_points(c0 - rvec, c0 + rvec);
        let box1 = Aabb::from_points(c1 - rvec, c1 + rvec);
        Some(Aabb::surrounding(&box0, &box1))
    }

    /// Uniform density over the cone the sphere subtends from `origin`.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        let ray = Ray::new(origin, direction, 0.0);
        if self.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none() {
            return 0.0;
        }
        let to_center = self.center(0.0) - origin;
        let ratio = self.radius * self.radius / to_center.length_squared();
        if ratio >= 1.0 {
            // Inside the sphere `random` degenerates to the hemisphere facing
            // the centre
            return if direction.dot(to_center) > 0.0 {
                1.0 / (2.0 * PI)
            } else {
                0.0
            };
        }
        let cos_theta_max = (1.0 - ratio).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        1.0 / solid_angle
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center(0.0) - origin;
        let distance_squared = direction.length_squared();
        let uvw = Onb::from_w(direction);
        uvw.local(random_to_sphere(self.radius, distance_squared, rng))
    }

    fn is_emitter(&self) -> bool {
        self.material.is_emitter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use strata_math::Color;

    fn grey() -> Arc<Material> {
        Arc::new(Material::lambertian(Color::splat(0.5)))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);

        let (rec, _) = sphere.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 0.5).abs() < 1e-9); // Should hit at t=0.5
        assert_eq!(rec.normal, Vec3::Z);
        assert!(rec.front_face);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey());

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), 0.0);
        assert!(sphere.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        let (rec, _) = sphere.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-9);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::X);
    }

    #[test]
    fn test_moving_sphere() {
        let sphere = Sphere::moving(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 0.0, 1.0, 1.0, grey());
        assert_eq!(sphere.center(0.5), Vec3::new(2.0, 0.0, 0.0));

        let bbox = sphere.bounding_box(0.0, 1.0).unwrap();
        assert_eq!(bbox.min(), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bbox.max(), Vec3::new(5.0, 1.0, 1.0));

        // At time 1 the sphere sits at x=4
        let ray = Ray::new(Vec3::new(4.0, 0.0, 5.0), -Vec3::Z, 1.0);
        assert!(sphere.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_some());
        let early = Ray::new(Vec3::new(4.0, 0.0, 5.0), -Vec3::Z, 0.0);
        assert!(sphere.hit(&early, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_sphere_silhouette_edge() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, grey());
        let unbounded = Interval::new(0.001, f64::INFINITY);
        let along_z = |x: f64| Ray::new(Vec3::new(x, 0.0, 0.0), -Vec3::Z, 0.0);

        assert!(!sphere.hit_edge(&along_z(0.0), unbounded, 0.2).unwrap().1);
        // At x = 0.99 the normal is almost perpendicular to the ray
        assert!(sphere.hit_edge(&along_z(0.99), unbounded, 0.2).unwrap().1);
        assert!(sphere.hit_edge(&along_z(1.5), unbounded, 0.2).is_none());
    }

    #[test]
    fn test_sphere_light_pdf() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, grey());
        let origin = Vec3::ZERO;
        let mut rng = StdRng::seed_from_u64(42);

        let cos_max = (1.0 - 1.0 / 16.0f64).sqrt();
        let expected = 1.0 / (2.0 * PI * (1.0 - cos_max));
        for _ in 0..100 {
            let dir = sphere.random(origin, &mut rng);
            let pdf = sphere.pdf_value(origin, dir);
            assert!((pdf - expected).abs() < 1e-6 * expected);
        }
        assert_eq!(sphere.pdf_value(origin, Vec3::Z), 0.0);
    }

    #[test]
    fn test_sky_dome_emits_inward() {
        use strata_core::ConstantTexture;

        let dome = Sphere::sky_dome(
            Vec3::ZERO,
            100.0,
            Arc::new(ConstantTexture::new(Color::new(0.2, 0.3, 0.4))),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        let (rec, material) = dome.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();

        assert!(rec.front_face);
        assert_eq!(material.emitted(&ray, &rec), Color::new(0.2, 0.3, 0.4));
    }
}
