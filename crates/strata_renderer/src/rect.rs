//! Axis-aligned rectangles.

use std::sync::Arc;

use rand::RngCore;
use strata_math::sampling::gen_f64;
use strata_math::{Aabb, Interval, Ray, Vec3};

use crate::hittable::{Hit, HitRecord, Hittable};
use crate::Material;

/// The plane a rectangle lies in, named by its two free axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    /// Axis indices as (first free axis, second free axis, fixed axis).
    fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::XZ => (0, 2, 1),
            Plane::YZ => (1, 2, 0),
        }
    }
}

/// A rectangle spanning `[a0, a1] x [b0, b1]` on the free axes at `k` on the
/// fixed axis. The outward normal points along the positive fixed axis.
pub struct AxisRect {
    plane: Plane,
    a0: f64,
    a1: f64,
    b0: f64,
    b1: f64,
    k: f64,
    material: Arc<Material>,
}

impl AxisRect {
    pub fn new(
        plane: Plane,
        (a0, a1): (f64, f64),
        (b0, b1): (f64, f64),
        k: f64,
        material: Arc<Material>,
    ) -> Self {
        Self {
            plane,
            a0: a0.min(a1),
            a1: a0.max(a1),
            b0: b0.min(b1),
            b1: b0.max(b1),
            k,
            material,
        }
    }

    pub fn xy(x: (f64, f64), y: (f64, f64), z: f64, material: Arc<Material>) -> Self {
        Self::new(Plane::XY, x, y, z, material)
    }

    pub fn xz(x: (f64, f64), z: (f64, f64), y: f64, material: Arc<Material>) -> Self {
        Self::new(Plane::XZ, x, z, y, material)
    }

    pub fn yz(y: (f64, f64), z: (f64, f64), x: f64, material: Arc<Material>) -> Self {
        Self::new(Plane::YZ, y, z, x, material)
    }

    pub fn area(&self) -> f64 {
        (self.a1 - self.a0) * (self.b1 - self.b0)
    }

    fn outward_normal(&self) -> Vec3 {
        let mut n = Vec3::ZERO;
        n[self.plane.axes().2] = 1.0;
        n
    }

    /// Assemble a world point from free-axis coordinates.
    fn point(&self, a: f64, b: f64) -> Vec3 {
        let (ia, ib, ik) = self.plane.axes();
        let mut p = Vec3::ZERO;
        p[ia] = a;
        p[ib] = b;
        p[ik] = self.k;
        p
    }
}

impl Hittable for AxisRect {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let (ia, ib, ik) = self.plane.axes();
        let origin = ray.origin();
        let direction = ray.direction();

        let t = (self.k - origin[ik]) / direction[ik];
        // A ray inside the plane divides to NaN and fails here as well
        if !ray_t.contains(t) {
            return None;
        }

        let a = origin[ia] + t * direction[ia];
        let b = origin[ib] + t * direction[ib];
        if a < self.a0 || a > self.a1 || b < self.b0 || b > self.b1 {
            return None;
        }

        let u = (a - self.a0) / (self.a1 - self.a0);
        let v = (b - self.b0) / (self.b1 - self.b0);
        let rec = HitRecord::new(ray, t, self.outward_normal(), u, v);
        Some((rec, self.material.as_ref()))
    }

    /// Edge when the hit is within `width` of a side, as a fraction of that
    /// side's length.
    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let hit = self.hit(ray, ray_t)?;
        let (u, v) = (hit.0.u, hit.0.v);
        let margin = u.min(1.0 - u).min(v).min(1.0 - v);
        Some((hit, margin < width))
    }

    fn bounding_box(&self, _time0: f64, _time1: f64) -> Option<Aabb> {
        // Aabb pads the zero-thickness axis
        Some(Aabb::from_points(
            self.point(self.a0, self.b0),
            self.point(self.a1, self.b1),
        ))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let ray = Ray::new(origin, direction, 0.0);
        let Some((rec, _)) = self.hit(&ray, Interval::new(0.001, f64::INFINITY)) else {
            return 0.0;
        };
        let length_squared = direction.length_squared();
        let distance_squared = rec.t * rec.t * length_squared;
        let cosine = (direction[self.plane.axes().2] / length_squared.sqrt()).abs();
        if cosine <= 0.0 {
            return 0.0;
        }
        distance_squared / (cosine * area)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let a = self.a0 + gen_f64(rng) * (self.a1 - self.a0);
        let b = self.b0 + gen_f64(rng) * (self.b1 - self.b0);
        self.point(a, b) - origin
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
    fn test_xz_rect_hit() {
        let rect = AxisRect::xz((-1.0, 1.0), (-2.0, 2.0), 3.0, grey());
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::Y, 0.0);

        let (rec, _) = rect.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 3.0).abs() < 1e-12);
        assert_eq!(rec.point, Vec3::new(0.5, 3.0, 1.0));
        // Hit from below, outward normal +Y
        assert!(!rec.front_face);
        assert_eq!(rec.normal, -Vec3::Y);
        assert!((rec.u - 0.75).abs() < 1e-12);
        assert!((rec.v - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rect_misses() {
        let rect = AxisRect::xy((0.0, 1.0), (0.0, 1.0), -2.0, grey());
        let unbounded = Interval::new(0.001, f64::INFINITY);

        let outside = Ray::new(Vec3::new(2.0, 0.5, 0.0), -Vec3::Z, 0.0);
        assert!(rect.hit(&outside, unbounded).is_none());

        let parallel = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::X, 0.0);
        assert!(rect.hit(&parallel, unbounded).is_none());

        let away = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::Z, 0.0);
        assert!(rect.hit(&away, unbounded).is_none());
    }

    #[test]
    fn test_yz_rect_front_face() {
        let rect = AxisRect::yz((0.0, 2.0), (0.0, 2.0), 1.0, grey());
        let ray = Ray::new(Vec3::new(5.0, 1.0, 1.0), -Vec3::X, 0.0);
        let (rec, _) = rect.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::X);
    }

    #[test]
    fn test_rect_edge() {
        let rect = AxisRect::xy((0.0, 4.0), (0.0, 2.0), -1.0, grey());
        let unbounded = Interval::new(0.001, f64::INFINITY);
        let toward = |x: f64, y: f64| Ray::new(Vec3::new(x, y, 0.0), -Vec3::Z, 0.0);

        assert!(!rect.hit_edge(&toward(2.0, 1.0), unbounded, 0.1).unwrap().1);
        // 0.3 of 4 is inside the band, 0.3 of 2 is not
        assert!(rect.hit_edge(&toward(0.3, 1.0), unbounded, 0.1).unwrap().1);
        assert!(!rect.hit_edge(&toward(2.0, 0.3), unbounded, 0.1).unwrap().1);
        assert!(rect.hit_edge(&toward(2.0, 1.9), unbounded, 0.1).unwrap().1);
        assert!(rect.hit_edge(&toward(5.0, 1.0), unbounded, 0.1).is_none());
    }

    #[test]
    fn test_rect_bounding_box_is_padded() {
        let rect = AxisRect::xz((-1.0, 1.0), (-1.0, 1.0), 2.0, grey());
        let bbox = rect.bounding_box(0.0, 1.0).unwrap();
        assert!(bbox.y.size() > 0.0);
        assert!(bbox.y.contains(2.0));
        assert_eq!(bbox.x, Interval::new(-1.0, 1.0));
    }

    #[test]
    fn test_rect_light_pdf() {
        let light = AxisRect::xz(
            (-1.0, 1.0),
            (-1.0, 1.0),
            2.0,
            Arc::new(Material::diffuse_light(Color::ONE)),
        );
        assert!(light.is_emitter());

        // Straight up: dist 2, cos 1, area 4
        assert!((light.pdf_value(Vec3::ZERO, Vec3::Y) - 1.0).abs() < 1e-12);
        assert_eq!(light.pdf_value(Vec3::ZERO, -Vec3::Y), 0.0);

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let d = light.random(Vec3::ZERO, &mut rng);
            assert!((d.y - 2.0).abs() < 1e-12);
            assert!(d.x.abs() <= 1.0 && d.z.abs() <= 1.0);
            assert!(light.pdf_value(Vec3::ZERO, d) > 0.0);
        }
    }
}
