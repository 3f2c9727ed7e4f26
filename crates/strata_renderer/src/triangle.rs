//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use std::sync::Arc;

use rand::RngCore;
use strata_math::sampling::uniform_triangle;
use strata_math::{Aabb, DVec2, Interval, Ray, Vec3};

use crate::hittable::{Hit, HitRecord, Hittable};
use crate::Material;

/// Tolerance for the parallel test and the minimum accepted `t`.
const EPSILON: f64 = 1e-8;

/// A triangle primitive.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Texture coordinates at each vertex
    uvs: [DVec2; 3],
    /// Optional per-vertex normals for smooth shading
    normals: Option<[Vec3; 3]>,
    /// Pre-computed face normal (unit length, by winding order)
    normal: Vec3,
    area: f64,
    material: Arc<Material>,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<Material>) -> Self {
        let cross = (v1 - v0).cross(v2 - v0);
        Self {
            v0,
            v1,
            v2,
            uvs: [DVec2::ZERO, DVec2::X, DVec2::Y],
            normals: None,
            normal: cross.normalize_or_zero(),
            area: 0.5 * cross.length(),
            material,
        }
    }

    /// Set per-vertex texture coordinates.
    pub fn with_uvs(mut self, uv0: DVec2, uv1: DVec2, uv2: DVec2) -> Self {
        self.uvs = [uv0, uv1, uv2];
        self
    }

    /// Set per-vertex normals (for smooth shading).
    pub fn with_vertex_normals(mut self, n0: Vec3, n1: Vec3, n2: Vec3) -> Self {
        self.normals = Some([n0.normalize(), n1.normalize(), n2.normalize()]);
        self
    }

    pub fn area(&self) -> f64 {
        self.area
    }
}

impl Triangle {
    /// Möller-Trumbore intersection, returning the hit with its
    /// barycentric coordinates `(u, v)` for vertices 1 and 2.
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<(Hit<'_>, f64, f64)> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t <= EPSILON || !ray_t.contains(t) {
            return None;
        }

        let w = 1.0 - u - v;
        let uv = w * self.uvs[0] + u * self.uvs[1] + v * self.uvs[2];
        let mut rec = HitRecord::new(ray, t, self.normal, uv.x, uv.y);

        if let Some([n0, n1, n2]) = self.normals {
            let shading = (w * n0 + u * n1 + v * n2).normalize_or_zero();
            if shading != Vec3::ZERO {
                rec.normal = if rec.front_face { shading } else { -shading };
            }
        }

        Some(((rec, self.material.as_ref()), u, v))
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        self.intersect(ray, ray_t).map(|(hit, _, _)| hit)
    }

    /// Edge when the smallest barycentric coordinate is below `width`.
    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        let (hit, u, v) = self.intersect(ray, ray_t)?;
        let margin = u.min(v).min(1.0 - u - v);
        Some((hit, margin < width))
    }

    fn bounding_box(&self, _time0: f64, _time1: f64) -> Option<Aabb> {
        Aabb::enclosing(&[self.v0, self.v1, self.v2])
    }

    /// Area-to-solid-angle conversion: `dist² / (|cos| * area)`.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        if self.area <= 0.0 {
            return 0.0;
        }
        let ray = Ray::new(origin, direction, 0.0);
        let Some((rec, _)) = self.hit(&ray, Interval::new(0.001, f64::INFINITY)) else {
            return 0.0;
        };
        let length_squared = direction.length_squared();
        let distance_squared = rec.t * rec.t * length_squared;
        let cosine = (direction.dot(self.normal) / length_squared.sqrt()).abs();
        if cosine <= 0.0 {
            return 0.0;
        }
        distance_squared / (cosine * self.area)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let (b1, b2) = uniform_triangle(rng);
        let point = self.v0 + b1 * (self.v1 - self.v0) + b2 * (self.v2 - self.v0);
        point - origin
    }

    fn is_emitter(&self) -> bool {
        self.material.is_emitter()
    }
}
