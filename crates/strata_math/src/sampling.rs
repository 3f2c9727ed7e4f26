//! Random sampling helpers.
//!
//! Every function takes the generator explicitly so callers decide which
//! stream a sample comes from.

use std::f64::consts::PI;

use rand::{Rng, RngCore};

use crate::Vec3;

/// Uniform f64 in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform point inside the unit sphere (rejection sampled).
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f64(rng) * 2.0 - 1.0,
            gen_f64(rng) * 2.0 - 1.0,
            gen_f64(rng) * 2.0 - 1.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform direction on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    let z = 1.0 - 2.0 * gen_f64(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f64(rng);
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform point inside the unit disk in the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f64(rng) * 2.0 - 1.0, gen_f64(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Cosine-weighted direction on the +Z hemisphere.
///
/// The density of the returned direction is `cos(theta) / pi`.
pub fn random_cosine_direction(rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f64(rng);
    let r2 = gen_f64(rng);
    let z = (1.0 - r2).sqrt();
    let phi = 2.0 * PI * r1;
    let r = r2.sqrt();
    Vec3::new(phi.cos() * r, phi.sin() * r, z)
}

/// Direction inside the cone subtended by a sphere of `radius` whose centre
/// lies `distance_squared` away along +Z. Uniform over the cone's solid angle.
pub fn random_to_sphere(radius: f64, distance_squared: f64, rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f64(rng);
    let r2 = gen_f64(rng);
    let cos_theta_max = (1.0 - radius * radius / distance_squared).max(0.0).sqrt();
    let z = 1.0 + r2 * (cos_theta_max - 1.0);
    let phi = 2.0 * PI * r1;
    let s = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(phi.cos() * s, phi.sin() * s, z)
}

/// Uniform barycentric coordinates `(b1, b2)` over a triangle.
pub fn uniform_triangle(rng: &mut dyn RngCore) -> (f64, f64) {
    let su = gen_f64(rng).sqrt();
    let r2 = gen_f64(rng);
    (1.0 - su, r2 * su)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_sphere_and_disk_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert!(random_in_unit_sphere(&mut rng).length_squared() < 1.0);
            let d = random_in_unit_disk(&mut rng);
            assert!(d.length_squared() < 1.0);
            assert_eq!(d.z, 0.0);
            assert!((random_unit_vector(&mut rng).length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cosine_direction_upper_hemisphere() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut mean_z = 0.0;
        let n = 20_000;
        for _ in 0..n {
            let d = random_cosine_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-9);
            assert!(d.z >= 0.0);
            mean_z += d.z;
        }
        // E[cos] under a cos/pi density is 2/3
        mean_z /= n as f64;
        assert!((mean_z - 2.0 / 3.0).abs() < 0.01, "mean cos = {}", mean_z);
    }

    #[test]
    fn test_random_to_sphere_stays_in_cone() {
        let mut rng = StdRng::seed_from_u64(3);
        let radius: f64 = 1.0;
        let dist_sq: f64 = 16.0;
        let cos_max = (1.0 - radius * radius / dist_sq).sqrt();
        for _ in 0..1000 {
            let d = random_to_sphere(radius, dist_sq, &mut rng);
            assert!(d.z >= cos_max - 1e-12);
            assert!((d.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uniform_triangle_inside() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let (b1, b2) = uniform_triangle(&mut rng);
            assert!(b1 >= 0.0 && b2 >= 0.0 && b1 + b2 <= 1.0 + 1e-12);
        }
    }
}
