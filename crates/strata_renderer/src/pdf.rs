//! Probability density functions over directions.
//!
//! The integrator draws its next bounce from a [`Pdf`] and divides by the
//! density of the drawn direction.

use std::f64::consts::PI;

use rand::RngCore;
use strata_math::sampling::{gen_f64, random_cosine_direction};
use strata_math::{Onb, Vec3};

use crate::hittable::Hittable;

/// A density over directions that can also be sampled.
pub trait Pdf {
    /// Density of `direction` per unit solid angle. Never negative.
    fn value(&self, direction: Vec3) -> f64;

    /// Draw a direction distributed according to this density.
    fn generate(&self, rng: &mut dyn RngCore) -> Vec3;
}

/// Cosine-weighted hemisphere around a normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(w: Vec3) -> Self {
        Self { uvw: Onb::from_w(w) }
    }
}

impl Pdf for CosinePdf {
    fn value(&self, direction: Vec3) -> f64 {
        let cosine = direction.normalize_or_zero().dot(self.uvw.w);
        cosine.max(0.0) / PI
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.uvw.local(random_cosine_direction(rng))
    }
}

/// Directions from `origin` towards a hittable, usually the light set.
pub struct HittablePdf<'a> {
    origin: Vec3,
    target: &'a dyn Hittable,
}

impl<'a> HittablePdf<'a> {
    pub fn new(target: &'a dyn Hittable, origin: Vec3) -> Self {
        Self { origin, target }
    }
}

impl Pdf for HittablePdf<'_> {
    fn value(&self, direction: Vec3) -> f64 {
        self.target.pdf_value(self.origin, direction).max(0.0)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.target.random(self.origin, rng)
    }
}

/// Equal-weight blend of two densities.
pub struct MixturePdf<'a> {
    pdfs: [&'a dyn Pdf; 2],
}

impl<'a> MixturePdf<'a> {
    pub fn new(p0: &'a dyn Pdf, p1: &'a dyn Pdf) -> Self {
        Self { pdfs: [p0, p1] }
    }
}

impl Pdf for MixturePdf<'_> {
    fn value(&self, direction: Vec3) -> f64 {
        0.5 * self.pdfs[0].value(direction) + 0.5 * self.pdfs[1].value(direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f64(rng) < 0.5 {
            self.pdfs[0].generate(rng)
        } else {
            self.pdfs[1].generate(rng)
        }
    }
}

/// Lobe mixture used by the PBR material.
///
/// A normalised Phong lobe around the mirror direction mixed with a cosine
/// lobe around the shading normal. The lobe weights follow the material's
/// own branch probabilities: metalness first, then Fresnel reflectance.
#[derive(Debug, Clone, Copy)]
pub struct PbrPdf {
    normal: Onb,
    reflected: Onb,
    exponent: f64,
    specular_weight: f64,
}

impl PbrPdf {
    /// `reflected` is the mirror direction, `roughness` in [0, 1].
    pub fn new(
        normal: Vec3,
        reflected: Vec3,
        roughness: f64,
        metalness: f64,
        reflectance: f64,
    ) -> Self {
        let metalness = metalness.clamp(0.0, 1.0);
        let reflectance = reflectance.clamp(0.0, 1.0);
        Self {
            normal: Onb::from_w(normal),
            reflected: Onb::from_w(reflected),
            exponent: phong_exponent(roughness),
            specular_weight: metalness + (1.0 - metalness) * reflectance,
        }
    }

    fn specular_value(&self, direction: Vec3) -> f64 {
        let cos_alpha = direction.dot(self.reflected.w).max(0.0);
        (self.exponent + 1.0) / (2.0 * PI) * cos_alpha.powf(self.exponent)
    }
}

/// Phong exponent matching a GGX-style roughness: `2 / r² - 2`.
pub(crate) fn phong_exponent(roughness: f64) -> f64 {
    let r = roughness.max(0.001);
    (2.0 / (r * r) - 2.0).max(0.0)
}

impl Pdf for PbrPdf {
    fn value(&self, direction: Vec3) -> f64 {
        let direction = direction.normalize_or_zero();
        let cos_normal = direction.dot(self.normal.w);
        if cos_normal <= 0.0 {
            return 0.0;
        }
        let diffuse = cos_normal / PI;
        let specular = self.specular_value(direction);
        self.specular_weight * specular + (1.0 - self.specular_weight) * diffuse
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f64(rng) < self.specular_weight {
            let cos_alpha = gen_f64(rng).powf(1.0 / (self.exponent + 1.0));
            let sin_alpha = (1.0 - cos_alpha * cos_alpha).max(0.0).sqrt();
            let phi = 2.0 * PI * gen_f64(rng);
            self.reflected.local(Vec3::new(
                phi.cos() * sin_alpha,
                phi.sin() * sin_alpha,
                cos_alpha,
            ))
        } else {
            self.normal.local(random_cosine_direction(rng))
        }
    }
}

/// The density a non-specular material hands to the integrator.
#[derive(Debug, Clone, Copy)]
pub enum MaterialPdf {
    Cosine(CosinePdf),
    Pbr(PbrPdf),
}

impl Pdf for MaterialPdf {
    fn value(&self, direction: Vec3) -> f64 {
        match self {
            MaterialPdf::Cosine(pdf) => pdf.value(direction),
            MaterialPdf::Pbr(pdf) => pdf.value(direction),
        }
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            MaterialPdf::Cosine(pdf) => pdf.generate(rng),
            MaterialPdf::Pbr(pdf) => pdf.generate(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use strata_math::sampling::random_unit_vector;
    use strata_math::Color;

    /// Monte Carlo estimate of the integral of `pdf` over the sphere.
    fn integrate(pdf: &dyn Pdf, samples: usize, rng: &mut StdRng) -> f64 {
        let sum: f64 = (0..samples).map(|_| pdf.value(random_unit_vector(rng))).sum();
        4.0 * PI * sum / samples as f64
    }

    fn light_sphere() -> Sphere {
        Sphere::new(
            Vec3::new(0.0, 5.0, 0.0),
            1.0,
            Arc::new(Material::diffuse_light(Color::ONE)),
        )
    }

    #[test]
    fn test_cosine_pdf() {
        let pdf = CosinePdf::new(Vec3::Y);
        assert!((pdf.value(Vec3::Y) - 1.0 / PI).abs() < 1e-12);
        assert_eq!(pdf.value(-Vec3::Y), 0.0);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let d = pdf.generate(&mut rng);
            assert!(d.y >= 0.0);
            assert!(pdf.value(d) >= 0.0);
        }
        let total = integrate(&pdf, 200_000, &mut rng);
        assert!((total - 1.0).abs() < 0.02, "integral = {}", total);
    }

    #[test]
    fn test_hittable_pdf_delegates() {
        let sphere = light_sphere();
        let pdf = HittablePdf::new(&sphere, Vec3::ZERO);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let d = pdf.generate(&mut rng);
            assert!(d.y > 0.0);
            assert_eq!(pdf.value(d), sphere.pdf_value(Vec3::ZERO, d));
            assert!(pdf.value(d) > 0.0);
        }
        assert_eq!(pdf.value(-Vec3::Y), 0.0);
    }

    #[test]
    fn test_mixture_is_exact_average() {
        let sphere = light_sphere();
        let light = HittablePdf::new(&sphere, Vec3::ZERO);
        let cosine = CosinePdf::new(Vec3::Y);
        let mixture = MixturePdf::new(&light, &cosine);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let d = mixture.generate(&mut rng);
            let expected = 0.5 * light.value(d) + 0.5 * cosine.value(d);
            assert_eq!(mixture.value(d), expected);
            assert!(mixture.value(d) >= 0.0);
        }
    }

    #[test]
    fn test_pbr_pdf_non_negative_and_normalised() {
        let normal = Vec3::Y;
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let reflected = incoming - 2.0 * incoming.dot(normal) * normal;
        let mut rng = StdRng::seed_from_u64(3);

        for (roughness, metalness) in [(0.2, 0.0), (0.5, 0.5), (0.9, 1.0)] {
            let pdf = PbrPdf::new(normal, reflected, roughness, metalness, 0.04);
            for _ in 0..500 {
                let d = pdf.generate(&mut rng);
                assert!(pdf.value(d) >= 0.0);
            }
            // Lobes that dip below the surface lose mass, never gain it
            let total = integrate(&pdf, 200_000, &mut rng);
            assert!(total <= 1.05, "integral = {} for r={}", total, roughness);
            assert!(total > 0.5, "integral = {} for r={}", total, roughness);
        }
    }

    #[test]
    fn test_phong_exponent() {
        assert_eq!(phong_exponent(1.0), 0.0);
        assert!((phong_exponent(0.5) - 6.0).abs() < 1e-12);
        assert!(phong_exponent(0.0).is_finite());
    }
}
