//! Surface and volume materials.
//!
//! A [`Material`] decides how an incoming ray scatters at a hit point and
//! how much light the surface emits. Non-specular materials hand back a
//! [`MaterialPdf`] so the integrator can mix it with light sampling.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::RngCore;
use strata_core::{ConstantTexture, Texture};
use strata_math::sampling::{gen_f64, random_in_unit_sphere, random_unit_vector};
use strata_math::{Color, Onb, Ray, Vec3};

use crate::hittable::HitRecord;
use crate::pdf::{CosinePdf, MaterialPdf, PbrPdf};

/// Dielectric Fresnel reflectance at normal incidence for the PBR model.
const PBR_F0: f64 = 0.04;

/// Outcome of a scatter event.
///
/// Specular events carry the exact continuation ray; everything else
/// carries the density to sample the next direction from.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    pub is_specular: bool,
    pub specular_ray: Option<Ray>,
    pub attenuation: Color,
    pub pdf: Option<MaterialPdf>,
}

impl ScatterRecord {
    pub fn specular(ray: Ray, attenuation: Color) -> Self {
        Self {
            is_specular: true,
            specular_ray: Some(ray),
            attenuation,
            pdf: None,
        }
    }

    pub fn diffuse(pdf: MaterialPdf, attenuation: Color) -> Self {
        Self {
            is_specular: false,
            specular_ray: None,
            attenuation,
            pdf: Some(pdf),
        }
    }
}

/// Metallic-roughness material with optional texture maps.
///
/// Roughness and metalness are read as the mean of the texture's RGB.
/// Missing maps default to roughness 0.5 and metalness 0.
pub struct PbrMaterial {
    albedo: Arc<dyn Texture>,
    roughness: Option<Arc<dyn Texture>>,
    metalness: Option<Arc<dyn Texture>>,
    normal_map: Option<Arc<dyn Texture>>,
}

impl PbrMaterial {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self {
            albedo,
            roughness: None,
            metalness: None,
            normal_map: None,
        }
    }

    pub fn with_roughness(mut self, roughness: Arc<dyn Texture>) -> Self {
        self.roughness = Some(roughness);
        self
    }

    pub fn with_metalness(mut self, metalness: Arc<dyn Texture>) -> Self {
        self.metalness = Some(metalness);
        self
    }

    /// Tangent-space normal map, RGB in [0, 1] mapped to [-1, 1] for X and Y.
    pub fn with_normal_map(mut self, normal_map: Arc<dyn Texture>) -> Self {
        self.normal_map = Some(normal_map);
        self
    }

    fn roughness_at(&self, rec: &HitRecord) -> f64 {
        channel_mean(self.roughness.as_deref(), rec, 0.5)
    }

    fn metalness_at(&self, rec: &HitRecord) -> f64 {
        channel_mean(self.metalness.as_deref(), rec, 0.0)
    }

    /// Shading normal, perturbed by the normal map when present.
    fn shading_normal(&self, rec: &HitRecord) -> Vec3 {
        let Some(map) = &self.normal_map else {
            return rec.normal;
        };
        let sample = map.value(rec.u, rec.v, rec.point);
        let tangent_space = Vec3::new(2.0 * sample.x - 1.0, 2.0 * sample.y - 1.0, sample.z);
        let frame = Onb::from_w(rec.normal);
        let normal = frame.local(tangent_space).normalize_or_zero();
        if normal == Vec3::ZERO {
            rec.normal
        } else {
            normal
        }
    }

    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterRecord {
        let albedo = self.albedo.value(rec.u, rec.v, rec.point);
        let roughness = self.roughness_at(rec).clamp(0.0, 1.0);
        let metalness = self.metalness_at(rec).clamp(0.0, 1.0);
        let normal = self.shading_normal(rec);

        let unit_direction = ray_in.direction().normalize();
        let reflected = reflect(unit_direction, normal);
        let cos_theta = (-unit_direction).dot(normal).clamp(0.0, 1.0);
        let reflectance = PBR_F0 + (1.0 - PBR_F0) * (1.0 - cos_theta).powi(5);

        let metallic_lobe = gen_f64(rng) < metalness;
        if metallic_lobe || gen_f64(rng) < reflectance {
            let mut direction = reflected + roughness * random_in_unit_sphere(rng);
            if direction.dot(normal) <= 0.0 {
                direction = reflected;
            }
            let tint = if metallic_lobe { albedo } else { Color::ONE };
            return ScatterRecord::specular(ray_in.spawn(rec.point, direction), tint);
        }

        let pdf = PbrPdf::new(normal, reflected, roughness, metalness, reflectance);
        ScatterRecord::diffuse(MaterialPdf::Pbr(pdf), albedo)
    }
}

fn channel_mean(texture: Option<&dyn Texture>, rec: &HitRecord, default: f64) -> f64 {
    texture.map_or(default, |t| {
        let c = t.value(rec.u, rec.v, rec.point);
        (c.x + c.y + c.z) / 3.0
    })
}

/// Material types supported by the path tracer.
pub enum Material {
    /// Diffuse surface
    Lambertian { albedo: Arc<dyn Texture> },
    /// Fuzzy mirror. `fuzz` 0 is a perfect mirror
    Metal { albedo: Color, fuzz: f64 },
    /// Glass-like refractor with index of refraction `ior`
    Dielectric { ior: f64 },
    Pbr(PbrMaterial),
    /// Area light. Emits from the front face only
    DiffuseLight { emit: Arc<dyn Texture> },
    /// Phase function for participating media
    Isotropic { albedo: Arc<dyn Texture> },
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Self::lambertian_texture(Arc::new(ConstantTexture::new(albedo)))
    }

    pub fn lambertian_texture(albedo: Arc<dyn Texture>) -> Self {
        Material::Lambertian { albedo }
    }

    pub fn metal(albedo: Color, fuzz: f64) -> Self {
        Material::Metal {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn dielectric(ior: f64) -> Self {
        Material::Dielectric { ior }
    }

    pub fn pbr(material: PbrMaterial) -> Self {
        Material::Pbr(material)
    }

    pub fn diffuse_light(emit: Color) -> Self {
        Self::diffuse_light_texture(Arc::new(ConstantTexture::new(emit)))
    }

    pub fn diffuse_light_texture(emit: Arc<dyn Texture>) -> Self {
        Material::DiffuseLight { emit }
    }

    pub fn isotropic(albedo: Arc<dyn Texture>) -> Self {
        Material::Isotropic { albedo }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed (lights never scatter).
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian { albedo } => {
                let attenuation = albedo.value(rec.u, rec.v, rec.point);
                let pdf = MaterialPdf::Cosine(CosinePdf::new(rec.normal));
                Some(ScatterRecord::diffuse(pdf, attenuation))
            }

            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal);
                let direction = reflected + *fuzz * random_in_unit_sphere(rng);
                Some(ScatterRecord::specular(
                    ray_in.spawn(rec.point, direction),
                    *albedo,
                ))
            }

            Material::Dielectric { ior } => {
                let refraction_ratio = if rec.front_face { 1.0 / ior } else { *ior };

                let unit_direction = ray_in.direction().normalize();
                let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

                // Total internal reflection
                let cannot_refract = refraction_ratio * sin_theta > 1.0;

                let direction = if cannot_refract
                    || schlick(cos_theta, refraction_ratio) > gen_f64(rng)
                {
                    reflect(unit_direction, rec.normal)
                } else {
                    refract(unit_direction, rec.normal, refraction_ratio)
                };

                Some(ScatterRecord::specular(
                    ray_in.spawn(rec.point, direction),
                    Color::ONE,
                ))
            }

            Material::Pbr(pbr) => Some(pbr.scatter(ray_in, rec, rng)),

            Material::DiffuseLight { .. } => None,

            // Sampling the phase function exactly, so the event is delegated
            // like a specular bounce
            Material::Isotropic { albedo } => {
                let attenuation = albedo.value(rec.u, rec.v, rec.point);
                Some(ScatterRecord::specular(
                    ray_in.spawn(rec.point, random_unit_vector(rng)),
                    attenuation,
                ))
            }
        }
    }

    /// Light emitted towards `ray_in` at the hit point.
    pub fn emitted(&self, _ray_in: &Ray, rec: &HitRecord) -> Color {
        match self {
            Material::DiffuseLight { emit } if rec.front_face => {
                emit.value(rec.u, rec.v, rec.point)
            }
            _ => Color::ZERO,
        }
    }

    /// Density of the material's own BRDF for the `scattered` direction.
    pub fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f64 {
        match self {
            Material::Lambertian { .. } | Material::Pbr(_) => {
                let cosine = rec.normal.dot(scattered.direction().normalize_or_zero());
                cosine.max(0.0) / PI
            }
            _ => 0.0,
        }
    }

    /// Surface colour at the hit point, used by the albedo AOV.
    pub fn albedo(&self, rec: &HitRecord) -> Color {
        match self {
            Material::Lambertian { albedo } | Material::Isotropic { albedo } => {
                albedo.value(rec.u, rec.v, rec.point)
            }
            Material::Pbr(pbr) => pbr.albedo.value(rec.u, rec.v, rec.point),
            Material::Metal { albedo, .. } => *albedo,
            Material::Dielectric { .. } => Color::ONE,
            Material::DiffuseLight { emit } => emit.value(rec.u, rec.v, rec.point),
        }
    }

    pub fn is_emitter(&self) -> bool {
        matches!(self, Material::DiffuseLight { .. })
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f64) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn schlick(cosine: f64, ref_idx: f64) -> f64 {
    let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Pdf;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(ray: &Ray, outward: Vec3) -> HitRecord {
        HitRecord::new(ray, 1.0, outward, 0.5, 0.5)
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.25)
    }

    #[test]
    fn test_lambertian_is_diffuse() {
        let mat = Material::lambertian(Color::new(0.8, 0.2, 0.1));
        let ray = down_ray();
        let rec = record(&ray, Vec3::Y);
        let mut rng = StdRng::seed_from_u64(1);

        let srec = mat.scatter(&ray, &rec, &mut rng).unwrap();
        assert!(!srec.is_specular);
        assert!(srec.specular_ray.is_none());
        assert_eq!(srec.attenuation, Color::new(0.8, 0.2, 0.1));

        let pdf = srec.pdf.unwrap();
        for _ in 0..100 {
            let d = pdf.generate(&mut rng);
            let scattered = Ray::new(rec.point, d, 0.0);
            assert_eq!(mat.scattering_pdf(&ray, &rec, &scattered), pdf.value(d));
        }
    }

    #[test]
    fn test_mirror_reflects_exactly() {
        let mat = Material::metal(Color::ONE, 0.0);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.25);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        let srec = mat.scatter(&ray, &rec, &mut rng).unwrap();
        assert!(srec.is_specular);
        assert!(srec.pdf.is_none());
        let out = srec.specular_ray.unwrap();
        assert_eq!(out.origin(), Vec3::ZERO);
        assert!((out.direction() - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-12);
        assert_eq!(out.time(), 0.25);
    }

    #[test]
    fn test_dielectric_is_specular_and_white() {
        let mat = Material::dielectric(1.5);
        let ray = down_ray();
        let mut rng = StdRng::seed_from_u64(5);

        for outward in [Vec3::Y, -Vec3::Y] {
            let rec = record(&ray, outward);
            for _ in 0..50 {
                let srec = mat.scatter(&ray, &rec, &mut rng).unwrap();
                assert!(srec.is_specular);
                assert_eq!(srec.attenuation, Color::ONE);
            }
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let mat = Material::dielectric(1.5);
        // Grazing ray from inside the glass
        let dir = Vec3::new(1.0, 0.1, 0.0).normalize();
        let ray = Ray::new(Vec3::ZERO, dir, 0.0);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, 0.0, 0.0);
        assert!(!rec.front_face);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            let out = mat.scatter(&ray, &rec, &mut rng).unwrap().specular_ray.unwrap();
            assert!(out.direction().y < 0.0);
        }
    }

    #[test]
    fn test_diffuse_light_front_face_only() {
        let mat = Material::diffuse_light(Color::splat(4.0));
        let ray = down_ray();
        let mut rng = StdRng::seed_from_u64(1);

        let front = record(&ray, Vec3::Y);
        assert_eq!(mat.emitted(&ray, &front), Color::splat(4.0));
        assert!(mat.scatter(&ray, &front, &mut rng).is_none());

        let back = record(&ray, -Vec3::Y);
        assert_eq!(mat.emitted(&ray, &back), Color::ZERO);
        assert!(mat.is_emitter());
    }

    #[test]
    fn test_isotropic_scatters_uniformly() {
        let mat = Material::isotropic(Arc::new(ConstantTexture::new(Color::splat(0.7))));
        let ray = down_ray();
        let rec = record(&ray, Vec3::X);
        let mut rng = StdRng::seed_from_u64(2);

        let mut mean = Vec3::ZERO;
        for _ in 0..5000 {
            let srec = mat.scatter(&ray, &rec, &mut rng).unwrap();
            assert_eq!(srec.attenuation, Color::splat(0.7));
            mean += srec.specular_ray.unwrap().direction();
        }
        assert!((mean / 5000.0).length() < 0.05);
    }

    #[test]
    fn test_pbr_branches() {
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.0);
        let rec = HitRecord::new(&ray, 1.0, Vec3::Y, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(8);

        // Fully metallic always takes the specular lobe, tinted by albedo
        let metal = Material::pbr(
            PbrMaterial::new(Arc::new(ConstantTexture::new(Color::new(0.9, 0.6, 0.2))))
                .with_metalness(Arc::new(ConstantTexture::new(Color::ONE)))
                .with_roughness(Arc::new(ConstantTexture::new(Color::splat(0.3)))),
        );
        for _ in 0..100 {
            let srec = metal.scatter(&ray, &rec, &mut rng).unwrap();
            assert!(srec.is_specular);
            assert_eq!(srec.attenuation, Color::new(0.9, 0.6, 0.2));
            assert!(srec.specular_ray.unwrap().direction().y > 0.0);
        }

        // Dielectric PBR mostly goes diffuse with the lobe PDF
        let plastic = Material::pbr(PbrMaterial::new(Arc::new(ConstantTexture::new(
            Color::splat(0.5),
        ))));
        let mut diffuse = 0;
        for _ in 0..1000 {
            let srec = plastic.scatter(&ray, &rec, &mut rng).unwrap();
            if !srec.is_specular {
                assert!(matches!(srec.pdf, Some(MaterialPdf::Pbr(_))));
                diffuse += 1;
            }
        }
        assert!(diffuse > 800, "diffuse branch taken {} times", diffuse);
    }

    #[test]
    fn test_schlick() {
        assert!((schlick(1.0, 1.5) - 0.04).abs() < 1e-12);
        assert!((schlick(0.0, 1.5) - 1.0).abs() < 1e-12);
    }
}
