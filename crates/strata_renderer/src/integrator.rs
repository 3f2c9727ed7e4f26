//! Radiance estimators.
//!
//! [`PathTracer`] is the main integrator: recursive path tracing that
//! importance samples the light set and the material together. The albedo,
//! normal and wireframe samplers share the same interface and produce
//! preview and AOV images.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngCore;
use strata_core::{Background, RenderConfig, SamplerKind};
use strata_math::{Color, Interval, Ray};

use crate::hittable::{Hittable, HittableList};
use crate::pdf::{HittablePdf, MixturePdf, Pdf};

/// Minimum hit distance for every traced ray, to avoid self-intersection.
pub const T_MIN: f64 = 0.001;

/// Estimates the radiance carried along a ray.
pub trait Sampler: Send + Sync {
    fn sample(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        lights: &HittableList,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color;

    /// Rays cast so far.
    fn rays_traced(&self) -> u64 {
        0
    }
}

/// Monte Carlo path tracer with multiple importance sampling.
///
/// Diffuse bounces draw their direction from an equal mixture of the light
/// set and the material's own density. Specular bounces follow the
/// material's ray directly.
pub struct PathTracer {
    max_depth: u32,
    background: Background,
    rays: AtomicU64,
}

impl PathTracer {
    pub fn new(max_depth: u32, background: Background) -> Self {
        Self {
            max_depth,
            background,
            rays: AtomicU64::new(0),
        }
    }
}

impl Sampler for PathTracer {
    fn sample(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        lights: &HittableList,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        self.rays.fetch_add(1, Ordering::Relaxed);

        let Some((rec, material)) = world.hit(ray, Interval::new(T_MIN, f64::INFINITY)) else {
            return self.background.radiance(ray.direction());
        };

        let emitted = material.emitted(ray, &rec);
        if depth >= self.max_depth {
            return emitted;
        }
        let Some(srec) = material.scatter(ray, &rec, rng) else {
            return emitted;
        };

        if srec.is_specular {
            return match srec.specular_ray {
                Some(specular) => {
                    emitted
                        + srec.attenuation * self.sample(&specular, world, lights, depth + 1, rng)
                }
                None => emitted,
            };
        }

        let Some(material_pdf) = srec.pdf else {
            return emitted;
        };

        let (direction, pdf_val) = if lights.is_empty() {
            let direction = material_pdf.generate(rng);
            (direction, material_pdf.value(direction))
        } else {
            let light_pdf = HittablePdf::new(lights, rec.point);
            let mixture = MixturePdf::new(&light_pdf, &material_pdf);
            let direction = mixture.generate(rng);
            (direction, mixture.value(direction))
        };

        if pdf_val.is_nan() || pdf_val <= 0.0 {
            return emitted;
        }

        let scattered = ray.spawn(rec.point, direction);
        let scattering_pdf = material.scattering_pdf(ray, &rec, &scattered);
        let incoming = self.sample(&scattered, world, lights, depth + 1, rng);

        emitted + srec.attenuation * scattering_pdf * incoming / pdf_val
    }

    fn rays_traced(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }
}

/// Surface albedo at the first hit, background on a miss.
pub struct AlbedoSampler {
    background: Background,
    rays: AtomicU64,
}

impl AlbedoSampler {
    pub fn new(background: Background) -> Self {
        Self {
            background,
            rays: AtomicU64::new(0),
        }
    }
}

impl Sampler for AlbedoSampler {
    fn sample(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        _lights: &HittableList,
        _depth: u32,
        _rng: &mut dyn RngCore,
    ) -> Color {
        self.rays.fetch_add(1, Ordering::Relaxed);
        match world.hit(ray, Interval::new(T_MIN, f64::INFINITY)) {
            Some((rec, material)) => material.albedo(&rec),
            None => self.background.radiance(ray.direction()),
        }
    }

    fn rays_traced(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }
}

/// Shading normal at the first hit mapped to [0, 1], black on a miss.
#[derive(Default)]
pub struct NormalSampler {
    rays: AtomicU64,
}

impl NormalSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sampler for NormalSampler {
    fn sample(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        _lights: &HittableList,
        _depth: u32,
        _rng: &mut dyn RngCore,
    ) -> Color {
        self.rays.fetch_add(1, Ordering::Relaxed);
        match world.hit(ray, Interval::new(T_MIN, f64::INFINITY)) {
            Some((rec, _)) => 0.5 * (rec.normal + Color::ONE),
            None => Color::ZERO,
        }
    }

    fn rays_traced(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }
}

/// Outlines of the first primitive hit, drawn in `ink` over the background.
pub struct WireFrameSampler {
    ink: Color,
    edge_width: f64,
    background: Background,
    rays: AtomicU64,
}

impl WireFrameSampler {
    pub fn new(ink: Color, edge_width: f64, background: Background) -> Self {
        Self {
            ink,
            edge_width,
            background,
            rays: AtomicU64::new(0),
        }
    }
}

impl Sampler for WireFrameSampler {
    fn sample(
        &self,
        ray: &Ray,
        world: &dyn Hittable,
        _lights: &HittableList,
        _depth: u32,
        _rng: &mut dyn RngCore,
    ) -> Color {
        self.rays.fetch_add(1, Ordering::Relaxed);
        match world.hit_edge(ray, Interval::new(T_MIN, f64::INFINITY), self.edge_width) {
            Some((_, true)) => self.ink,
            _ => self.background.radiance(ray.direction()),
        }
    }

    fn rays_traced(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }
}

/// The sampler selected by `config.sampler`.
pub fn sampler_for(config: &RenderConfig) -> Box<dyn Sampler> {
    match config.sampler {
        SamplerKind::Colour => Box::new(PathTracer::new(config.max_depth, config.background)),
        SamplerKind::Albedo => Box::new(AlbedoSampler::new(config.background)),
        SamplerKind::Normal => Box::new(NormalSampler::new()),
        SamplerKind::WireFrame => Box::new(WireFrameSampler::new(
            Color::from_array(config.ink),
            config.edge_width,
            config.background,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisRect, FlipNormals, Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use strata_math::Vec3;

    fn sphere(material: Material) -> Sphere {
        Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, Arc::new(material))
    }

    fn toward_sphere() -> Ray {
        Ray::new(Vec3::ZERO, -Vec3::Z, 0.0)
    }

    #[test]
    fn test_miss_returns_background() {
        let tracer = PathTracer::new(
            50,
            Background::Gradient {
                horizon: [1.0, 1.0, 1.0],
                zenith: [0.5, 0.7, 1.0],
            },
        );
        let world = sphere(Material::lambertian(Color::ONE));
        let mut rng = StdRng::seed_from_u64(1);

        let up = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        let c = tracer.sample(&up, &world, &HittableList::new(), 0, &mut rng);
        assert_eq!(c, Color::new(0.5, 0.7, 1.0));
        assert_eq!(tracer.rays_traced(), 1);
    }

    #[test]
    fn test_diffuse_under_uniform_sky_returns_albedo() {
        // Every bounce off a convex diffuse object escapes to the sky, and
        // cosine sampling cancels the BRDF exactly
        let tracer = PathTracer::new(50, Background::solid(Color::ONE));
        let world = sphere(Material::lambertian(Color::new(0.5, 0.25, 0.75)));
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..100 {
            let c = tracer.sample(&toward_sphere(), &world, &HittableList::new(), 0, &mut rng);
            assert!((c - Color::new(0.5, 0.25, 0.75)).length() < 1e-9, "got {:?}", c);
        }
    }

    #[test]
    fn test_depth_cutoff_keeps_emission_only() {
        let tracer = PathTracer::new(0, Background::solid(Color::ONE));
        let mut rng = StdRng::seed_from_u64(3);

        let diffuse = sphere(Material::lambertian(Color::ONE));
        let c = tracer.sample(&toward_sphere(), &diffuse, &HittableList::new(), 0, &mut rng);
        assert_eq!(c, Color::ZERO);

        let light = sphere(Material::diffuse_light(Color::splat(3.0)));
        let c = tracer.sample(&toward_sphere(), &light, &HittableList::new(), 0, &mut rng);
        assert_eq!(c, Color::splat(3.0));
    }

    #[test]
    fn test_mirror_follows_specular_ray() {
        let tracer = PathTracer::new(50, Background::solid(Color::new(0.2, 0.4, 0.6)));
        let world = sphere(Material::metal(Color::ONE, 0.0));
        let mut rng = StdRng::seed_from_u64(4);

        let c = tracer.sample(&toward_sphere(), &world, &HittableList::new(), 0, &mut rng);
        assert_eq!(c, Color::new(0.2, 0.4, 0.6));
        assert_eq!(tracer.rays_traced(), 2);
    }

    #[test]
    fn test_light_sampling_is_finite_and_positive() {
        let tracer = PathTracer::new(5, Background::default());
        let floor: Arc<dyn Hittable> = Arc::new(AxisRect::xz(
            (-5.0, 5.0),
            (-5.0, 5.0),
            0.0,
            Arc::new(Material::lambertian(Color::splat(0.5))),
        ));
        let lamp: Arc<dyn Hittable> = Arc::new(FlipNormals::new(Arc::new(AxisRect::xz(
            (-1.0, 1.0),
            (-1.0, 1.0),
            2.0,
            Arc::new(Material::diffuse_light(Color::splat(4.0))),
        ))));
        let world = crate::HittableList::from(vec![floor, lamp.clone()]);
        let lights = HittableList::from(vec![lamp]);
        let mut rng = StdRng::seed_from_u64(5);

        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.0);
        let mut total = Color::ZERO;
        for _ in 0..1000 {
            let c = tracer.sample(&ray, &world, &lights, 0, &mut rng);
            assert!(c.is_finite());
            assert!(c.min_element() >= 0.0);
            total += c;
        }
        assert!(total.x > 0.0);
    }

    #[test]
    fn test_aov_samplers() {
        let world = sphere(Material::lambertian(Color::new(0.1, 0.2, 0.3)));
        let mut rng = StdRng::seed_from_u64(6);
        let lights = HittableList::new();

        let albedo = AlbedoSampler::new(Background::solid(Color::ONE));
        assert_eq!(
            albedo.sample(&toward_sphere(), &world, &lights, 0, &mut rng),
            Color::new(0.1, 0.2, 0.3)
        );

        let normal = NormalSampler::new();
        let n = normal.sample(&toward_sphere(), &world, &lights, 0, &mut rng);
        assert!((n - Color::new(0.5, 0.5, 1.0)).length() < 1e-12);
        let up = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        assert_eq!(normal.sample(&up, &world, &lights, 0, &mut rng), Color::ZERO);
        assert_eq!(normal.rays_traced(), 2);
    }

    #[test]
    fn test_wireframe_sampler() {
        let ink = Color::new(1.0, 0.0, 0.0);
        let paper = Color::splat(0.9);
        let wireframe = WireFrameSampler::new(ink, 0.05, Background::solid(paper));
        let world = crate::HittableList::from(vec![Arc::new(crate::Triangle::new(
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::new(1.0, -1.0, -2.0),
            Vec3::new(0.0, 1.0, -2.0),
            Arc::new(Material::lambertian(Color::ONE)),
        )) as Arc<dyn Hittable>]);
        let lights = HittableList::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut toward = |x: f64, y: f64| {
            let ray = Ray::new(Vec3::ZERO, Vec3::new(x, y, -2.0), 0.0);
            wireframe.sample(&ray, &world, &lights, 0, &mut rng)
        };

        // Interior, bottom edge, and a miss
        assert_eq!(toward(0.0, -1.0 / 3.0), paper);
        assert_eq!(toward(0.0, -0.99), ink);
        assert_eq!(toward(3.0, 0.0), paper);
        assert_eq!(wireframe.rays_traced(), 3);
    }

    #[test]
    fn test_sampler_for_config() {
        let mut config = RenderConfig::default();
        config.sampler = SamplerKind::Normal;
        let sampler = sampler_for(&config);
        let world = sphere(Material::lambertian(Color::ONE));
        let mut rng = StdRng::seed_from_u64(7);
        let n = sampler.sample(&toward_sphere(), &world, &HittableList::new(), 0, &mut rng);
        assert!((n - Color::new(0.5, 0.5, 1.0)).length() < 1e-12);

        config.sampler = SamplerKind::WireFrame;
        config.ink = [0.0, 1.0, 0.0];
        config.edge_width = 0.3;
        let sampler = sampler_for(&config);
        // Head-on the sphere is no silhouette; just inside its rim it is
        let rim = Ray::new(Vec3::ZERO, Vec3::new(1.02, 0.0, -3.0), 0.0);
        let lights = HittableList::new();
        assert_eq!(
            sampler.sample(&toward_sphere(), &world, &lights, 0, &mut rng),
            Color::ZERO
        );
        assert_eq!(
            sampler.sample(&rim, &world, &lights, 0, &mut rng),
            Color::new(0.0, 1.0, 0.0)
        );
    }
}
