//! Camera for ray generation.

use rand::RngCore;
use strata_math::sampling::{gen_f64, random_in_unit_disk};
use strata_math::{Ray, Vec3};

/// Thin-lens perspective camera with a shutter interval.
#[derive(Debug, Clone)]
pub struct Camera {
    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f64,       // Vertical field of view in degrees
    aspect: f64,     // Width over height
    aperture: f64,   // Lens diameter, 0 for a pinhole
    focus_dist: f64, // Distance from camera to plane of perfect focus

    // Shutter
    time0: f64,
    time1: f64,

    // Cached computed values (set by initialize())
    lower_left_corner: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f64,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aspect: 1.0,
            aperture: 0.0,
            focus_dist: 1.0,
            time0: 0.0,
            time1: 1.0,
            lower_left_corner: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            lens_radius: 0.0,
        };
        camera.initialize();
        camera
    }

    /// Match the aspect ratio to an image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.aspect = width as f64 / height.max(1) as f64;
        self.initialize();
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialize();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f64, aperture: f64, focus_dist: f64) -> Self {
        self.vfov = vfov;
        self.aperture = aperture.max(0.0);
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    /// Set the interval over which ray times are drawn.
    pub fn with_shutter(mut self, time0: f64, time1: f64) -> Self {
        self.time0 = time0;
        self.time1 = time1;
        self
    }

    pub fn shutter(&self) -> (f64, f64) {
        (self.time0, self.time1)
    }

    /// Recompute the viewport from the current settings.
    pub fn initialize(&mut self) {
        self.lens_radius = self.aperture / 2.0;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = self.aspect * half_height;

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize_or_zero();
        self.u = self.vup.cross(self.w).normalize_or_zero();
        self.v = self.w.cross(self.u);

        let focus = self.focus_dist;
        self.lower_left_corner = self.look_from
            - half_width * focus * self.u
            - half_height * focus * self.v
            - focus * self.w;
        self.horizontal = 2.0 * half_width * focus * self.u;
        self.vertical = 2.0 * half_height * focus * self.v;
    }

    /// Ray through film position `(s, t)`, both in [0, 1] with `t = 0` at
    /// the bottom edge.
    pub fn get_ray(&self, s: f64, t: f64, rng: &mut dyn RngCore) -> Ray {
        let rd = self.lens_radius * random_in_unit_disk(rng);
        let offset = self.u * rd.x + self.v * rd.y;

        let origin = self.look_from + offset;
        let direction =
            self.lower_left_corner + s * self.horizontal + t * self.vertical - origin;
        let time = self.time0 + gen_f64(rng) * (self.time1 - self.time0);

        Ray::new(origin, direction, time)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
