use crate::Vec3;

/// A ray in 3D space with origin, direction, time and an optional wavelength.
///
/// Rays are immutable values. The `time` field drives motion blur, and
/// `wavelength` (in nanometres) is carried through scattering untouched so
/// spectral callers can reuse the same intersection contracts.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f64,
    pub wavelength: Option<f64>,
}

impl Ray {
    /// Create a new RGB ray.
    pub fn new(origin: Vec3, direction: Vec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
            wavelength: None,
        }
    }

    /// Tag this ray with a wavelength.
    pub fn with_wavelength(mut self, lambda: f64) -> Self {
        self.wavelength = Some(lambda);
        self
    }

    /// Build a secondary ray that inherits this ray's time and wavelength.
    pub fn spawn(&self, origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            time: self.time,
            wavelength: self.wavelength,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_creation() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let direction = Vec3::new(0.0, 1.0, 0.0);
        let ray = Ray::new(origin, direction, 0.5);

        assert_eq!(ray.origin, origin);
        assert_eq!(ray.direction, direction);
        assert_eq!(ray.time, 0.5);
        assert_eq!(ray.wavelength, None);
    }

    #[test]
    fn test_ray_point_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        assert_eq!(ray.point_at(0.0), Vec3::ZERO);
        assert_eq!(ray.point_at(1.0), Vec3::X);
        assert_eq!(ray.point_at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.point_at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_spawn_keeps_time_and_wavelength() {
        let parent = Ray::new(Vec3::ZERO, Vec3::Z, 0.25).with_wavelength(550.0);
        let child = parent.spawn(Vec3::ONE, Vec3::Y);

        assert_eq!(child.origin(), Vec3::ONE);
        assert_eq!(child.direction(), Vec3::Y);
        assert_eq!(child.time(), 0.25);
        assert_eq!(child.wavelength(), Some(550.0));
    }
}
