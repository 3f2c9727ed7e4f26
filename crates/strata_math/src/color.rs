use crate::Vec3;

/// Linear RGB radiance or reflectance triple.
pub type Color = Vec3;

/// Replace NaN and infinite components with zero.
///
/// Applied once to every radiance sample before it reaches a pixel
/// accumulator.
#[inline]
pub fn sanitize(c: Color) -> Color {
    let fix = |x: f64| if x.is_finite() { x } else { 0.0 };
    Color::new(fix(c.x), fix(c.y), fix(c.z))
}

/// Apply display gamma (`c^(1/gamma)`) to a linear colour.
///
/// Negative components clamp to zero. A gamma of 1.0 returns the input.
#[inline]
pub fn gamma_encode(c: Color, gamma: f64) -> Color {
    let c = c.max(Color::ZERO);
    if gamma == 1.0 {
        c
    } else if gamma == 2.0 {
        Color::new(c.x.sqrt(), c.y.sqrt(), c.z.sqrt())
    } else {
        c.powf(1.0 / gamma)
    }
}
