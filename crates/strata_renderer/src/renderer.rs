//! Parallel strip renderer.
//!
//! Implements Monte Carlo path tracing over the whole image with:
//! - A fixed rayon pool pulling strips in FIFO order
//! - One random stream per strip, so output does not depend on scheduling
//! - Jittered multi-sampling, per-sample sanitizing and gamma encoding

use std::sync::mpsc::Sender;
use std::time::Instant;

use rand::RngCore;
use strata_core::RenderConfig;
use strata_math::sampling::gen_f64;
use strata_math::{gamma_encode, sanitize, strip_rngs, Color, StrataRng, Vec4};

use crate::canvas::{to_pixel, Canvas};
use crate::error::RenderResult;
use crate::integrator::{sampler_for, Sampler};
use crate::scene::Scene;
use crate::strip::{generate_strips, step_height, Strip, StripResult};

/// Render the entire scene to a canvas.
pub fn render(scene: &Scene, config: &RenderConfig) -> RenderResult<Canvas> {
    render_strips(scene, config, None)
}

/// Render the scene, sending each finished strip on `preview` as it
/// completes.
///
/// A dropped receiver does not stop the render.
pub fn render_with_preview(
    scene: &Scene,
    config: &RenderConfig,
    preview: Sender<StripResult>,
) -> RenderResult<Canvas> {
    render_strips(scene, config, Some(preview))
}

fn render_strips(
    scene: &Scene,
    config: &RenderConfig,
    preview: Option<Sender<StripResult>>,
) -> RenderResult<Canvas> {
    config.validate()?;

    let workers = config.worker_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    let (width, height) = (config.width, config.height);
    let step = step_height(height);
    let strips = generate_strips(height, step, config.tile_order);
    let sampler = sampler_for(config);

    log::info!(
        "Begin rendering using {} worker threads ({} strips of {} rows)",
        workers,
        strips.len(),
        step
    );
    let start = Instant::now();

    let mut canvas = Canvas::new(width, height);

    // Pair each row-major block of the canvas with its strip's stream,
    // then queue them in render order
    let tasks: Vec<(Strip, &mut [Vec4], StrataRng)> = {
        let rows_per_chunk = step as usize * width as usize;
        let mut slots: Vec<Option<(&mut [Vec4], StrataRng)>> = canvas
            .pixels_mut()
            .chunks_mut(rows_per_chunk)
            .zip(strip_rngs(config.seed, strips.len()))
            .map(Some)
            .collect();

        strips
            .iter()
            .filter_map(|strip| {
                slots[strip.index]
                    .take()
                    .map(|(pixels, rng)| (*strip, pixels, rng))
            })
            .collect()
    };

    let sampler: &dyn Sampler = sampler.as_ref();
    pool.scope_fifo(move |scope| {
        for (strip, pixels, mut rng) in tasks {
            let preview = preview.clone();
            scope.spawn_fifo(move |_| {
                render_strip(scene, sampler, config, &strip, pixels, &mut rng);
                log::debug!("Strip {} (rows {:?}) done", strip.index, strip.rows());

                if let Some(tx) = preview {
                    let result = StripResult {
                        strip,
                        width,
                        pixels: pixels.to_vec(),
                    };
                    if tx.send(result).is_err() {
                        log::debug!("Preview receiver closed, continuing without it");
                    }
                }
            });
        }
    });

    log::info!(
        "Rendering completed in {:?} using {} rays",
        start.elapsed(),
        sampler.rays_traced()
    );
    Ok(canvas)
}

/// Render one strip into its block of pixels.
fn render_strip(
    scene: &Scene,
    sampler: &dyn Sampler,
    config: &RenderConfig,
    strip: &Strip,
    pixels: &mut [Vec4],
    rng: &mut dyn RngCore,
) {
    for (row, y) in pixels.chunks_mut(config.width as usize).zip(strip.rows()) {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = to_pixel(render_pixel(scene, sampler, config, x as u32, y, rng));
        }
    }
}

/// Render a single pixel with multi-sampling.
///
/// `(x, y)` has row 0 at the top of the image. Each sample is sanitized
/// before accumulation, the average is gamma encoded.
pub fn render_pixel(
    scene: &Scene,
    sampler: &dyn Sampler,
    config: &RenderConfig,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let width = config.width as f64;
    let height = config.height as f64;
    let flipped_y = (config.height - 1 - y) as f64;

    let mut pixel_color = Color::ZERO;
    for _ in 0..config.samples {
        let s = (x as f64 + gen_f64(rng)) / width;
        let t = (flipped_y + gen_f64(rng)) / height;
        let ray = scene.camera.get_ray(s, t, rng);
        pixel_color += sanitize(sampler.sample(&ray, &scene.world, &scene.lights, 0, rng));
    }

    gamma_encode(pixel_color / config.samples as f64, config.gamma)
}
