//! Cornell box example.
//!
//! Renders the classic Cornell box with a glass sphere and a smoke block,
//! logging strip progress as it arrives, and saves the result as a PNG.
//!
//! ```text
//! cargo run --release --example cornell_box -- [config.json] [output.png]
//! ```

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use strata_core::{ConstantTexture, RenderConfig, TileOrder};
use strata_renderer::{
    render_with_preview, AxisRect, Camera, Color, ConstantMedium, Cuboid, FlipNormals, Hittable,
    HittableList, Material, RotateY, Scene, Sphere, StripResult, Translate, Vec3,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RenderConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load render config {}", path))?,
        None => RenderConfig {
            width: 400,
            height: 400,
            samples: 64,
            tile_order: TileOrder::Spiral,
            ..RenderConfig::default()
        },
    };
    let output = args.next().unwrap_or_else(|| "cornell_box.png".to_string());

    let scene = build_scene(&config).context("Failed to build Cornell box")?;

    let (tx, rx) = mpsc::channel::<StripResult>();
    let total_rows = config.height;
    let progress = thread::spawn(move || {
        let mut done = 0;
        for result in rx {
            done += result.strip.height;
            log::info!(
                "Rows {:?} finished ({:.0}%)",
                result.strip.rows(),
                100.0 * done as f64 / total_rows as f64
            );
        }
    });

    let canvas = render_with_preview(&scene, &config, tx).context("Render failed")?;
    if progress.join().is_err() {
        log::warn!("Progress reporter panicked");
    }

    let image = image::RgbaImage::from_raw(canvas.width, canvas.height, canvas.to_rgba8())
        .context("Canvas size does not match its pixel buffer")?;
    image
        .save(&output)
        .with_context(|| format!("Failed to save {}", output))?;
    log::info!("Saved {}", output);

    Ok(())
}

fn build_scene(config: &RenderConfig) -> Result<Scene> {
    let red = Arc::new(Material::lambertian(Color::new(0.65, 0.05, 0.05)));
    let white = Arc::new(Material::lambertian(Color::splat(0.73)));
    let green = Arc::new(Material::lambertian(Color::new(0.12, 0.45, 0.15)));
    let light = Arc::new(Material::diffuse_light(Color::splat(15.0)));

    let lamp: Arc<dyn Hittable> = Arc::new(FlipNormals::new(Arc::new(AxisRect::xz(
        (213.0, 343.0),
        (227.0, 332.0),
        554.0,
        light,
    ))));
    let glass: Arc<dyn Hittable> = Arc::new(Sphere::new(
        Vec3::new(190.0, 90.0, 190.0),
        90.0,
        Arc::new(Material::dielectric(1.5)),
    ));

    let tall_box: Arc<dyn Hittable> = Arc::new(Translate::new(
        Arc::new(RotateY::new(
            Arc::new(Cuboid::new(
                Vec3::ZERO,
                Vec3::new(165.0, 330.0, 165.0),
                white.clone(),
            )),
            15.0,
        )),
        Vec3::new(265.0, 0.0, 295.0),
    ));
    let smoke: Arc<dyn Hittable> = Arc::new(ConstantMedium::new(
        tall_box,
        0.01,
        Arc::new(ConstantTexture::new(Color::ZERO)),
    ));

    let objects: Vec<Arc<dyn Hittable>> = vec![
        Arc::new(FlipNormals::new(Arc::new(AxisRect::yz(
            (0.0, 555.0),
            (0.0, 555.0),
            555.0,
            green,
        )))),
        Arc::new(AxisRect::yz((0.0, 555.0), (0.0, 555.0), 0.0, red)),
        Arc::new(FlipNormals::new(Arc::new(AxisRect::xz(
            (0.0, 555.0),
            (0.0, 555.0),
            555.0,
            white.clone(),
        )))),
        Arc::new(AxisRect::xz((0.0, 555.0), (0.0, 555.0), 0.0, white.clone())),
        Arc::new(FlipNormals::new(Arc::new(AxisRect::xy(
            (0.0, 555.0),
            (0.0, 555.0),
            555.0,
            white,
        )))),
        lamp.clone(),
        glass.clone(),
        smoke,
    ];

    // Sample the glass sphere as well, so caustics converge faster
    let lights = HittableList::from(vec![lamp, glass]);

    let camera = Camera::new()
        .with_resolution(config.width, config.height)
        .with_position(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 10.0);

    Ok(Scene::with_lights(objects, lights, camera)?)
}
