mod cli;
mod demo;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::{CubeMap, Texture};
use glint_renderer::{FrameBuffer, RayTracer, RenderStatus, TraceConfig};

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    let base = match &args.config {
        Some(path) => TraceConfig::load(path)
            .with_context(|| format!("Failed to read trace config {}", path.display()))?,
        None => TraceConfig::default(),
    };
    let config = args.apply(base);
    log::info!(
        "Tracing {}x{} at depth {}, {}x{} samples{}",
        args.width,
        args.height,
        config.max_depth,
        config.samples,
        config.samples,
        if config.adaptive { " (adaptive)" } else { "" }
    );

    let mut tracer = RayTracer::new(config).context("Invalid trace configuration")?;

    let aspect_ratio = args.width as f32 / args.height.max(1) as f32;
    tracer
        .load_scene(&|| demo::scene(aspect_ratio))
        .context("Failed to build the demo scene")?;

    let sky = match &args.sky {
        Some(path) => load_sky(path)?,
        None => demo::sky(),
    };
    tracer.set_cube_map(Some(sky));

    let stop = Arc::new(AtomicBool::new(false));
    if let Some(seconds) = args.time_limit {
        let stop = stop.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
            stop.store(true, Ordering::Relaxed);
        });
    }

    tracer.trace_setup(args.width, args.height);
    let status = if args.parallel {
        tracer.render_parallel(&stop)
    } else {
        let tenth = (args.height / 10).max(1);
        tracer.render(&stop, |row, _| {
            if (row + 1) % tenth == 0 {
                log::debug!("{} of {} rows", row + 1, args.height);
            }
        })
    };

    match status {
        RenderStatus::Complete => {}
        RenderStatus::Stopped { rows } => {
            log::warn!("Time limit reached, saving {} of {} rows", rows, args.height)
        }
        RenderStatus::NotReady => anyhow::bail!("Nothing to render"),
    }

    save_png(tracer.frame(), &args.output)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}

/// Use one image for all six cube faces.
fn load_sky(path: &Path) -> Result<CubeMap> {
    let rgb = image::open(path)
        .with_context(|| format!("Failed to open sky image {}", path.display()))?
        .to_rgb8();
    let face = Texture::from_rgb8(rgb.width(), rgb.height(), rgb.as_raw())?;
    Ok(CubeMap::new(std::array::from_fn(|_| face.clone()))?)
}

/// Write the framebuffer as PNG, flipping so the bottom row lands last.
fn save_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let (width, height) = (frame.width(), frame.height());
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb(frame.pixel(x, height - 1 - y).unwrap_or([0, 0, 0]))
    });
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}
