//! lumen CLI - render a .crtscene file to an image.

use anyhow::{Context, Result};
use clap::Parser;
use lumen_core::load_scene;
use lumen_renderer::{render_scene, BucketOrder, RenderConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(about = "Bucket-parallel CPU ray tracer for .crtscene files", long_about = None)]
struct Cli {
    /// Scene file to render
    scene: PathBuf,
    /// Output image (format determined by extension: .ppm, .png, .jpg, ...)
    #[arg(default_value = "out.ppm")]
    output: PathBuf,
    /// Worker threads (default: one per core)
    #[arg(short, long)]
    threads: Option<usize>,
    /// Bucket edge in pixels (default: scene value or 20)
    #[arg(short, long)]
    bucket_size: Option<u32>,
    /// Reflection depth limit
    #[arg(short, long)]
    max_depth: Option<u32>,
    /// Render buckets from the image center outward
    #[arg(long)]
    spiral: bool,
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig {
            bucket_size: self.bucket_size,
            ..RenderConfig::default()
        };
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if self.spiral {
            config.bucket_order = BucketOrder::Spiral;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = cli.render_config();

    let start = Instant::now();
    let scene = load_scene(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    log::info!("Scene loaded in {:.2?}", start.elapsed());

    let render_start = Instant::now();
    let image = render_scene(&scene, &config).context("Render failed")?;
    log::info!("Rendered in {:.2?}", render_start.elapsed());

    image
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!("Total time {:.2?}", start.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["lumen", "scene.crtscene"]).unwrap();
        assert_eq!(cli.scene, PathBuf::from("scene.crtscene"));
        assert_eq!(cli.output, PathBuf::from("out.ppm"));
        assert_eq!(cli.render_config(), RenderConfig::default());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "lumen", "--threads", "3", "scene.crtscene", "out.png", "--bucket-size", "16", "--max-depth", "2",
            "--spiral",
        ])
        .unwrap();

        assert_eq!(cli.output, PathBuf::from("out.png"));
        let config = cli.render_config();
        assert_eq!(config.threads, 3);
        assert_eq!(config.bucket_size, Some(16));
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.bucket_order, BucketOrder::Spiral);
    }

    #[test]
    fn test_errors() {
        assert!(Cli::try_parse_from(["lumen"]).is_err());
        assert!(Cli::try_parse_from(["lumen", "a", "b", "c"]).is_err());
        assert!(Cli::try_parse_from(["lumen", "scene", "--threads"]).is_err());
        assert!(Cli::try_parse_from(["lumen", "scene", "--threads", "many"]).is_err());
        assert!(Cli::try_parse_from(["lumen", "scene", "--fast"]).is_err());
    }
}
