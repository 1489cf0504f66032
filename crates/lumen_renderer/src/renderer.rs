//! Parallel bucket renderer.
//!
//! Splits the image into buckets, hands each bucket to a fixed-size rayon
//! pool as one job, and returns once every job has drained. A panicking
//! job is contained to its bucket and reported after the drain.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lumen_core::Scene;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use crate::bucket::{generate_buckets, partition_image, render_bucket, BucketOrder, DEFAULT_BUCKET_SIZE};
use crate::bvh::{AabbTree, BvhConfig};
use crate::image::{color_to_rgb, ImageBuffer, Pixel};
use crate::lighting::{LightOptions, Lighting};
use crate::raygen::RayGenerator;
use crate::tracer::{Tracer, DEFAULT_MAX_DEPTH, DEFAULT_REFLECTION_BIAS};

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Maximum reflection depth
    pub max_depth: u32,
    /// Bucket edge in pixels; `None` uses the scene's value, then [`DEFAULT_BUCKET_SIZE`]
    pub bucket_size: Option<u32>,
    pub bucket_order: BucketOrder,
    /// Worker threads; 0 picks one per available core
    pub threads: usize,
    pub reflection_bias: f32,
    pub light: LightOptions,
    pub bvh: BvhConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            bucket_size: None,
            bucket_order: BucketOrder::default(),
            threads: 0,
            reflection_bias: DEFAULT_REFLECTION_BIAS,
            light: LightOptions::default(),
            bvh: BvhConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Bucket size after falling back to the scene and then the default.
    pub fn resolve_bucket_size(&self, scene: &Scene) -> u32 {
        self.bucket_size
            .or(scene.settings.image.bucket_size)
            .unwrap_or(DEFAULT_BUCKET_SIZE)
    }
}

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Bucket size must be positive")]
    InvalidBucketSize,

    #[error("Image is {actual_width}x{actual_height}, expected {width}x{height}")]
    ImageSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("{failed} of {total} buckets failed, first failure in bucket {bucket}")]
    TileFailed {
        bucket: usize,
        failed: usize,
        total: usize,
    },

    #[error("Render cancelled after {completed} of {total} buckets")]
    Cancelled { completed: usize, total: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Shared flag that stops a render before its remaining buckets start.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Render a single pixel to 8-bit RGB.
pub fn render_pixel(raygen: &RayGenerator, tracer: &Tracer, x: u32, y: u32) -> Pixel {
    let ray = raygen.generate(x, y);
    color_to_rgb(tracer.trace(&ray, 0))
}

/// Fills an image bucket by bucket on a dedicated worker pool.
pub struct BucketRenderer<'a> {
    raygen: &'a RayGenerator,
    tracer: &'a Tracer<'a>,
    bucket_size: u32,
    bucket_order: BucketOrder,
    pool: ThreadPool,
    cancel: CancelToken,
}

impl<'a> BucketRenderer<'a> {
    /// Create a renderer; `config.bucket_size` falls back to [`DEFAULT_BUCKET_SIZE`].
    pub fn new(raygen: &'a RayGenerator, tracer: &'a Tracer<'a>, config: &RenderConfig) -> RenderResult<Self> {
        let bucket_size = config.bucket_size.unwrap_or(DEFAULT_BUCKET_SIZE);
        if bucket_size == 0 {
            return Err(RenderError::InvalidBucketSize);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("lumen-worker-{i}"))
            .build()?;

        Ok(Self {
            raygen,
            tracer,
            bucket_size,
            bucket_order: config.bucket_order,
            pool,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Render every bucket into `image` and wait for all of them.
    ///
    /// A failed bucket keeps its previous pixels; the rest of the image is
    /// still written before the error is returned.
    pub fn render(&self, image: &mut ImageBuffer) -> RenderResult<()> {
        let (width, height) = (self.raygen.width(), self.raygen.height());
        if image.width != width || image.height != height {
            return Err(RenderError::ImageSize {
                width,
                height,
                actual_width: image.width,
                actual_height: image.height,
            });
        }

        let buckets = generate_buckets(width, height, self.bucket_size, self.bucket_order);
        let total = buckets.len();
        let tiles = partition_image(image.pixels_mut(), width, self.bucket_size, &buckets);

        log::info!(
            "Rendering {}x{} in {} buckets of {}px on {} threads",
            width,
            height,
            total,
            self.bucket_size,
            self.num_threads()
        );

        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let first_failed = AtomicUsize::new(usize::MAX);

        self.pool.scope_fifo(|scope| {
            for mut tile in tiles {
                let (raygen, tracer, cancel) = (self.raygen, self.tracer, &self.cancel);
                let (completed, failed, first_failed) = (&completed, &failed, &first_failed);

                scope.spawn_fifo(move |_| {
                    if cancel.is_cancelled() {
                        return;
                    }

                    let bucket = tile.bucket;
                    let result = panic::catch_unwind(AssertUnwindSafe(|| render_bucket(&bucket, raygen, tracer)));

                    match result {
                        Ok(pixels) => {
                            tile.write(&pixels);
                            completed.fetch_add(1, Ordering::Relaxed);
                            log::debug!("Bucket {} done at ({}, {})", bucket.index, bucket.x, bucket.y);
                        }
                        Err(payload) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            first_failed.fetch_min(bucket.index, Ordering::Relaxed);
                            log::error!("Bucket {} failed: {}", bucket.index, panic_message(payload.as_ref()));
                        }
                    }
                });
            }
        });

        let failed = failed.into_inner();
        if failed > 0 {
            return Err(RenderError::TileFailed {
                bucket: first_failed.into_inner(),
                failed,
                total,
            });
        }

        let completed = completed.into_inner();
        if completed < total {
            log::warn!("Render cancelled, {} of {} buckets completed", completed, total);
            return Err(RenderError::Cancelled { completed, total });
        }

        log::info!("Rendered {} buckets", total);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Build the acceleration tree for `scene` and render it.
pub fn render_scene(scene: &Scene, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    let image_settings = scene.settings.image;

    let tree = AabbTree::from_scene(scene, config.bvh);
    let lighting = Lighting::new(config.light, scene.lights.clone(), &tree);
    let tracer = Tracer::new(&tree, lighting, scene.settings.background_color)
        .with_max_depth(config.max_depth)
        .with_reflection_bias(config.reflection_bias);
    let raygen = RayGenerator::new(image_settings.width, image_settings.height, scene.camera);

    let config = RenderConfig {
        bucket_size: Some(config.resolve_bucket_size(scene)),
        ..config.clone()
    };

    let mut image = ImageBuffer::new(image_settings.width, image_settings.height);
    BucketRenderer::new(&raygen, &tracer, &config)?.render(&mut image)?;
    Ok(image)
}
