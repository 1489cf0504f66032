//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently. Each tile borrows its own rows of the output buffer,
//! so workers never share a pixel.

use crate::image::Pixel;
use crate::raygen::RayGenerator;
use crate::renderer::render_pixel;
use crate::tracer::Tracer;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 20;

/// Order in which buckets are handed to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketOrder {
    /// Left to right, top to bottom.
    #[default]
    RowMajor,
    /// Center of the image first, then outward.
    Spiral,
}

/// Split a `width` x `height` image into square buckets of `bucket_size`.
///
/// Edge buckets are clipped to the image. Indices are assigned after
/// ordering, so `buckets[i].index == i`. A zero `bucket_size` yields no
/// buckets.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32, order: BucketOrder) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    if bucket_size == 0 {
        return buckets;
    }

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
            x += bucket_size;
        }
        y += bucket_size;
    }

    if order == BucketOrder::Spiral {
        sort_spiral(&mut buckets, width, height);
        for (i, bucket) in buckets.iter_mut().enumerate() {
            bucket.index = i;
        }
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |b: &Bucket| {
        let x = b.x as f32 + b.width as f32 / 2.0;
        let y = b.y as f32 + b.height as f32 / 2.0;
        (x - center_x).powi(2) + (y - center_y).powi(2)
    };

    // Stable sort keeps row-major order among equidistant buckets
    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Exclusive view of one bucket's pixels.
pub struct Tile<'a> {
    pub bucket: Bucket,
    rows: Vec<&'a mut [Pixel]>,
}

impl<'a> Tile<'a> {
    /// Pixel at bucket-local (`x`, `y`).
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut Pixel {
        &mut self.rows[y as usize][x as usize]
    }

    pub fn rows(&self) -> &[&'a mut [Pixel]] {
        &self.rows
    }

    /// Copy a bucket-sized, row-major block of pixels into the tile.
    pub fn write(&mut self, pixels: &[Pixel]) {
        let width = self.bucket.width as usize;
        for (row, src) in self.rows.iter_mut().zip(pixels.chunks(width.max(1))) {
            row.copy_from_slice(src);
        }
    }
}

/// Render a single bucket.
///
/// Returns pixels in row-major order within the bucket.
pub fn render_bucket(bucket: &Bucket, raygen: &RayGenerator, tracer: &Tracer) -> Vec<Pixel> {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            pixels.push(render_pixel(raygen, tracer, bucket.x + local_x, bucket.y + local_y));
        }
    }

    pixels
}

/// Carve a row-major pixel buffer into one [`Tile`] per bucket, in bucket order.
///
/// `buckets` must come from [`generate_buckets`] with the same `width` and
/// `bucket_size`; the tiles then cover every pixel exactly once.
pub fn partition_image<'a>(
    pixels: &'a mut [Pixel],
    width: u32,
    bucket_size: u32,
    buckets: &[Bucket],
) -> Vec<Tile<'a>> {
    if width == 0 || bucket_size == 0 {
        return Vec::new();
    }

    let size = bucket_size as usize;
    let columns = (width as usize).div_ceil(size);

    // Row segments grouped by grid cell
    let mut cells: Vec<Vec<&'a mut [Pixel]>> = Vec::new();
    for (y, row) in pixels.chunks_mut(width as usize).enumerate() {
        let grid_row = y / size;
        for (grid_col, segment) in row.chunks_mut(size).enumerate() {
            let cell = grid_row * columns + grid_col;
            if cells.len() <= cell {
                cells.resize_with(cell + 1, Vec::new);
            }
            cells[cell].push(segment);
        }
    }

    buckets
        .iter()
        .map(|bucket| {
            let cell = (bucket.y as usize / size) * columns + bucket.x as usize / size;
            let rows = cells.get_mut(cell).map(std::mem::take).unwrap_or_default();
            Tile {
                bucket: *bucket,
                rows,
            }
        })
        .collect()
}
