//! Lumen renderer: triangle ray tracing over a bounding volume hierarchy.
//!
//! Camera rays are traced through an [`AabbTree`], shaded with direct
//! point-light illumination and mirror reflections, and written to an
//! [`ImageBuffer`] by a bucket-parallel scheduler.

mod bucket;
mod bvh;
mod hit;
mod image;
mod lighting;
mod raygen;
mod renderer;
mod tracer;
mod triangle;

pub use bucket::{
    generate_buckets, partition_image, render_bucket, Bucket, BucketOrder, Tile, DEFAULT_BUCKET_SIZE,
};
pub use bvh::{AabbTree, BvhConfig, BvhNode, NodeKind};
pub use hit::{material_map, Hittable, IntersectionData, TriangleList};
pub use crate::image::{clamp_01, color_to_rgb, ImageBuffer, ImageError, Pixel};
pub use lighting::{cosine_law, push_intersection_point, sphere_area, LightOptions, Lighting};
pub use raygen::RayGenerator;
pub use renderer::{
    render_pixel, render_scene, BucketRenderer, CancelToken, RenderConfig, RenderError, RenderResult,
};
pub use tracer::{Tracer, DEFAULT_MAX_DEPTH, DEFAULT_REFLECTION_BIAS};
pub use triangle::{scene_triangles, Triangle, Vertex};

/// Linear RGB color.
pub type Color = Vec3;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Interval, Ray, Vec3};
