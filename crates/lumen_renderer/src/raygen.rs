//! Camera ray generation.

use lumen_core::Camera;
use lumen_math::{Ray, Vec3};

/// Distance of the image plane along the view direction (looking down -Z).
const IMAGE_PLANE_Z: f32 = -1.0;

/// Maps raster coordinates to primary rays through pixel centers.
///
/// Holds no mutable state, so one generator can serve every worker thread.
#[derive(Debug, Clone, Copy)]
pub struct RayGenerator {
    width: u32,
    height: u32,
    aspect_ratio: f32,
    camera: Camera,
}

impl RayGenerator {
    pub fn new(width: u32, height: u32, camera: Camera) -> Self {
        Self {
            width,
            height,
            aspect_ratio: width as f32 / height.max(1) as f32,
            camera,
        }
    }

    /// Ray through the center of pixel (`col`, `row`); row 0 is the top.
    pub fn generate(&self, col: u32, row: u32) -> Ray {
        // Pixel center, normalized to [0, 1]
        let x = (col as f32 + 0.5) / self.width as f32;
        let y = (row as f32 + 0.5) / self.height as f32;

        // Screen space: bottom left is (-1, -1), top right is (1, 1)
        let x = (2.0 * x - 1.0) * self.aspect_ratio;
        let y = 1.0 - 2.0 * y;

        let direction = self.camera.rotation * Vec3::new(x, y, IMAGE_PLANE_Z);
        Ray::new(self.camera.position, direction)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
