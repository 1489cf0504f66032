//! Recursive shading kernel.
//!
//! Diffuse surfaces return albedo plus direct light. Mirrors spawn one
//! reflection ray and add direct light on top. Recursion stops at
//! `max_depth`, where the background color is returned.

use crate::hit::Hittable;
use crate::lighting::{push_intersection_point, Lighting};
use crate::Color;
use lumen_core::MaterialKind;
use lumen_math::{reflect, Ray};

/// Default reflection recursion limit.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Default offset of reflection ray origins along the hit normal.
pub const DEFAULT_REFLECTION_BIAS: f32 = 0.01;

/// Traces rays against a world and shades the hits.
pub struct Tracer<'a> {
    world: &'a dyn Hittable,
    lighting: Lighting<'a>,
    background: Color,
    max_depth: u32,
    reflection_bias: f32,
}

impl<'a> Tracer<'a> {
    pub fn new(world: &'a dyn Hittable, lighting: Lighting<'a>, background: Color) -> Self {
        Self {
            world,
            lighting,
            background,
            max_depth: DEFAULT_MAX_DEPTH,
            reflection_bias: DEFAULT_REFLECTION_BIAS,
        }
    }

    /// Set the deepest recursion level that still gets shaded.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_reflection_bias(mut self, bias: f32) -> Self {
        self.reflection_bias = bias;
        self
    }

    /// Color seen along `ray`; `depth` is 0 for camera rays.
    pub fn trace(&self, ray: &Ray, depth: u32) -> Color {
        if depth > self.max_depth {
            return self.background;
        }

        let hit = self.world.nearest_hit(ray);
        if !hit.hit {
            return self.background;
        }

        match hit.material.kind {
            MaterialKind::Diffuse => hit.material.albedo + self.lighting.light(&hit),
            MaterialKind::Reflective => {
                let normal = hit.shading_normal();
                let reflected = Ray::new(
                    push_intersection_point(hit.p, normal, self.reflection_bias),
                    reflect(ray.direction(), normal),
                );
                self.trace(&reflected, depth + 1) + self.lighting.light(&hit)
            }
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
