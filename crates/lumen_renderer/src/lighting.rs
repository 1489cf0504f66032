//! Direct illumination from point lights with shadow rays.

use std::f32::consts::PI;

use crate::hit::{Hittable, IntersectionData};
use crate::Color;
use lumen_core::Light;
use lumen_math::{Ray, Vec3};

/// Lighting tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightOptions {
    /// Distance the shadow ray origin is pushed off the surface.
    ///
    /// Large enough to clear self-intersection, small enough that shadows
    /// stay attached to their casters.
    pub shadow_bias: f32,
    /// Global multiplier on light contributions; higher values light the scene more
    pub albedo: f32,
}

impl Default for LightOptions {
    fn default() -> Self {
        Self {
            shadow_bias: 0.001,
            albedo: 0.3,
        }
    }
}

/// Evaluates point lights at surface hits, using `world` for occlusion.
pub struct Lighting<'a> {
    options: LightOptions,
    lights: Vec<Light>,
    world: &'a dyn Hittable,
}

impl<'a> Lighting<'a> {
    pub fn new(options: LightOptions, lights: Vec<Light>, world: &'a dyn Hittable) -> Self {
        Self {
            options,
            lights,
            world,
        }
    }

    /// Sum of unoccluded light contributions at the hit.
    pub fn light(&self, hit: &IntersectionData) -> Color {
        let normal = hit.shading_normal();
        let origin = push_intersection_point(hit.p, normal, self.options.shadow_bias);

        let mut contribution = Color::ZERO;

        for light in &self.lights {
            let to_light = light.position - hit.p;
            let distance = to_light.length();
            if distance <= 0.0 {
                continue;
            }
            let light_dir = to_light / distance;

            let shadow_ray = Ray::new(origin, light_dir);
            if self.world.nearest_hit(&shadow_ray).t < distance {
                continue;
            }

            let amount = light.intensity / sphere_area(distance)
                * self.options.albedo
                * cosine_law(normal, light_dir);
            contribution += Color::splat(amount);
        }

        contribution
    }

    pub fn options(&self) -> LightOptions {
        self.options
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// Lambert's cosine term, clamped at zero for lights behind the surface.
#[inline]
pub fn cosine_law(normal: Vec3, light_dir: Vec3) -> f32 {
    normal.dot(light_dir).max(0.0)
}

/// Area of the sphere over which a point light spreads at `radius`.
#[inline]
pub fn sphere_area(radius: f32) -> f32 {
    4.0 * PI * radius * radius
}

/// Offset `point` along `normal` by `bias`.
#[inline]
pub fn push_intersection_point(point: Vec3, normal: Vec3, bias: f32) -> Vec3 {
    point + normal * bias
}
