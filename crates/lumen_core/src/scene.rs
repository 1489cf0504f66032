//! Scene model for Lumen.
//!
//! A scene is immutable once loaded: the renderer only ever reads it.

use lumen_math::{Mat3, Vec3};
use serde::Deserialize;

use crate::mesh::Mesh;

/// How a surface responds to an incoming ray.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    /// Albedo plus direct lighting, no secondary rays.
    #[default]
    Diffuse,
    /// Perfect mirror plus direct lighting.
    Reflective,
}

/// Surface material referenced by scene objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,

    /// Base color (RGB, 0-1)
    pub albedo: Vec3,

    /// Use interpolated vertex normals instead of the face normal
    pub smooth_shading: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            albedo: Vec3::splat(0.5), // Grey default
            smooth_shading: false,
        }
    }
}

impl Material {
    /// Create a diffuse material with the given albedo.
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            albedo,
            smooth_shading: false,
        }
    }

    /// Create a mirror material with the given albedo.
    pub fn reflective(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Reflective,
            albedo,
            smooth_shading: false,
        }
    }

    /// Enable or disable smooth shading.
    pub fn with_smooth_shading(mut self, smooth: bool) -> Self {
        self.smooth_shading = smooth;
        self
    }
}

/// A point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

/// Pinhole camera: a position and a rotation applied to view-space directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Mat3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3, rotation: Mat3) -> Self {
        Self { position, rotation }
    }
}

/// Output image dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// Preferred tile edge length, if the scene file specifies one
    pub bucket_size: Option<u32>,
}

/// Global scene settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub background_color: Vec3,
    pub image: ImageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: Vec3::ZERO,
            image: ImageSettings {
                width: 640,
                height: 480,
                bucket_size: None,
            },
        }
    }
}

/// A triangle mesh bound to one entry of `Scene::materials`.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub mesh: Mesh,
    pub material_index: usize,
}

impl SceneObject {
    pub fn new(mesh: Mesh, material_index: usize) -> Self {
        Self {
            mesh,
            material_index,
        }
    }
}

/// A complete, validated scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub settings: Settings,
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Create an empty scene with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Add a material to the scene and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add an object using the material at `material_index`.
    pub fn add_object(&mut self, mesh: Mesh, material_index: usize) {
        self.objects.push(SceneObject::new(mesh, material_index));
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Material of the object at `object_index`.
    ///
    /// Falls back to the default material for dangling indices; loaded
    /// scenes never contain any.
    pub fn object_material(&self, object_index: usize) -> Material {
        self.objects
            .get(object_index)
            .and_then(|object| self.materials.get(object.material_index))
            .copied()
            .unwrap_or_default()
    }

    /// Get total triangle count across all objects.
    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.triangle_count()).sum()
    }
}
