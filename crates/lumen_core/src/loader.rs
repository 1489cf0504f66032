//! `.crtscene` loading.
//!
//! Scene files are JSON documents. They are deserialized into raw file
//! types first, then validated and converted into the [`Scene`] model, so
//! the renderer never sees out-of-range indices or empty images.

use std::path::Path;

use lumen_math::{Mat3, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::mesh::Mesh;
use crate::scene::{Camera, ImageSettings, Light, Material, MaterialKind, Scene, Settings};

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Bucket size must be positive")]
    InvalidBucketSize,

    #[error("Object {object}: vertex array length {len} is not a multiple of 3")]
    MalformedVertices { object: usize, len: usize },

    #[error("Object {object}: triangle array length {len} is not a multiple of 3")]
    MalformedTriangles { object: usize, len: usize },

    #[error("Object {object}: vertex index {index} out of range ({count} vertices)")]
    VertexIndex {
        object: usize,
        index: u32,
        count: usize,
    },

    #[error("Object {object}: material index {index} out of range ({count} materials)")]
    MaterialIndex {
        object: usize,
        index: usize,
        count: usize,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Deserialize)]
struct SceneFile {
    settings: SettingsFile,
    #[serde(default)]
    camera: Option<CameraFile>,
    #[serde(default)]
    lights: Vec<LightFile>,
    #[serde(default)]
    materials: Vec<MaterialFile>,
    #[serde(default)]
    objects: Vec<ObjectFile>,
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    background_color: [f32; 3],
    image_settings: ImageSettingsFile,
}

#[derive(Deserialize)]
struct ImageSettingsFile {
    width: u32,
    height: u32,
    #[serde(default)]
    bucket_size: Option<u32>,
}

#[derive(Deserialize)]
struct CameraFile {
    /// Row-major 3x3 rotation
    matrix: [f32; 9],
    position: [f32; 3],
}

#[derive(Deserialize)]
struct LightFile {
    intensity: f32,
    position: [f32; 3],
}

#[derive(Deserialize)]
struct MaterialFile {
    #[serde(rename = "type")]
    kind: MaterialKind,
    albedo: [f32; 3],
    #[serde(default)]
    smooth_shading: bool,
}

#[derive(Deserialize)]
struct ObjectFile {
    #[serde(default)]
    material_index: usize,
    vertices: Vec<f32>,
    triangles: Vec<u32>,
}

/// Load a `.crtscene` file from disk.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    log::info!("Parsing scene {}", path.display());

    let text = std::fs::read_to_string(path)?;
    load_scene_from_str(&text)
}

/// Parse and validate scene JSON.
pub fn load_scene_from_str(text: &str) -> LoadResult<Scene> {
    let file: SceneFile = serde_json::from_str(text)?;
    let scene = convert(file)?;

    log::info!(
        "Loaded scene: {} objects, {} triangles, {} lights, {}x{}",
        scene.objects.len(),
        scene.triangle_count(),
        scene.lights.len(),
        scene.settings.image.width,
        scene.settings.image.height
    );

    Ok(scene)
}

fn convert(file: SceneFile) -> LoadResult<Scene> {
    let image = &file.settings.image_settings;
    if image.width == 0 || image.height == 0 {
        return Err(LoadError::InvalidImageSize {
            width: image.width,
            height: image.height,
        });
    }
    if image.bucket_size == Some(0) {
        return Err(LoadError::InvalidBucketSize);
    }

    let settings = Settings {
        background_color: Vec3::from_array(file.settings.background_color),
        image: ImageSettings {
            width: image.width,
            height: image.height,
            bucket_size: image.bucket_size,
        },
    };

    let mut scene = Scene::new(settings);

    scene.camera = match file.camera {
        // Rows of the file matrix become the columns of the glam matrix, so
        // `rotation * dir` equals the row-vector product `dir * M`.
        Some(camera) => Camera::new(
            Vec3::from_array(camera.position),
            Mat3::from_cols_array(&camera.matrix),
        ),
        None => {
            log::warn!("Scene has no camera, using identity camera at origin");
            Camera::default()
        }
    };

    for light in &file.lights {
        scene.add_light(Light::new(Vec3::from_array(light.position), light.intensity));
    }

    for material in &file.materials {
        scene.add_material(Material {
            kind: material.kind,
            albedo: Vec3::from_array(material.albedo),
            smooth_shading: material.smooth_shading,
        });
    }
    if scene.materials.is_empty() && !file.objects.is_empty() {
        log::warn!("Scene has no materials, using default diffuse material");
        scene.add_material(Material::default());
    }

    for (object, raw) in file.objects.into_iter().enumerate() {
        let mesh = convert_mesh(object, raw.vertices, raw.triangles)?;

        if raw.material_index >= scene.materials.len() {
            return Err(LoadError::MaterialIndex {
                object,
                index: raw.material_index,
                count: scene.materials.len(),
            });
        }

        scene.add_object(mesh, raw.material_index);
    }

    if scene.lights.is_empty() {
        log::warn!("Scene has no lights");
    }

    Ok(scene)
}

fn convert_mesh(object: usize, vertices: Vec<f32>, triangles: Vec<u32>) -> LoadResult<Mesh> {
    if vertices.len() % 3 != 0 {
        return Err(LoadError::MalformedVertices {
            object,
            len: vertices.len(),
        });
    }
    if triangles.len() % 3 != 0 {
        return Err(LoadError::MalformedTriangles {
            object,
            len: triangles.len(),
        });
    }

    let positions: Vec<Vec3> = vertices
        .chunks_exact(3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    if let Some(&index) = triangles.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(LoadError::VertexIndex {
            object,
            index,
            count: positions.len(),
        });
    }

    Ok(Mesh::new(positions, triangles))
}
