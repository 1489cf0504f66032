//! Lumen Core - scene model and `.crtscene` loading.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `SceneObject`, `Material`, `Light`, `Camera`, `Mesh`
//! - **Scene loading**: JSON `.crtscene` parsing with validation
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("scene.crtscene")?;
//! println!("Loaded {} objects, {} triangles",
//!     scene.objects.len(),
//!     scene.triangle_count());
//! ```

pub mod loader;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use loader::{load_scene, load_scene_from_str, LoadError, LoadResult};
pub use mesh::Mesh;
pub use scene::{
    Camera, ImageSettings, Light, Material, MaterialKind, Scene, SceneObject, Settings,
};
