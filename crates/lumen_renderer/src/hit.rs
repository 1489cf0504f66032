//! Nearest-hit queries: the `Hittable` trait and `IntersectionData`.

use crate::triangle::Triangle;
use lumen_core::{Material, Scene};
use lumen_math::{Ray, Vec3};

/// Result of a nearest-hit query.
///
/// `t == f32::INFINITY` (and `hit == false`) means nothing was hit. Every
/// query builds its own value; nothing is shared between rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionData {
    /// Distance along the ray
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Interpolated vertex normal, oriented against the ray
    pub normal: Vec3,
    /// Face normal, oriented against the ray
    pub face_normal: Vec3,
    /// Barycentric weights of vertices a, b, c
    pub barycentric: Vec3,
    /// Material of the owning object
    pub material: Material,
    pub object_index: usize,
    /// Whether the ray hit the side the winding faces
    pub front_face: bool,
    pub hit: bool,
}

impl Default for IntersectionData {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            face_normal: Vec3::ZERO,
            barycentric: Vec3::ZERO,
            material: Material::default(),
            object_index: 0,
            front_face: false,
            hit: false,
        }
    }
}

impl IntersectionData {
    /// Orient both normals against the ray and record which face was hit.
    pub fn set_face_normals(&mut self, ray: &Ray, outward_face: Vec3, outward_smooth: Vec3) {
        self.front_face = ray.direction().dot(outward_face) < 0.0;

        if self.front_face {
            self.face_normal = outward_face;
            self.normal = outward_smooth;
        } else {
            self.face_normal = -outward_face;
            self.normal = -outward_smooth;
        }
    }

    /// Attach the resolved material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Normal used for lighting and reflection: the interpolated vertex normal.
    ///
    /// Flat-shaded objects carry the face normal at every vertex, so for them
    /// this equals `face_normal`.
    pub fn shading_normal(&self) -> Vec3 {
        self.normal
    }

    /// Keep whichever of two candidate hits is closer.
    pub fn closer(self, other: IntersectionData) -> IntersectionData {
        if other.t < self.t {
            other
        } else {
            self
        }
    }
}

/// Anything that answers nearest-hit queries.
pub trait Hittable: Send + Sync {
    /// Closest hit along the ray, or a no-hit value with `t == f32::INFINITY`.
    fn nearest_hit(&self, ray: &Ray) -> IntersectionData;
}

/// Brute-force triangle list.
///
/// Tests every triangle for every ray. Used as a reference to check the
/// acceleration tree against; renders go through `AabbTree`.
pub struct TriangleList {
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
}

impl TriangleList {
    /// Create a list; `materials[i]` is the material of object `i`.
    pub fn new(triangles: Vec<Triangle>, materials: Vec<Material>) -> Self {
        Self {
            triangles,
            materials,
        }
    }
}

impl Hittable for TriangleList {
    fn nearest_hit(&self, ray: &Ray) -> IntersectionData {
        let mut closest = IntersectionData::default();

        for tri in &self.triangles {
            if let Some(hit) = tri.intersect(ray, closest.t) {
                closest = hit.with_material(resolve_material(&self.materials, tri.object_index));
            }
        }

        closest
    }
}

/// Object index -> material, in object order.
pub fn material_map(scene: &Scene) -> Vec<Material> {
    (0..scene.objects.len())
        .map(|i| scene.object_material(i))
        .collect()
}

pub(crate) fn resolve_material(materials: &[Material], object_index: usize) -> Material {
    materials.get(object_index).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::MaterialKind;

    #[test]
    fn test_default_is_no_hit() {
        let data = IntersectionData::default();
        assert!(!data.hit);
        assert_eq!(data.t, f32::INFINITY);
    }

    #[test]
    fn test_closer_keeps_nearest() {
        let near = IntersectionData {
            t: 1.0,
            hit: true,
            ..Default::default()
        };
        let far = IntersectionData {
            t: 4.0,
            hit: true,
            ..Default::default()
        };

        assert_eq!(near.closer(far).t, 1.0);
        assert_eq!(far.closer(near).t, 1.0);
        assert_eq!(IntersectionData::default().closer(far).t, 4.0);
    }

    #[test]
    fn test_shading_normal_is_interpolated() {
        let data = IntersectionData {
            normal: Vec3::X,
            face_normal: Vec3::Y,
            ..Default::default()
        };
        assert_eq!(data.shading_normal(), Vec3::X);

        let mirrored = data.with_material(Material::reflective(Vec3::ONE));
        assert_eq!(mirrored.shading_normal(), Vec3::X);
    }

    #[test]
    fn test_triangle_list_nearest_and_material() {
        let near = Triangle::flat(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            1,
        );
        let far = Triangle::flat(
            Vec3::new(-1.0, -1.0, -3.0),
            Vec3::new(1.0, -1.0, -3.0),
            Vec3::new(0.0, 1.0, -3.0),
            0,
        );
        let materials = vec![
            Material::diffuse(Vec3::X),
            Material::reflective(Vec3::ONE),
        ];
        // Far triangle first, so the near one must replace it
        let list = TriangleList::new(vec![far, near], materials);

        let hit = list.nearest_hit(&Ray::new(Vec3::ZERO, -Vec3::Z));
        assert!(hit.hit);
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert_eq!(hit.object_index, 1);
        assert_eq!(hit.material.kind, MaterialKind::Reflective);

        let miss = list.nearest_hit(&Ray::new(Vec3::ZERO, Vec3::Z));
        assert!(!miss.hit);
        assert_eq!(miss.t, f32::INFINITY);
    }
}
