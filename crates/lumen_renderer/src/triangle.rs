//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::hit::IntersectionData;
use lumen_core::Scene;
use lumen_math::{Aabb, Ray, Vec3};

/// Hits closer than this to the ray origin are ignored.
const T_MIN: f32 = 1e-5;

/// A mesh vertex with its smooth normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// A triangle copied out of a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vertex,
    pub b: Vertex,
    pub c: Vertex,
    /// Unit face normal, zero for degenerate triangles
    normal: Vec3,
    /// Index of the owning scene object, used to resolve the material
    pub object_index: usize,
    bbox: Aabb,
}

impl Triangle {
    /// Create a triangle; the face normal follows the `a -> b -> c` winding.
    pub fn new(a: Vertex, b: Vertex, c: Vertex, object_index: usize) -> Self {
        let normal = (b.position - a.position)
            .cross(c.position - a.position)
            .normalize_or_zero();

        let min = a.position.min(b.position).min(c.position);
        let max = a.position.max(b.position).max(c.position);

        Self {
            a,
            b,
            c,
            normal,
            object_index,
            bbox: Aabb::from_points(min, max),
        }
    }

    /// Create a flat-shaded triangle whose vertex normals equal the face normal.
    pub fn flat(p0: Vec3, p1: Vec3, p2: Vec3, object_index: usize) -> Self {
        let n = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        Self::new(
            Vertex::new(p0, n),
            Vertex::new(p1, n),
            Vertex::new(p2, n),
            object_index,
        )
    }

    /// Unit face normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Padded bounding box of the three vertices.
    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Twice the signed area is the face normal length; this is the area.
    pub fn area(&self) -> f32 {
        (self.b.position - self.a.position)
            .cross(self.c.position - self.a.position)
            .length()
            / 2.0
    }

    /// Intersect the ray, accepting only hits with `T_MIN < t < t_max`.
    ///
    /// The returned data carries the default material; the caller resolves
    /// it from `object_index`. Parallel rays and degenerate triangles miss.
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<IntersectionData> {
        if self.normal == Vec3::ZERO {
            return None;
        }

        let edge1 = self.b.position - self.a.position;
        let edge2 = self.c.position - self.a.position;

        let h = ray.direction().cross(edge2);
        let det = edge1.dot(h);

        // Ray is parallel to triangle; the tolerance scales with the triangle size
        if det.abs() <= f32::EPSILON * edge1.length() * edge2.length() {
            return None;
        }

        let f = 1.0 / det;
        let s = ray.origin() - self.a.position;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !(t > T_MIN && t < t_max) {
            return None;
        }

        let w = 1.0 - u - v;
        let smooth = (self.a.normal * w + self.b.normal * u + self.c.normal * v)
            .try_normalize()
            .unwrap_or(self.normal);

        let mut hit = IntersectionData {
            t,
            p: ray.at(t),
            barycentric: Vec3::new(w, u, v),
            object_index: self.object_index,
            hit: true,
            ..Default::default()
        };
        hit.set_face_normals(ray, self.normal, smooth);

        Some(hit)
    }
}

/// Copy every triangle out of the scene, tagged with its object index.
///
/// Objects whose material enables `smooth_shading` keep the mesh's averaged
/// vertex normals; all others get the face normal at every vertex.
pub fn scene_triangles(scene: &Scene) -> Vec<Triangle> {
    let mut triangles = Vec::with_capacity(scene.triangle_count());

    for (object_index, object) in scene.objects.iter().enumerate() {
        let mesh = &object.mesh;
        let smooth = scene.object_material(object_index).smooth_shading;

        for [i0, i1, i2] in mesh.faces() {
            let triangle = if smooth {
                let vertex = |i: usize| Vertex::new(mesh.positions[i], mesh.normals[i]);
                Triangle::new(vertex(i0), vertex(i1), vertex(i2), object_index)
            } else {
                Triangle::flat(mesh.positions[i0], mesh.positions[i1], mesh.positions[i2], object_index)
            };
            triangles.push(triangle);
        }
    }

    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle() -> Triangle {
        // Triangle in XY plane at z=-1, facing +Z
        Triangle::flat(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
            0,
        )
    }

    #[test]
    fn test_face_normal_is_unit_and_follows_winding() {
        let tri = xy_triangle();
        assert!((tri.normal() - Vec3::Z).length() < 1e-6);
        assert!((tri.area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let hit = tri.intersect(&ray, f32::INFINITY).unwrap();
        assert!(hit.hit);
        assert!((hit.t - 1.0).abs() < 0.001);
        assert!((hit.p - Vec3::new(0.0, 0.0, -1.0)).length() < 0.001);
        assert!(hit.front_face);
        assert!((hit.barycentric.x + hit.barycentric.y + hit.barycentric.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.intersect(&ray, f32::INFINITY).is_none());

        // Outside the edges
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray, f32::INFINITY).is_none());
    }

    #[test]
    fn test_hit_beyond_t_max_is_rejected() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(tri.intersect(&ray, 0.5).is_none());
        assert!(tri.intersect(&ray, 1.0).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        assert!(tri.intersect(&ray, f32::INFINITY).is_none());
    }

    #[test]
    fn test_tiny_triangle_is_hit() {
        let size = 1e-5;
        let tri = Triangle::flat(
            Vec3::new(-size, -size, -1.0),
            Vec3::new(size, -size, -1.0),
            Vec3::new(0.0, size, -1.0),
            0,
        );
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let hit = tri.intersect(&ray, f32::INFINITY).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-4);
        assert!((hit.face_normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_scene_triangles_follow_smooth_shading() {
        use lumen_core::{Material, Mesh};

        // Two faces folded along the x axis, so averaged normals differ from face normals
        let mesh = || {
            Mesh::new(
                vec![
                    Vec3::new(-1.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(0.0, 1.0, 1.0),
                    Vec3::new(0.0, -1.0, 1.0),
                ],
                vec![0, 1, 2, 1, 0, 3],
            )
        };

        let mut scene = Scene::default();
        scene.add_material(Material::default());
        scene.add_material(Material::default().with_smooth_shading(true));
        scene.add_object(mesh(), 0);
        scene.add_object(mesh(), 1);

        let triangles = scene_triangles(&scene);
        assert_eq!(triangles.len(), 4);

        let flat = triangles[0];
        assert_eq!(flat.a.normal, flat.normal());
        assert_eq!(flat.c.normal, flat.normal());

        let smooth = triangles[2];
        assert_eq!(smooth.object_index, 1);
        assert!((smooth.a.normal - smooth.normal()).length() > 0.1);
        assert_eq!(smooth.a.normal, scene.objects[1].mesh.normals[0]);
    }

    #[test]
    fn test_degenerate_triangle_misses() {
        let tri = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, 0);
        assert_eq!(tri.normal(), Vec3::ZERO);

        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), -Vec3::Z);
        assert!(tri.intersect(&ray, f32::INFINITY).is_none());
    }

    #[test]
    fn test_back_face_normal_faces_ray() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let hit = tri.intersect(&ray, f32::INFINITY).unwrap();
        assert!(!hit.front_face);
        assert!((hit.normal - (-Vec3::Z)).length() < 1e-6);
        assert!((hit.face_normal - (-Vec3::Z)).length() < 1e-6);
    }

    #[test]
    fn test_smooth_normal_is_interpolated() {
        let tri = Triangle::new(
            Vertex::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(-1.0, 0.0, 1.0).normalize()),
            Vertex::new(Vec3::new(1.0, -1.0, -1.0), Vec3::new(1.0, 0.0, 1.0).normalize()),
            Vertex::new(Vec3::new(0.0, 1.0, -1.0), Vec3::Z),
            0,
        );
        let ray = Ray::new(Vec3::new(0.5, -0.5, 0.0), -Vec3::Z);

        let hit = tri.intersect(&ray, f32::INFINITY).unwrap();
        assert!(hit.normal.x > 0.0);
        assert!((hit.normal.length() - 1.0).abs() < 1e-5);
        assert!((hit.face_normal - Vec3::Z).length() < 1e-6);
    }
}
