//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is built once by recursive midpoint splitting: each level halves
//! its box along the next axis (x, y, z, x, ...) and keeps every triangle that
//! overlaps a half. Triangles straddling a split plane live in both halves;
//! the exact triangle test at the leaves sorts out the real hit.
//!
//! Nodes are stored in one flat `Vec` and refer to their children by index.
//! The root is node 0.

use crate::hit::{material_map, resolve_material, Hittable, IntersectionData};
use crate::triangle::{scene_triangles, Triangle};
use lumen_core::{Material, Scene};
use lumen_math::{Aabb, Interval, Ray};

/// Tree build limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvhConfig {
    /// Nodes deeper than this become leaves regardless of triangle count
    pub max_depth: usize,
    /// Nodes holding at most this many triangles become leaves
    pub leaf_size: usize,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            leaf_size: 1,
        }
    }
}

/// Leaf or branch payload of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Triangles overlapping the node box, in input order.
    Leaf(Vec<Triangle>),
    /// Indices of the lower and upper half children.
    Branch([usize; 2]),
}

/// A node of the flat tree.
#[derive(Debug, Clone)]
pub struct BvhNode {
    pub bbox: Aabb,
    pub kind: NodeKind,
}

impl BvhNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// Axis-aligned box tree over the scene triangles.
pub struct AabbTree {
    nodes: Vec<BvhNode>,
    materials: Vec<Material>,
    config: BvhConfig,
}

impl AabbTree {
    /// Build a tree over all triangles of the scene.
    pub fn from_scene(scene: &Scene, config: BvhConfig) -> Self {
        Self::build(scene_triangles(scene), material_map(scene), config)
    }

    /// Build a tree; `materials[i]` is the material of object `i`.
    ///
    /// An empty triangle set yields a single empty leaf that never hits.
    pub fn build(triangles: Vec<Triangle>, materials: Vec<Material>, config: BvhConfig) -> Self {
        log::info!("Building acceleration structure over {} triangles", triangles.len());

        let bounds = triangles.iter().fold(Aabb::EMPTY, |acc, tri| {
            Aabb::surrounding(&acc, &tri.bounding_box())
        });

        let mut tree = Self {
            nodes: Vec::new(),
            materials,
            config,
        };
        tree.build_node(&triangles, bounds, 0, 0);

        log::debug!(
            "Acceleration structure: {} nodes, {} leaves, depth {}",
            tree.node_count(),
            tree.leaf_count(),
            tree.depth()
        );

        tree
    }

    /// Recursively build the subtree for `bbox` and return its node index.
    fn build_node(&mut self, triangles: &[Triangle], bbox: Aabb, axis: usize, depth: usize) -> usize {
        let inside: Vec<Triangle> = triangles
            .iter()
            .filter(|tri| bbox.overlaps(&tri.bounding_box()))
            .copied()
            .collect();

        let index = self.nodes.len();

        if depth > self.config.max_depth || inside.len() <= self.config.leaf_size {
            self.nodes.push(BvhNode {
                bbox,
                kind: NodeKind::Leaf(inside),
            });
            return index;
        }

        // Children are patched in once both halves exist
        self.nodes.push(BvhNode {
            bbox,
            kind: NodeKind::Branch([index, index]),
        });

        let (lower, upper) = bbox.split(axis);
        let next_axis = (axis + 1) % 3;
        let first = self.build_node(&inside, lower, next_axis, depth + 1);
        let second = self.build_node(&inside, upper, next_axis, depth + 1);

        self.nodes[index].kind = NodeKind::Branch([first, second]);
        index
    }

    /// Iterative traversal; `on_update` sees every improvement of the running hit.
    fn traverse<F: FnMut(&IntersectionData)>(&self, ray: &Ray, mut on_update: F) -> IntersectionData {
        let mut closest = IntersectionData::default();
        let mut stack = Vec::with_capacity(self.config.max_depth + 2);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];

            if !node.bbox.hit(ray, Interval::new(0.0, closest.t)) {
                continue;
            }

            match &node.kind {
                NodeKind::Leaf(triangles) => {
                    for tri in triangles {
                        if let Some(hit) = tri.intersect(ray, closest.t) {
                            let material = resolve_material(&self.materials, tri.object_index);
                            closest = closest.closer(hit.with_material(material));
                            on_update(&closest);
                        }
                    }
                }
                // TODO: push the farther child first once nodes store split axes
                NodeKind::Branch([first, second]) => {
                    stack.push(*second);
                    stack.push(*first);
                }
            }
        }

        closest
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Depth of the deepest leaf; a lone root leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let NodeKind::Branch(children) = self.nodes[index].kind {
                stack.extend(children.iter().map(|&c| (c, depth + 1)));
            }
        }
        deepest
    }

    pub fn config(&self) -> BvhConfig {
        self.config
    }
}

impl Hittable for AabbTree {
    fn nearest_hit(&self, ray: &Ray) -> IntersectionData {
        self.traverse(ray, |_| {})
    }
}
