//! KD-tree acceleration structure.
//!
//! The tree partitions space with axis-aligned planes chosen by a cost
//! heuristic. It only knows primitive bounding boxes; the caller supplies the
//! actual intersection routine at traversal time, so the same tree type
//! serves the scene (over objects) and meshes (over faces).
//!
//! Primitives straddling a split plane are stored in both children. Each leaf
//! remembers its cell bounds and only accepts hits inside that cell, which
//! keeps a straddling primitive from being reported by a leaf the hit point is
//! not in.

use glint_core::Intersection;
use glint_math::{Aabb, Ray, RAY_EPSILON};
use serde::{Deserialize, Serialize};

use crate::error::KdTreeError;

/// How split planes are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitHeuristic {
    /// Surface-area heuristic over all primitive box edges.
    SurfaceArea,
    /// Median box edge, balancing primitive counts.
    Median,
}

/// Build parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdTreeSettings {
    /// Maximum number of split levels
    pub max_depth: u32,
    /// Nodes with this many primitives or fewer become leaves
    pub min_objects: usize,
    /// Fixed cost of visiting an interior node
    pub traversal_cost: f32,
    /// Cost of one primitive test
    pub intersection_cost: f32,
    pub heuristic: SplitHeuristic,
}

impl Default for KdTreeSettings {
    fn default() -> Self {
        Self {
            max_depth: 15,
            min_objects: 3,
            traversal_cost: 80.0,
            intersection_cost: 1.0,
            heuristic: SplitHeuristic::SurfaceArea,
        }
    }
}

/// Tree node - either a split with two children or a leaf with primitives.
#[derive(Debug)]
enum KdNode {
    Split {
        axis: usize,
        position: f32,
        below: Box<KdNode>,
        above: Box<KdNode>,
    },
    Leaf {
        primitives: Vec<usize>,
        cell: Aabb,
    },
}

/// Shape of a built tree, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdTreeStats {
    pub interior_nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    /// Primitive references over all leaves, duplicates included
    pub references: usize,
}

/// A KD-tree over primitive indices.
#[derive(Debug)]
pub struct KdTree {
    root: Option<Box<KdNode>>,
    bounds: Aabb,
    settings: KdTreeSettings,
}

impl Default for KdTree {
    fn default() -> Self {
        Self::new(KdTreeSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    Start,
    End,
}

struct Split {
    axis: usize,
    position: f32,
    cost: f32,
}

struct Frame<'t> {
    node: &'t KdNode,
    t_min: f32,
    t_max: f32,
}

impl KdTree {
    pub fn new(settings: KdTreeSettings) -> Self {
        Self {
            root: None,
            bounds: Aabb::EMPTY,
            settings,
        }
    }

    pub fn settings(&self) -> &KdTreeSettings {
        &self.settings
    }

    /// Replace the build parameters used by the next `build`.
    pub fn set_settings(&mut self, settings: KdTreeSettings) {
        self.settings = settings;
    }

    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    /// Bounds of everything in the tree.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Tear the tree down so it can be rebuilt.
    pub fn clear(&mut self) {
        self.root = None;
        self.bounds = Aabb::EMPTY;
    }

    /// Build over primitives given by their bounding boxes; primitive `i`
    /// is `boxes[i]`.
    ///
    /// Refuses to run while a tree exists.
    pub fn build(&mut self, boxes: &[Aabb]) -> Result<(), KdTreeError> {
        if self.root.is_some() {
            return Err(KdTreeError::AlreadyBuilt);
        }
        if let Some(index) = boxes.iter().position(Aabb::is_empty) {
            return Err(KdTreeError::EmptyBoundingBox(index));
        }

        let bounds = boxes
            .iter()
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, b));
        let builder = Builder {
            boxes,
            settings: &self.settings,
        };
        let root = builder.build_node((0..boxes.len()).collect(), bounds, self.settings.max_depth);

        self.root = Some(Box::new(root));
        self.bounds = bounds;

        let stats = self.stats();
        log::debug!(
            "KD-tree over {} primitives: {} interior, {} leaves, depth {}, {} references",
            boxes.len(),
            stats.interior_nodes,
            stats.leaves,
            stats.max_depth,
            stats.references
        );
        Ok(())
    }

    pub fn stats(&self) -> KdTreeStats {
        fn walk(node: &KdNode, depth: usize, stats: &mut KdTreeStats) {
            stats.max_depth = stats.max_depth.max(depth);
            match node {
                KdNode::Split { below, above, .. } => {
                    stats.interior_nodes += 1;
                    walk(below, depth + 1, stats);
                    walk(above, depth + 1, stats);
                }
                KdNode::Leaf { primitives, .. } => {
                    stats.leaves += 1;
                    stats.references += primitives.len();
                }
            }
        }

        let mut stats = KdTreeStats::default();
        if let Some(root) = &self.root {
            walk(root, 0, &mut stats);
        }
        stats
    }

    /// Closest hit along `ray`.
    ///
    /// `hit_primitive(i)` intersects primitive `i`. Cells are visited front
    /// to back; traversal stops once the best hit is nearer than every
    /// unexplored cell.
    pub fn intersect<'a, F>(&self, ray: &Ray, mut hit_primitive: F) -> Option<Intersection<'a>>
    where
        F: FnMut(usize) -> Option<Intersection<'a>>,
    {
        let root = self.root.as_deref()?;
        let range = self.bounds.intersect_ray(ray)?;

        let mut stack = vec![Frame {
            node: root,
            t_min: range.min.max(0.0),
            t_max: range.max,
        }];
        let mut best: Option<Intersection<'a>> = None;

        while let Some(Frame {
            mut node,
            t_min,
            mut t_max,
        }) = stack.pop()
        {
            if best.as_ref().is_some_and(|hit| hit.t < t_min) {
                break;
            }

            loop {
                match node {
                    KdNode::Split {
                        axis,
                        position,
                        below,
                        above,
                    } => {
                        let origin = ray.origin[*axis];
                        let dir = ray.direction[*axis];
                        let t_plane = (position - origin) / dir;

                        // Near child is the side holding the origin
                        let below_first = origin < *position || (origin == *position && dir <= 0.0);
                        let (near, far) = if below_first {
                            (below.as_ref(), above.as_ref())
                        } else {
                            (above.as_ref(), below.as_ref())
                        };

                        if t_plane.is_nan() {
                            // The ray runs inside the plane; either side may hold hits
                            stack.push(Frame { node: far, t_min, t_max });
                            node = near;
                        } else if t_plane > t_max || t_plane <= 0.0 {
                            node = near;
                        } else if t_plane < t_min {
                            node = far;
                        } else {
                            stack.push(Frame {
                                node: far,
                                t_min: t_plane,
                                t_max,
                            });
                            node = near;
                            t_max = t_plane;
                        }
                    }
                    KdNode::Leaf { primitives, cell } => {
                        for &index in primitives {
                            let Some(hit) = hit_primitive(index) else {
                                continue;
                            };
                            let closer = best.as_ref().map_or(true, |b| hit.t < b.t);
                            if closer && cell.contains_point(ray.at(hit.t), RAY_EPSILON) {
                                best = Some(hit);
                            }
                        }
                        break;
                    }
                }
            }
        }

        best
    }
}

struct Builder<'b> {
    boxes: &'b [Aabb],
    settings: &'b KdTreeSettings,
}

impl Builder<'_> {
    fn build_node(&self, primitives: Vec<usize>, cell: Aabb, depth: u32) -> KdNode {
        if primitives.len() <= self.settings.min_objects || depth == 0 {
            return KdNode::Leaf { primitives, cell };
        }
        let Some(split) = self.choose_split(&primitives, &cell) else {
            return KdNode::Leaf { primitives, cell };
        };

        let mut below = Vec::with_capacity(primitives.len());
        let mut above = Vec::with_capacity(primitives.len());
        for &index in &primitives {
            let extent = self.boxes[index].axis_interval(split.axis);
            if split.position >= extent.max {
                below.push(index);
            } else if split.position <= extent.min {
                above.push(index);
            } else {
                below.push(index);
                above.push(index);
            }
        }

        // Every primitive straddles the plane: splitting gains nothing
        if below.len() == primitives.len() && above.len() == primitives.len() {
            return KdNode::Leaf { primitives, cell };
        }

        let (below_cell, above_cell) = cell.split(split.axis, split.position);
        KdNode::Split {
            axis: split.axis,
            position: split.position,
            below: Box::new(self.build_node(below, below_cell, depth - 1)),
            above: Box::new(self.build_node(above, above_cell, depth - 1)),
        }
    }

    /// Cheapest split over x, y, z; ties keep the earlier axis.
    fn choose_split(&self, primitives: &[usize], cell: &Aabb) -> Option<Split> {
        let mut best: Option<Split> = None;
        for axis in 0..3 {
            let candidate = match self.settings.heuristic {
                SplitHeuristic::SurfaceArea => self.surface_area_split(primitives, cell, axis),
                SplitHeuristic::Median => self.median_split(primitives, cell, axis),
            };
            if let Some(candidate) = candidate {
                if best.as_ref().map_or(true, |b| candidate.cost < b.cost) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Sweep all box edges along `axis`, pricing each plane strictly inside
    /// the cell with the surface-area heuristic.
    fn surface_area_split(&self, primitives: &[usize], cell: &Aabb, axis: usize) -> Option<Split> {
        let cell_area = cell.area();
        if cell_area <= 0.0 {
            return None;
        }
        let extent = cell.axis_interval(axis);

        let mut edges: Vec<(f32, EdgeKind)> = primitives
            .iter()
            .flat_map(|&index| {
                let b = self.boxes[index].axis_interval(axis);
                [(b.min, EdgeKind::Start), (b.max, EdgeKind::End)]
            })
            .collect();
        edges.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut n_below = 0usize;
        let mut n_above = primitives.len();
        let mut best: Option<Split> = None;

        for &(position, kind) in &edges {
            if kind == EdgeKind::End {
                n_above -= 1;
            }
            if extent.surrounds(position) {
                let (below, above) = cell.split(axis, position);
                let p_below = below.area() / cell_area;
                let p_above = above.area() / cell_area;
                let cost = self.settings.traversal_cost
                    + self.settings.intersection_cost
                        * (p_below * n_below as f32 + p_above * n_above as f32);
                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(Split {
                        axis,
                        position,
                        cost,
                    });
                }
            }
            if kind == EdgeKind::Start {
                n_below += 1;
            }
        }

        best
    }

    /// Split at the median box edge; cost is the larger side's share of the
    /// primitives, so balanced splits win.
    fn median_split(&self, primitives: &[usize], cell: &Aabb, axis: usize) -> Option<Split> {
        let mut edges: Vec<f32> = primitives
            .iter()
            .flat_map(|&index| {
                let b = self.boxes[index].axis_interval(axis);
                [b.min, b.max]
            })
            .collect();
        edges.sort_by(f32::total_cmp);

        let position = *edges.get(edges.len() / 2)?;
        if !cell.axis_interval(axis).surrounds(position) {
            return None;
        }

        let (mut n_below, mut n_above) = (0usize, 0usize);
        for &index in primitives {
            let b = self.boxes[index].axis_interval(axis);
            if position >= b.max {
                n_below += 1;
            } else if position <= b.min {
                n_above += 1;
            } else {
                n_below += 1;
                n_above += 1;
            }
        }

        let cost = n_below.max(n_above) as f32 / (n_below + n_above) as f32;
        Some(Split {
            axis,
            position,
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Material;
    use glint_math::{RayKind, Vec3};

    /// Unit cubes along X at x = 0, 2, 4, ...
    fn row_of_boxes(n: usize) -> Vec<Aabb> {
        (0..n)
            .map(|i| {
                let x = 2.0 * i as f32;
                Aabb::from_points(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
            })
            .collect()
    }

    /// Hit the front face (z = 0) of box `i` if the ray crosses it.
    fn box_front_hit<'a>(boxes: &[Aabb], ray: &Ray, i: usize, material: &'a Material) -> Option<Intersection<'a>> {
        let range = boxes[i].intersect_ray(ray)?;
        (range.min > RAY_EPSILON).then(|| Intersection::new(range.min, Vec3::NEG_Z, material).on_object(i))
    }

    #[test]
    fn test_build_refuses_rebuild() {
        let boxes = row_of_boxes(8);
        let mut tree = KdTree::default();
        assert!(!tree.is_built());

        tree.build(&boxes).unwrap();
        assert!(tree.is_built());
        assert_eq!(tree.build(&boxes), Err(KdTreeError::AlreadyBuilt));

        tree.clear();
        assert!(tree.build(&boxes).is_ok());
    }

    #[test]
    fn test_build_rejects_empty_box() {
        let mut boxes = row_of_boxes(3);
        boxes.push(Aabb::EMPTY);
        let mut tree = KdTree::default();
        assert_eq!(tree.build(&boxes), Err(KdTreeError::EmptyBoundingBox(3)));
        assert!(!tree.is_built());
    }

    #[test]
    fn test_small_sets_stay_in_one_leaf() {
        let mut tree = KdTree::default();
        tree.build(&row_of_boxes(3)).unwrap();
        let stats = tree.stats();
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.references, 3);
    }

    #[test]
    fn test_disjoint_boxes_split_without_duplication() {
        for heuristic in [SplitHeuristic::SurfaceArea, SplitHeuristic::Median] {
            let mut tree = KdTree::new(KdTreeSettings {
                heuristic,
                traversal_cost: 1.0,
                ..Default::default()
            });
            tree.build(&row_of_boxes(16)).unwrap();
            let stats = tree.stats();
            assert!(stats.interior_nodes > 0, "{heuristic:?} never split");
            assert_eq!(stats.references, 16, "{heuristic:?} duplicated disjoint boxes");
        }
    }

    #[test]
    fn test_depth_budget_respected() {
        let mut tree = KdTree::new(KdTreeSettings {
            max_depth: 2,
            min_objects: 1,
            ..Default::default()
        });
        tree.build(&row_of_boxes(32)).unwrap();
        assert!(tree.stats().max_depth <= 2);
    }

    #[test]
    fn test_identical_boxes_make_a_leaf() {
        let boxes = vec![Aabb::from_points(Vec3::ZERO, Vec3::ONE); 10];
        let mut tree = KdTree::default();
        tree.build(&boxes).unwrap();
        assert_eq!(tree.stats().leaves, 1);
    }

    #[test]
    fn test_traversal_finds_nearest_box() {
        let boxes = row_of_boxes(16);
        let material = Material::default();
        let mut tree = KdTree::default();
        tree.build(&boxes).unwrap();

        // Looking down +X from the left: box 0 is first
        let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X, RayKind::Visibility);
        let hit = tree
            .intersect(&ray, |i| {
                let range = boxes[i].intersect_ray(&ray)?;
                Some(Intersection::new(range.min, Vec3::NEG_X, &material).on_object(i))
            })
            .expect("ray runs through every box");
        assert_eq!(hit.object, 0);
        assert!((hit.t - 5.0).abs() < 1e-3);

        // Looking down -X from the right: the last box is first
        let ray = Ray::new(Vec3::new(40.0, 0.5, 0.5), Vec3::NEG_X, RayKind::Visibility);
        let hit = tree
            .intersect(&ray, |i| {
                let range = boxes[i].intersect_ray(&ray)?;
                Some(Intersection::new(range.min, Vec3::X, &material).on_object(i))
            })
            .unwrap();
        assert_eq!(hit.object, 15);
    }

    #[test]
    fn test_traversal_matches_linear_scan() {
        let boxes = row_of_boxes(12);
        let material = Material::default();
        let mut tree = KdTree::default();
        tree.build(&boxes).unwrap();

        for i in 0..48 {
            let x = -1.0 + i as f32 * 0.5;
            let ray = Ray::normalized(Vec3::new(x, 0.5, -3.0), Vec3::new(0.05, 0.0, 1.0), RayKind::Visibility);
            let linear = (0..boxes.len())
                .filter_map(|j| box_front_hit(&boxes, &ray, j, &material))
                .min_by(|a, b| a.t.total_cmp(&b.t));
            let accelerated = tree.intersect(&ray, |j| box_front_hit(&boxes, &ray, j, &material));

            match (linear, accelerated) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    assert_eq!(a.object, b.object, "ray from x={x}");
                    assert!((a.t - b.t).abs() < 1e-4);
                }
                (a, b) => panic!("ray from x={x}: linear {:?} vs tree {:?}", a.map(|h| h.t), b.map(|h| h.t)),
            }
        }
    }

    #[test]
    fn test_ray_missing_root_box() {
        let boxes = row_of_boxes(8);
        let mut tree = KdTree::default();
        tree.build(&boxes).unwrap();

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y, RayKind::Visibility);
        let mut calls = 0;
        let hit = tree.intersect(&ray, |_| {
            calls += 1;
            None::<Intersection<'_>>
        });
        assert!(hit.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_unbuilt_tree_misses() {
        let tree = KdTree::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::X, RayKind::Visibility);
        assert!(tree.intersect(&ray, |_| None::<Intersection<'_>>).is_none());
    }

    #[test]
    fn test_ray_inside_split_plane_sees_both_sides() {
        // Boxes 1 and 2 start exactly at x = 0, where the tree splits
        let boxes = vec![
            Aabb::from_points(Vec3::new(-3.0, 0.0, 0.0), Vec3::new(-2.9, 1.0, 1.0)),
            Aabb::from_points(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
            Aabb::from_points(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.5, 1.0, 1.0)),
        ];
        let mut tree = KdTree::new(KdTreeSettings {
            min_objects: 1,
            ..Default::default()
        });
        tree.build(&boxes).unwrap();
        assert!(tree.stats().interior_nodes > 0);

        let material = Material::default();
        let ray = Ray::new(Vec3::new(0.0, 0.5, -5.0), Vec3::Z, RayKind::Visibility);
        let hit = tree
            .intersect(&ray, |i| box_front_hit(&boxes, &ray, i, &material))
            .expect("ray grazes boxes 1 and 2");
        assert!((hit.t - 5.0).abs() < 1e-5);
        assert!(hit.object == 1 || hit.object == 2);
    }
}
