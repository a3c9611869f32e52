use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box used by primitives and the KD-tree.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an AABB from three intervals, without padding.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points.
    ///
    /// Flat extents (e.g. an axis-aligned triangle) are padded so the box
    /// always has volume.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow this box to also cover `other`.
    pub fn merge(&mut self, other: &Aabb) {
        *self = Aabb::surrounding(self, other);
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    fn axis_interval_mut(&mut self, n: usize) -> &mut Interval {
        match n {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// True if any axis is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Total surface area; zero for an empty box.
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let (dx, dy, dz) = (self.x.size(), self.y.size(), self.z.size());
        2.0 * (dx * dy + dy * dz + dz * dx)
    }

    /// Point containment, widened by `tolerance` on every side.
    pub fn contains_point(&self, p: Vec3, tolerance: f32) -> bool {
        self.x.expand(2.0 * tolerance).contains(p.x)
            && self.y.expand(2.0 * tolerance).contains(p.y)
            && self.z.expand(2.0 * tolerance).contains(p.z)
    }

    /// Split into the halves below and above the plane `axis = position`.
    pub fn split(&self, axis: usize, position: f32) -> (Aabb, Aabb) {
        let mut below = *self;
        let mut above = *self;
        below.axis_interval_mut(axis).max = position;
        above.axis_interval_mut(axis).min = position;
        (below, above)
    }

    /// Slab test returning the parametric entry/exit range of the ray.
    ///
    /// The entry may be negative when the origin lies inside the box. Rays
    /// whose exit is behind the origin miss.
    pub fn intersect_ray(&self, r: &Ray) -> Option<Interval> {
        let mut ray_t = Interval::UNIVERSE;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let adinv = 1.0 / r.direction[axis];
            let mut t0 = (slab.min - r.origin[axis]) * adinv;
            let mut t1 = (slab.max - r.origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f32::max/min drop the NaN produced by 0 * inf
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return None;
            }
        }

        if ray_t.max < 0.0 {
            return None;
        }
        Some(ray_t)
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        for axis in 0..3 {
            let interval = self.axis_interval_mut(axis);
            if interval.size() < delta {
                *interval = interval.expand(delta);
            }
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RayKind;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let mut merged = Aabb::EMPTY;
        merged.merge(&box1);
        merged.merge(&box2);

        assert_eq!(merged.min(), Vec3::ZERO);
        assert_eq!(merged.max(), Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_area() {
        assert!((unit_box().area() - 24.0).abs() < 1e-5);
        assert_eq!(Aabb::EMPTY.area(), 0.0);
        assert!(Aabb::EMPTY.is_empty());
    }

    #[test]
    fn test_aabb_flat_box_is_padded() {
        let flat = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(flat.z.size() > 0.0);
        assert!(!flat.is_empty());
    }

    #[test]
    fn test_aabb_intersect_ray() {
        let aabb = unit_box();

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, RayKind::Visibility);
        let range = aabb.intersect_ray(&ray).expect("ray aims at the box");
        assert!((range.min - 4.0).abs() < 1e-5);
        assert!((range.max - 6.0).abs() < 1e-5);

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, RayKind::Visibility);
        assert!(aabb.intersect_ray(&ray).is_none());

        // Parallel to a slab, outside it
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z, RayKind::Visibility);
        assert!(aabb.intersect_ray(&ray).is_none());

        // Origin inside: entry is behind the origin
        let ray = Ray::new(Vec3::ZERO, Vec3::X, RayKind::Visibility);
        let range = aabb.intersect_ray(&ray).unwrap();
        assert!(range.min < 0.0 && (range.max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_aabb_split_and_contains() {
        let (below, above) = unit_box().split(1, 0.25);
        assert_eq!(below.y.max, 0.25);
        assert_eq!(above.y.min, 0.25);

        let p = Vec3::new(0.0, 0.5, 0.0);
        assert!(above.contains_point(p, 0.0));
        assert!(!below.contains_point(p, 0.0));
        assert!(below.contains_point(Vec3::new(0.0, 0.2500001, 0.0), 1e-4));
    }
}
