use crate::{Interval, Ray, Vec3};

/// Minimum extent of a padded box along any axis.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-Aligned Bounding Box for the triangle acceleration tree.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
/// `Aabb::EMPTY` is the starting point for accumulation; it never reports a hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a padded AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        Self { x, y, z }.padded()
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow the box to contain `p`. On `Aabb::EMPTY` this initializes it.
    pub fn expand(&mut self, p: Vec3) {
        self.x = self.x.include(p.x);
        self.y = self.y.include(p.y);
        self.z = self.z.include(p.z);
    }

    /// True until the box has been expanded at least once.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
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

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Uses the slab method. A direction component of exactly zero never
    /// divides: the ray either lies inside that slab (no constraint) or misses.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        if self.is_empty() {
            return false;
        }

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = r.origin[axis];
            let dir = r.direction[axis];

            if dir == 0.0 {
                if !slab.contains(origin) {
                    return false;
                }
                continue;
            }

            let adinv = 1.0 / dir;
            let mut t0 = (slab.min - origin) * adinv;
            let mut t1 = (slab.max - origin) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// Inclusive overlap test between two boxes.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }

    /// Split the box at the midpoint of `axis` into a lower and an upper half.
    pub fn split(&self, axis: usize) -> (Aabb, Aabb) {
        let mid = self.axis_interval(axis).midpoint();

        let mut lower = *self;
        lower.axis_interval_mut(axis).max = mid;
        let mut upper = *self;
        upper.axis_interval_mut(axis).min = mid;

        (lower, upper)
    }

    /// Pad intervals to avoid zero-width AABBs (flat geometry).
    pub fn padded(mut self) -> Self {
        if self.is_empty() {
            return self;
        }
        for axis in 0..3 {
            let interval = self.axis_interval_mut(axis);
            if interval.size() < MIN_EXTENT {
                *interval = interval.expand(MIN_EXTENT);
            }
        }
        self
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 10.0));

        assert_eq!(aabb.x.min, 0.0);
        assert_eq!(aabb.x.max, 10.0);
        assert_eq!(aabb.y.max, 10.0);
        assert_eq!(aabb.z.max, 10.0);
    }

    #[test]
    fn test_aabb_expand_from_empty() {
        let mut aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());

        aabb.expand(Vec3::new(1.0, 2.0, 3.0));
        aabb.expand(Vec3::new(-1.0, 0.0, 5.0));

        assert!(!aabb.is_empty());
        assert_eq!(aabb.x, Interval::new(-1.0, 1.0));
        assert_eq!(aabb.y, Interval::new(0.0, 2.0));
        assert_eq!(aabb.z, Interval::new(3.0, 5.0));
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Box beyond the allowed interval
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_aabb_hit_axis_parallel_ray() {
        let aabb = unit_box();

        // Direction has exact zeros on x and y; origin inside those slabs.
        let inside = Ray::new(Vec3::new(0.5, -0.5, -5.0), Vec3::Z);
        assert!(aabb.hit(&inside, Interval::new(0.0, f32::INFINITY)));

        // Origin exactly on a slab plane must not produce NaN.
        let on_plane = Ray::new(Vec3::new(1.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&on_plane, Interval::new(0.0, f32::INFINITY)));

        // Outside the x slab with zero x direction never hits.
        let outside = Ray::new(Vec3::new(2.0, 0.0, -5.0), Vec3::Z);
        assert!(!aabb.hit(&outside, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_empty_aabb_never_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::ONE);
        assert!(!Aabb::EMPTY.hit(&ray, Interval::UNIVERSE));
    }

    #[test]
    fn test_aabb_split() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(4.0, 2.0, 2.0));
        let (lower, upper) = aabb.split(0);

        assert_eq!(lower.x, Interval::new(0.0, 2.0));
        assert_eq!(upper.x, Interval::new(2.0, 4.0));
        assert_eq!(lower.y, aabb.y);
        assert_eq!(upper.z, aabb.z);
    }

    #[test]
    fn test_aabb_overlaps() {
        let a = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let touching = Aabb::from_points(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let apart = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(4.0));

        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
        assert!(!a.overlaps(&Aabb::EMPTY));
    }

    #[test]
    fn test_flat_box_is_padded() {
        let flat = Aabb::from_points(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert!(flat.z.size() > 0.0);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert!(flat.hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }
}
